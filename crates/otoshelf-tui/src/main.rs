//! Terminal UI for the otoshelf music memory journal.

use anyhow::Context;
use clap::Parser;
use crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use log::{debug, info};
use otoshelf_config::{LayeredConfig, LayeredConfigOptions};
use otoshelf_core::store::JsonShelfStore;
use otoshelf_genai::GeminiProvider;
use otoshelf_tui::app::{App, InterviewStep, View};
use otoshelf_tui::client::ShelfClient;
use otoshelf_tui::event::AppEvent;
use otoshelf_tui::ui;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Command-line options for the TUI.
#[derive(Parser)]
#[command(name = "otoshelf", version)]
struct Cli {
    /// Optional path to an otoshelf.json5 config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the shelf document location
    #[arg(long)]
    shelf_path: Option<PathBuf>,
    /// Model name used for both chat and summarization
    #[arg(long)]
    model: Option<String>,
}

/// Entry point for the otoshelf TUI.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();

    let cli = Cli::parse();
    info!(
        "starting TUI (config_set={}, model_set={})",
        cli.config.is_some(),
        cli.model.is_some()
    );

    let options = LayeredConfigOptions {
        config_path: cli.config.clone(),
        read_environment: true,
        ..LayeredConfigOptions::default()
    };
    let layered = LayeredConfig::load(&options).context("failed to load config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    let mut config = layered.config;
    if let Some(model) = cli.model {
        config.chat_model = model.clone();
        config.summary_model = model;
    }

    // A missing credential is fatal at startup.
    let api_key = config
        .require_api_key()
        .context("GEMINI_API_KEY is required to run the TUI")?
        .to_string();
    let provider = Arc::new(GeminiProvider::new(api_key).with_base_url(config.base_url.clone()));

    let shelf_path = match cli.shelf_path {
        Some(path) => path,
        None => config
            .resolve_shelf_path()
            .context("failed to resolve shelf path")?,
    };
    info!("using shelf document at {}", shelf_path.display());
    let store = Arc::new(JsonShelfStore::new(&shelf_path).context("failed to open shelf store")?);

    let client = ShelfClient::spawn(provider, config, store);

    let mut terminal = setup_terminal()?;
    let (tx, mut rx) = mpsc::channel(256);
    spawn_input_handler(tx.clone());
    spawn_tick(tx.clone());
    spawn_controller_events(&client, tx.clone());

    let mut app = App::new();
    if let Err(err) = client.refresh_shelf().await {
        app.push_status(format!("failed to load shelf: {err}"));
    }

    loop {
        terminal.draw(|frame| ui::draw(frame, &mut app))?;

        let Some(event) = rx.recv().await else { break };
        if handle_app_event(event, &client, &mut app).await? {
            break;
        }
    }

    restore_terminal(&mut terminal)?;
    Ok(())
}

/// Dispatch a UI event and return true when the app should exit.
async fn handle_app_event(
    event: AppEvent,
    client: &ShelfClient,
    app: &mut App,
) -> anyhow::Result<bool> {
    match event {
        AppEvent::Input(key) => handle_input(key, client, app).await,
        AppEvent::Controller(event) => {
            app.apply_event(event);
            Ok(false)
        }
        AppEvent::Tick => Ok(false),
    }
}

/// Handle keyboard input and dispatch actions.
async fn handle_input(key: KeyEvent, client: &ShelfClient, app: &mut App) -> anyhow::Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Ok(true);
    }

    match app.view {
        View::Bookshelf => handle_bookshelf_input(key, app),
        View::Detail => handle_detail_input(key, client, app).await,
        View::Interview => handle_interview_input(key, client, app).await,
    }
}

/// Keyboard handling for the shelf view.
fn handle_bookshelf_input(key: KeyEvent, app: &mut App) -> anyhow::Result<bool> {
    if app.searching {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => app.searching = false,
            KeyCode::Backspace => {
                app.search.pop();
                app.selected = 0;
            }
            KeyCode::Char(ch) => {
                app.search.push(ch);
                app.selected = 0;
            }
            _ => {}
        }
        return Ok(false);
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
        KeyCode::Char('a') => app.open_interview(),
        KeyCode::Char('/') => app.searching = true,
        KeyCode::Char('o') => app.cycle_order(),
        KeyCode::Up => app.move_selection(-1),
        KeyCode::Down => app.move_selection(1),
        KeyCode::Enter => {
            let selected = app.selected_record().map(|record| record.id);
            if let Some(id) = selected {
                app.detail_id = Some(id);
                app.view = View::Detail;
                app.push_status("");
            }
        }
        _ => {}
    }
    Ok(false)
}

/// Keyboard handling for the detail view, including delete confirmation.
async fn handle_detail_input(
    key: KeyEvent,
    client: &ShelfClient,
    app: &mut App,
) -> anyhow::Result<bool> {
    if let Some(id) = app.pending_delete {
        if key.code == KeyCode::Char('y') {
            client.delete_record(id).await?;
            app.detail_id = None;
            app.view = View::Bookshelf;
        }
        app.pending_delete = None;
        return Ok(false);
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            app.detail_id = None;
            app.view = View::Bookshelf;
        }
        KeyCode::Char('d') => app.pending_delete = app.detail_id,
        _ => {}
    }
    Ok(false)
}

/// Keyboard handling for the interview flow.
async fn handle_interview_input(
    key: KeyEvent,
    client: &ShelfClient,
    app: &mut App,
) -> anyhow::Result<bool> {
    match app.interview_step {
        InterviewStep::Details => match key.code {
            KeyCode::Esc => client.cancel_interview().await?,
            KeyCode::Tab => app.details_field = app.details_field.next(),
            KeyCode::Backspace => {
                app.active_details_field().pop();
            }
            KeyCode::Enter => client.begin_interview(app.details.clone()).await?,
            KeyCode::Char(ch) => app.active_details_field().push(ch),
            _ => {}
        },
        InterviewStep::Chat => match key.code {
            KeyCode::Esc => client.cancel_interview().await?,
            KeyCode::Enter => {
                if app.assistant_busy {
                    return Ok(false);
                }
                let input = std::mem::take(&mut app.input);
                if input.trim() == "/done" {
                    client.request_summary().await?;
                } else if !input.trim().is_empty() {
                    client.send_message(input).await?;
                }
            }
            KeyCode::Backspace => {
                app.input.pop();
            }
            KeyCode::Char(ch) if !app.assistant_busy => app.input.push(ch),
            _ => {}
        },
        InterviewStep::Summarizing => {}
        InterviewStep::Summary => match key.code {
            KeyCode::Esc => client.cancel_interview().await?,
            KeyCode::Enter => {
                client.set_summary(app.summary.clone()).await?;
                client.save_record().await?;
            }
            KeyCode::Backspace => {
                app.summary.pop();
            }
            KeyCode::Char(ch) => app.summary.push(ch),
            _ => {}
        },
    }
    Ok(false)
}

/// Spawn a task forwarding controller events into the app channel.
fn spawn_controller_events(client: &ShelfClient, sender: mpsc::Sender<AppEvent>) {
    let mut receiver = client.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let _ = sender.send(AppEvent::Controller(event)).await;
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("controller event stream lagged (skipped={})", skipped);
                    continue;
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Spawn a task to poll for input events.
fn spawn_input_handler(sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = crossterm::event::poll(Duration::from_millis(30)) {
                while let Ok(true) = crossterm::event::poll(Duration::from_millis(0)) {
                    let event = match crossterm::event::read() {
                        Ok(event) => event,
                        Err(_) => break,
                    };
                    if let CrosstermEvent::Key(key) = event {
                        let _ = sender.send(AppEvent::Input(key)).await;
                    }
                }
            }
        }
    });
}

/// Spawn a periodic tick event generator.
fn spawn_tick(sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(250));
        loop {
            interval.tick().await;
            let _ = sender.send(AppEvent::Tick).await;
        }
    });
}

/// Configure terminal in raw mode with alternate screen.
fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    debug!("setting up terminal");
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal state on exit.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    debug!("restoring terminal");
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
