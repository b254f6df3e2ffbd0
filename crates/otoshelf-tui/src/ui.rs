//! Rendering routines for the otoshelf TUI.

use crate::app::{App, DetailsField, InterviewStep, View};
use otoshelf_core::links;
use otoshelf_core::shelf::ShelfOrder;
use otoshelf_core::types::Role;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};

// ── Theme colors ──────────────────────────────────────────────────────

const PRIMARY: Color = Color::Rgb(139, 92, 246); // #8B5CF6
const SECONDARY: Color = Color::Rgb(124, 58, 237); // #7C3AED
const TEXT: Color = Color::Rgb(238, 238, 238); // #eeeeee
const TEXT_MUTED: Color = Color::Rgb(128, 128, 128); // #808080
const BORDER: Color = Color::Rgb(60, 60, 60); // #3c3c3c
const ACCENT: Color = Color::Rgb(229, 192, 123); // #e5c07b

const HEADER_HEIGHT: u16 = 4;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Draw the entire TUI frame.
pub fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let area = frame.area();
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT), // header bar
            Constraint::Min(0),                // view content
            Constraint::Length(1),             // status bar
        ])
        .split(area);

    draw_header(frame, app, root[0]);
    match app.view {
        View::Bookshelf => draw_bookshelf(frame, app, root[1]),
        View::Detail => draw_detail(frame, app, root[1]),
        View::Interview => draw_interview(frame, app, root[1]),
    }
    draw_status_bar(frame, app, root[2]);
}

/// Draw the title header with record count on the right.
fn draw_header(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let title_style = Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(vec![
            Span::styled("メモリーミュージックシェルフ", title_style),
            Span::styled(format!("  v{VERSION}"), Style::default().fg(TEXT_MUTED)),
        ]),
        Line::from(Span::styled(
            format!("{} 冊の思い出", app.records.len()),
            Style::default().fg(TEXT_MUTED),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Label for the current shelf ordering.
fn order_label(order: ShelfOrder) -> &'static str {
    match order {
        ShelfOrder::CreatedAt => "追加日順",
        ShelfOrder::Title => "曲名順",
        ShelfOrder::Artist => "アーティスト順",
    }
}

/// Draw the bookshelf list with the search and sort line above it.
fn draw_bookshelf(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let search_style = if app.searching {
        Style::default().fg(SECONDARY)
    } else {
        Style::default().fg(BORDER)
    };
    let search = Paragraph::new(Line::from(vec![
        Span::styled("検索: ", Style::default().fg(TEXT_MUTED)),
        Span::styled(app.search.as_str(), Style::default().fg(TEXT)),
        Span::styled(
            format!("    並び順: {}", order_label(app.order)),
            Style::default().fg(TEXT_MUTED),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(search_style),
    );
    frame.render_widget(search, rows[0]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(" 本棚 ", Style::default().fg(TEXT)));
    let inner = block.inner(rows[1]);
    frame.render_widget(block, rows[1]);

    let visible = app.visible_records();
    if visible.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "まだ思い出がありません。'a' で追加できます。",
            Style::default().fg(TEXT_MUTED),
        )))
        .wrap(Wrap { trim: true });
        frame.render_widget(empty, inner);
        return;
    }

    let mut lines: Vec<Line<'_>> = Vec::new();
    for (index, record) in visible.iter().enumerate() {
        let selected = index == app.selected;
        let spine = if selected { "▌ " } else { "  " };
        let title_style = if selected {
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(TEXT)
        };
        let mut spans = vec![
            Span::styled(spine, Style::default().fg(SECONDARY)),
            Span::styled(record.title.clone(), title_style),
            Span::styled(
                format!(" — {}", record.artist),
                Style::default().fg(TEXT_MUTED),
            ),
        ];
        if !record.tags.is_empty() {
            spans.push(Span::styled(
                format!("  [{}]", record.tags.join(", ")),
                Style::default().fg(ACCENT),
            ));
        }
        lines.push(Line::from(spans));
    }
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Draw the detail view for the selected record.
fn draw_detail(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(record) = app.detail_record() else {
        return;
    };

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(34), Constraint::Percentage(66)])
        .split(area);

    let info_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(" 曲情報 ", Style::default().fg(TEXT)));
    let info_inner = info_block.inner(cols[0]);
    frame.render_widget(info_block, cols[0]);

    let mut info_lines = vec![
        Line::from(Span::styled(
            record.title.clone(),
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            record.artist.clone(),
            Style::default().fg(TEXT),
        )),
    ];
    if !record.release_year.is_empty() {
        info_lines.push(Line::from(Span::styled(
            record.release_year.clone(),
            Style::default().fg(TEXT_MUTED),
        )));
    }
    info_lines.push(Line::from(""));
    info_lines.push(Line::from(Span::styled(
        format!("追加日: {}", record.created_at.format("%Y-%m-%d")),
        Style::default().fg(TEXT_MUTED),
    )));
    info_lines.push(Line::from(""));
    info_lines.push(Line::from(Span::styled(
        "カバーアート:",
        Style::default().fg(TEXT_MUTED),
    )));
    info_lines.push(Line::from(Span::styled(
        record.cover_art_url.clone(),
        Style::default().fg(SECONDARY),
    )));
    info_lines.push(Line::from(""));
    info_lines.push(Line::from(Span::styled(
        "YouTubeで聴く:",
        Style::default().fg(TEXT_MUTED),
    )));
    info_lines.push(Line::from(Span::styled(
        links::listen_search_url(&record.title, &record.artist),
        Style::default().fg(SECONDARY),
    )));
    frame.render_widget(
        Paragraph::new(info_lines).wrap(Wrap { trim: false }),
        info_inner,
    );

    let memory_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(" 私の思い出 ", Style::default().fg(TEXT)));
    let memory_inner = memory_block.inner(cols[1]);
    frame.render_widget(memory_block, cols[1]);

    let mut memory_lines = vec![Line::from(Span::styled(
        record.summary.clone(),
        Style::default().fg(TEXT),
    ))];
    memory_lines.push(Line::from(""));
    if !record.tags.is_empty() {
        memory_lines.push(Line::from(Span::styled(
            format!("タグ: {}", record.tags.join(", ")),
            Style::default().fg(ACCENT),
        )));
        memory_lines.push(Line::from(""));
    }
    memory_lines.push(Line::from(Span::styled(
        "── インタビュー全文 ──",
        Style::default().fg(TEXT_MUTED),
    )));
    for message in &record.chat_history {
        memory_lines.push(transcript_line(message.role, &message.text));
    }
    if app.pending_delete.is_some() {
        memory_lines.push(Line::from(""));
        memory_lines.push(Line::from(Span::styled(
            "この思い出を本当に削除しますか？ y で削除、他のキーで取り消し。",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )));
    }
    frame.render_widget(
        Paragraph::new(memory_lines).wrap(Wrap { trim: false }),
        memory_inner,
    );
}

/// Draw the interview flow for its current step.
fn draw_interview(frame: &mut Frame<'_>, app: &App, area: Rect) {
    match app.interview_step {
        InterviewStep::Details => draw_details_form(frame, app, area),
        InterviewStep::Chat => draw_chat(frame, app, area),
        InterviewStep::Summarizing => draw_summarizing(frame, area),
        InterviewStep::Summary => draw_summary(frame, app, area),
    }
}

/// Draw the song details form.
fn draw_details_form(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(
            " 新しい思い出を追加 ",
            Style::default().fg(TEXT),
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let field_line = |label: &str, value: &str, active: bool| {
        let marker = if active { "▌ " } else { "  " };
        let value_style = if active {
            Style::default().fg(TEXT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(TEXT)
        };
        Line::from(vec![
            Span::styled(marker.to_string(), Style::default().fg(SECONDARY)),
            Span::styled(format!("{label}: "), Style::default().fg(TEXT_MUTED)),
            Span::styled(value.to_string(), value_style),
        ])
    };

    let lines = vec![
        Line::from(Span::styled(
            "まず、曲の詳細情報を入力しましょう。",
            Style::default().fg(TEXT_MUTED),
        )),
        Line::from(""),
        field_line(
            "曲名",
            &app.details.title,
            app.details_field == DetailsField::Title,
        ),
        field_line(
            "アーティスト",
            &app.details.artist,
            app.details_field == DetailsField::Artist,
        ),
        field_line(
            "リリース年（任意）",
            &app.details.release_year,
            app.details_field == DetailsField::ReleaseYear,
        ),
        Line::from(""),
        Line::from(Span::styled(
            "Tab: 次の項目  Enter: インタビューを開始  Esc: 取り消し",
            Style::default().fg(TEXT_MUTED),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

/// One rendered transcript line.
fn transcript_line(role: Role, text: &str) -> Line<'static> {
    let (label, style) = match role {
        Role::User => ("あなた", Style::default().fg(SECONDARY)),
        Role::Assistant => ("オト", Style::default().fg(PRIMARY)),
    };
    let shown = if text.is_empty() { "..." } else { text };
    Line::from(vec![
        Span::styled(format!("{label}: "), style.add_modifier(Modifier::BOLD)),
        Span::styled(shown.to_string(), Style::default().fg(TEXT)),
    ])
}

/// Draw the chat step: transcript pane plus input box.
fn draw_chat(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(" AIインタビュー ", Style::default().fg(TEXT)));
    let inner = block.inner(rows[0]);
    frame.render_widget(block, rows[0]);

    let mut lines: Vec<Line<'_>> = app
        .transcript
        .iter()
        .map(|message| transcript_line(message.role, &message.text))
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter: 送信  /done + Enter: 完了して要約  Esc: 取り消し",
        Style::default().fg(TEXT_MUTED),
    )));
    // Keep the newest lines in view on small terminals.
    let height = inner.height as usize;
    let skip = lines.len().saturating_sub(height);
    let visible: Vec<Line<'_>> = lines.into_iter().skip(skip).collect();
    frame.render_widget(Paragraph::new(visible).wrap(Wrap { trim: false }), inner);

    let input_style = if app.assistant_busy {
        Style::default().fg(BORDER)
    } else {
        Style::default().fg(SECONDARY)
    };
    let placeholder = if app.assistant_busy {
        "オトが入力中です..."
    } else {
        "あなたの想いを入力してください..."
    };
    let shown = if app.input.is_empty() {
        Span::styled(placeholder, Style::default().fg(TEXT_MUTED))
    } else {
        Span::styled(app.input.as_str(), Style::default().fg(TEXT))
    };
    let input = Paragraph::new(Line::from(shown)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(input_style),
    );
    frame.render_widget(input, rows[1]);
}

/// Draw the summarizing wait screen.
fn draw_summarizing(frame: &mut Frame<'_>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "AIがあなたの物語を作成中です...",
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Draw the summary review step.
fn draw_summary(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(" 思い出の要約 ", Style::default().fg(TEXT)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![Line::from(Span::styled(
        app.summary.clone(),
        Style::default().fg(TEXT),
    ))];
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("タグ: {}", app.tags.join(", ")),
        Style::default().fg(ACCENT),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "文字入力で要約を編集  Enter: 本棚に保存  Esc: 取り消し",
        Style::default().fg(TEXT_MUTED),
    )));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

/// Draw the one-line status bar.
fn draw_status_bar(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let hint = match app.view {
        View::Bookshelf => "a: 追加  Enter: 開く  /: 検索  o: 並び順  q: 終了",
        View::Detail => "d: 削除  Esc: 戻る",
        View::Interview => "",
    };
    let line = Line::from(vec![
        Span::styled(app.status.clone(), Style::default().fg(ACCENT)),
        Span::styled(
            if app.status.is_empty() {
                hint.to_string()
            } else {
                format!("  │  {hint}")
            },
            Style::default().fg(TEXT_MUTED),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
