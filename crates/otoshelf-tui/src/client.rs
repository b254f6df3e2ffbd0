//! Local client wrapping the embedded shelf controller task.

use crate::event::ControllerEvent;
use crate::event_bus::EventBus;
use anyhow::Result;
use log::{debug, info, warn};
use otoshelf_config::ShelfConfig;
use otoshelf_core::types::{ChatMessage, SongDetails};
use otoshelf_core::{Bookshelf, InterviewError, InterviewFlow, ShelfStore};
use otoshelf_genai::GenerativeProvider;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

/// Localized status line shown after a successful save.
const STATUS_SAVED: &str = "本棚に保存しました。";
/// Localized status line shown after a delete.
const STATUS_DELETED: &str = "思い出を削除しました。";
/// Localized status line for missing song details.
const STATUS_MISSING_DETAILS: &str = "曲名とアーティスト名を入力してください。";
/// Localized status line while a reply is still streaming.
const STATUS_BUSY: &str = "前の返信が終わるまでお待ちください。";
/// Localized status line when summarizing too early.
const STATUS_NEED_EXCHANGE: &str = "要約の前に、少なくとも一度は会話してください。";
/// Localized status line for out-of-step actions.
const STATUS_WRONG_STEP: &str = "この操作は今は行えません。";

/// Commands accepted by the shelf controller task.
#[derive(Debug)]
enum ShelfCommand {
    BeginInterview(SongDetails),
    SendMessage(String),
    RequestSummary,
    SetSummary(String),
    SaveRecord,
    CancelInterview,
    DeleteRecord(Uuid),
    RefreshShelf,
}

impl ShelfCommand {
    /// Command name for logging, without payload content.
    fn name(&self) -> &'static str {
        match self {
            ShelfCommand::BeginInterview(_) => "begin_interview",
            ShelfCommand::SendMessage(_) => "send_message",
            ShelfCommand::RequestSummary => "request_summary",
            ShelfCommand::SetSummary(_) => "set_summary",
            ShelfCommand::SaveRecord => "save_record",
            ShelfCommand::CancelInterview => "cancel_interview",
            ShelfCommand::DeleteRecord(_) => "delete_record",
            ShelfCommand::RefreshShelf => "refresh_shelf",
        }
    }
}

/// Client handle for the embedded controller: commands in, events out.
#[derive(Clone)]
pub struct ShelfClient {
    commands: mpsc::Sender<ShelfCommand>,
    events: EventBus,
}

impl ShelfClient {
    /// Spawn the controller task and return a client for it.
    pub fn spawn(
        provider: Arc<dyn GenerativeProvider>,
        config: ShelfConfig,
        store: Arc<dyn ShelfStore>,
    ) -> Self {
        let events = EventBus::new(512);
        let (commands, receiver) = mpsc::channel(256);
        let controller = ShelfController {
            provider,
            config,
            bookshelf: Bookshelf::load(store),
            flow: None,
            events: events.clone(),
        };
        tokio::spawn(controller.run(receiver));
        Self { commands, events }
    }

    /// Subscribe to controller events.
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// Start the interview once song details are entered.
    pub async fn begin_interview(&self, details: SongDetails) -> Result<()> {
        self.send(ShelfCommand::BeginInterview(details)).await
    }

    /// Send a user chat message.
    pub async fn send_message(&self, text: String) -> Result<()> {
        if text.trim().is_empty() {
            anyhow::bail!("message cannot be empty");
        }
        self.send(ShelfCommand::SendMessage(text)).await
    }

    /// Ask for the summary and tags.
    pub async fn request_summary(&self) -> Result<()> {
        self.send(ShelfCommand::RequestSummary).await
    }

    /// Replace the narrative with the user's edited text.
    pub async fn set_summary(&self, text: String) -> Result<()> {
        self.send(ShelfCommand::SetSummary(text)).await
    }

    /// Save the finished record to the shelf.
    pub async fn save_record(&self) -> Result<()> {
        self.send(ShelfCommand::SaveRecord).await
    }

    /// Discard the in-progress interview.
    pub async fn cancel_interview(&self) -> Result<()> {
        self.send(ShelfCommand::CancelInterview).await
    }

    /// Delete a record from the shelf.
    pub async fn delete_record(&self, id: Uuid) -> Result<()> {
        self.send(ShelfCommand::DeleteRecord(id)).await
    }

    /// Re-emit the current shelf contents.
    pub async fn refresh_shelf(&self) -> Result<()> {
        self.send(ShelfCommand::RefreshShelf).await
    }

    async fn send(&self, command: ShelfCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow::anyhow!("shelf controller stopped"))
    }
}

/// Owner of the bookshelf and the in-progress interview flow.
///
/// Runs on its own task; commands arrive over the channel and are processed
/// one at a time, so at most one exchange is ever in flight.
struct ShelfController {
    provider: Arc<dyn GenerativeProvider>,
    config: ShelfConfig,
    bookshelf: Bookshelf,
    flow: Option<InterviewFlow>,
    events: EventBus,
}

impl ShelfController {
    async fn run(mut self, mut receiver: mpsc::Receiver<ShelfCommand>) {
        info!(
            "shelf controller started ({} records)",
            self.bookshelf.len()
        );
        self.emit_shelf();
        while let Some(command) = receiver.recv().await {
            debug!("controller command: {}", command.name());
            self.handle(command).await;
        }
        info!("shelf controller stopped");
    }

    async fn handle(&mut self, command: ShelfCommand) {
        match command {
            ShelfCommand::BeginInterview(details) => self.begin_interview(details).await,
            ShelfCommand::SendMessage(text) => self.send_message(&text).await,
            ShelfCommand::RequestSummary => self.request_summary().await,
            ShelfCommand::SetSummary(text) => {
                if let Some(flow) = self.flow.as_mut()
                    && let Err(err) = flow.set_summary(text)
                {
                    self.emit_flow_error(err);
                }
            }
            ShelfCommand::SaveRecord => self.save_record(),
            ShelfCommand::CancelInterview => {
                self.flow = None;
                self.events.emit(ControllerEvent::InterviewClosed);
            }
            ShelfCommand::DeleteRecord(id) => {
                self.bookshelf.delete(id);
                self.events
                    .emit(ControllerEvent::Status(STATUS_DELETED.to_string()));
                self.emit_shelf();
            }
            ShelfCommand::RefreshShelf => self.emit_shelf(),
        }
    }

    async fn begin_interview(&mut self, details: SongDetails) {
        let mut flow = match self.flow.take() {
            Some(flow) => flow,
            None => InterviewFlow::new(self.provider.clone(), &self.config),
        };
        match flow.begin_interview(details) {
            Ok(stream) => {
                self.events.emit(ControllerEvent::InterviewStarted);
                self.flow = Some(flow);
                self.drive_stream(stream).await;
            }
            Err(err) => {
                self.flow = Some(flow);
                self.emit_flow_error(err);
            }
        }
    }

    async fn send_message(&mut self, text: &str) {
        let Some(flow) = self.flow.as_mut() else {
            warn!("send without an active interview ignored");
            return;
        };
        match flow.begin_exchange(text) {
            Ok(stream) => self.drive_stream(stream).await,
            Err(err) => self.emit_flow_error(err),
        }
    }

    /// Consume a reply stream, broadcasting transcript snapshots as the
    /// placeholder message grows.
    async fn drive_stream(&mut self, stream: otoshelf_genai::ReplyStream) {
        let Some(flow) = self.flow.as_mut() else {
            return;
        };
        let mut snapshot = flow.transcript().to_vec();
        self.events.emit(ControllerEvent::TranscriptUpdated {
            transcript: snapshot.clone(),
            busy: true,
        });

        let events = self.events.clone();
        flow.stream_reply(stream, |accumulated| {
            if let Some(last) = snapshot.last_mut() {
                *last = ChatMessage::assistant(accumulated);
            }
            events.emit(ControllerEvent::TranscriptUpdated {
                transcript: snapshot.clone(),
                busy: true,
            });
        })
        .await;

        self.events.emit(ControllerEvent::TranscriptUpdated {
            transcript: flow.transcript().to_vec(),
            busy: false,
        });
    }

    async fn request_summary(&mut self) {
        let Some(flow) = self.flow.as_mut() else {
            return;
        };
        if !flow.can_request_summary() {
            let err = if flow.transcript().len() < 2 {
                InterviewError::NotEnoughExchanges
            } else {
                InterviewError::ExchangeInFlight
            };
            self.emit_flow_error(err);
            return;
        }

        self.events.emit(ControllerEvent::Summarizing);
        match flow.request_summary().await {
            Ok(()) => self.events.emit(ControllerEvent::SummaryReady {
                summary: flow.summary().to_string(),
                tags: flow.tags().to_vec(),
            }),
            Err(err) => self.emit_flow_error(err),
        }
    }

    fn save_record(&mut self) {
        let Some(flow) = self.flow.as_ref() else {
            return;
        };
        match flow.finish() {
            Ok(draft) => {
                let id = self.bookshelf.upsert(draft);
                self.flow = None;
                self.events.emit(ControllerEvent::RecordSaved { id });
                self.events
                    .emit(ControllerEvent::Status(STATUS_SAVED.to_string()));
                self.emit_shelf();
                self.events.emit(ControllerEvent::InterviewClosed);
            }
            Err(err) => self.emit_flow_error(err),
        }
    }

    fn emit_shelf(&self) {
        self.events.emit(ControllerEvent::ShelfUpdated {
            records: self.bookshelf.records().to_vec(),
        });
    }

    /// Map a flow error to its pre-written localized status sentence.
    fn emit_flow_error(&self, err: InterviewError) {
        warn!("interview action rejected: {err}");
        let status = match err {
            InterviewError::MissingDetails => STATUS_MISSING_DETAILS,
            InterviewError::ExchangeInFlight => STATUS_BUSY,
            InterviewError::NotEnoughExchanges => STATUS_NEED_EXCHANGE,
            InterviewError::WrongStep(_) => STATUS_WRONG_STEP,
        };
        self.events
            .emit(ControllerEvent::Status(status.to_string()));
    }
}
