//! Local event bus for embedding the shelf controller in the TUI.

use crate::event::ControllerEvent;
use log::debug;
use tokio::sync::broadcast;

/// Broadcast-backed event bus for the embedded controller.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<ControllerEvent>,
}

impl EventBus {
    /// Create a new event bus with the given channel buffer size.
    pub fn new(buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer);
        debug!("tui event bus initialized (buffer={})", buffer);
        Self { sender }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.sender.subscribe()
    }

    /// Emit an event into the broadcast channel.
    pub fn emit(&self, event: ControllerEvent) {
        let _ = self.sender.send(event);
    }
}
