use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Coarse document lifecycle events for the web layer (cache invalidation,
/// live listings). Distinct from user notifications: these carry no
/// recipient.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    Created { id: Uuid },
    Updated { id: Uuid },
    Deleted { id: Uuid },
    Shared { id: Uuid, user_key: String },
    Unshared { id: Uuid, user_key: String },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(100);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub fn send(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
