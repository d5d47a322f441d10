//! Best-effort notification of users whose access changed.
//!
//! Delivery is at-most-once with no retry. A transport failure is logged and
//! swallowed at this boundary; the access change it describes has already
//! landed and must not be rolled back for a side channel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

use crate::access::{AccessLevel, Actor};
use crate::error::TransportError;

/// A granted-access event addressed to the affected user. Transient: exists
/// only for the duration of one delivery attempt.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub recipient: String,
    pub document_id: Uuid,
    pub granted_level: Option<AccessLevel>,
    pub granted_by: Actor,
}

#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn send(&self, event: Notification) -> Result<(), TransportError>;
}

/// Single-attempt wrapper around a transport. Never surfaces failure to the
/// caller.
#[derive(Clone)]
pub struct ChangeNotifier {
    transport: Arc<dyn NotificationTransport>,
}

impl ChangeNotifier {
    pub fn new(transport: Arc<dyn NotificationTransport>) -> Self {
        Self { transport }
    }

    pub async fn notify(&self, event: Notification) {
        let recipient = event.recipient.clone();
        let document_id = event.document_id;
        if let Err(err) = self.transport.send(event).await {
            warn!(%document_id, recipient, "dropping access notification: {err}");
        }
    }
}

/// In-process transport over a broadcast channel; subscribers on the web
/// layer pick events up and fan them out. Send "fails" only when nobody is
/// listening, which for a fire-and-forget channel counts as delivered.
#[derive(Clone)]
pub struct BroadcastTransport {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastTransport {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(100);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationTransport for BroadcastTransport {
    async fn send(&self, event: Notification) -> Result<(), TransportError> {
        let _ = self.tx.send(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The web layer forwards these verbatim, so the JSON shape is part of
    // the contract.
    #[test]
    fn notification_wire_shape() {
        let note = Notification {
            recipient: "bob@y.com".to_string(),
            document_id: Uuid::nil(),
            granted_level: Some(AccessLevel::Viewer),
            granted_by: Actor {
                id: "user-alice".to_string(),
                name: "Alice".to_string(),
                email: "alice@x.com".to_string(),
                avatar_url: None,
            },
        };
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["recipient"], "bob@y.com");
        assert_eq!(json["granted_level"], "viewer");
        assert_eq!(json["granted_by"]["email"], "alice@x.com");
    }

    #[tokio::test]
    async fn broadcast_without_subscribers_counts_as_delivered() {
        let transport = BroadcastTransport::new();
        let note = Notification {
            recipient: "bob@y.com".to_string(),
            document_id: Uuid::nil(),
            granted_level: None,
            granted_by: Actor::default(),
        };
        assert!(transport.send(note).await.is_ok());
    }
}
