//! The decision layer for access mutations.
//!
//! All validation happens before any registry mutation, so a rejected request
//! leaves the access map untouched. Notification comes last and is
//! best-effort only.

use std::sync::Arc;
use tracing::debug;

use crate::access::registry::AccessRegistry;
use crate::access::{encode, AccessChangeRequest, AccessEntry, AccessLevel};
use crate::error::{AccessError, Result};
use crate::notify::{ChangeNotifier, Notification};
use crate::storage::DocumentStore;

pub struct PolicyEngine {
    store: Arc<dyn DocumentStore>,
    registry: AccessRegistry,
    notifier: ChangeNotifier,
}

impl PolicyEngine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        registry: AccessRegistry,
        notifier: ChangeNotifier,
    ) -> Self {
        Self {
            store,
            registry,
            notifier,
        }
    }

    /// Validate and apply one access mutation.
    ///
    /// Order matters: document lookup, creator protection and level
    /// translation all fail fast with nothing mutated. Only then does the
    /// registry change, and only after that does the notifier run.
    pub async fn apply_change(&self, request: AccessChangeRequest) -> Result<AccessEntry> {
        let document = self.store.get(request.document_id).await?;

        if request.requested_level.is_none() && request.target_user == document.creator_email {
            return Err(AccessError::SelfRemovalForbidden);
        }

        let capabilities = match &request.requested_level {
            Some(label) => Some(encode(label)?),
            None => None,
        };

        let previous = document.capabilities_of(&request.target_user);

        match capabilities {
            Some(caps) => {
                self.registry
                    .grant(request.document_id, &request.target_user, caps)
                    .await?;
            }
            None => {
                self.registry
                    .revoke(request.document_id, &request.target_user)
                    .await?;
            }
        }

        // A grant that changes nothing should not re-notify the holder.
        if previous == capabilities {
            debug!(
                document_id = %request.document_id,
                target = request.target_user,
                "access unchanged, skipping notification"
            );
        } else {
            let granted_level = request
                .requested_level
                .as_deref()
                .map(AccessLevel::parse)
                .transpose()?;
            self.notifier
                .notify(Notification {
                    recipient: request.target_user.clone(),
                    document_id: request.document_id,
                    granted_level,
                    granted_by: request.initiating_user.clone(),
                })
                .await;
        }

        Ok(AccessEntry {
            document_id: request.document_id,
            user_key: request.target_user,
            capabilities,
        })
    }
}
