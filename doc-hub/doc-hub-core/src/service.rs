//! Public surface consumed by the web layer.
//!
//! Thin composition of store, registry and policy engine. Every dependency is
//! injected; nothing here owns global state.

use std::sync::Arc;
use uuid::Uuid;

use crate::access::{AccessChangeRequest, AccessEntry, Actor, CapabilitySet};
use crate::access::policy::PolicyEngine;
use crate::access::registry::AccessRegistry;
use crate::error::{AccessError, Result};
use crate::events::{Event, EventBus};
use crate::notify::ChangeNotifier;
use crate::storage::{Document, DocumentStore, IdGenerator, MetadataPatch};

pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    ids: Arc<dyn IdGenerator>,
    registry: AccessRegistry,
    policy: PolicyEngine,
    events: EventBus,
}

impl DocumentService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        ids: Arc<dyn IdGenerator>,
        notifier: ChangeNotifier,
        events: EventBus,
    ) -> Self {
        let registry = AccessRegistry::new(store.clone());
        let policy = PolicyEngine::new(store.clone(), registry.clone(), notifier);
        Self {
            store,
            ids,
            registry,
            policy,
            events,
        }
    }

    pub fn registry(&self) -> &AccessRegistry {
        &self.registry
    }

    /// Create a document owned by `owner_id`, with the owner seeded as its
    /// only read/write accessor.
    pub async fn create_document(&self, owner_id: &str, owner_email: &str) -> Result<Document> {
        let id = self.ids.new_id();
        let doc = self
            .store
            .create(Document::new(
                id,
                owner_id.to_string(),
                owner_email.to_string(),
            ))
            .await?;
        self.events.send(Event::Created { id });
        Ok(doc)
    }

    /// Fetch a document on behalf of a user. Users without an entry in the
    /// access map get `AccessDenied`, not the document.
    pub async fn get_document(&self, id: Uuid, requesting_user: &str) -> Result<Document> {
        let doc = self.store.get(id).await?;
        if doc.capabilities_of(requesting_user).is_none() {
            return Err(AccessError::AccessDenied {
                document_id: id,
                user: requesting_user.to_string(),
            });
        }
        Ok(doc)
    }

    pub async fn update_document(&self, id: Uuid, new_title: &str) -> Result<Document> {
        let doc = self
            .store
            .update_metadata(
                id,
                MetadataPatch {
                    title: Some(new_title.to_string()),
                },
            )
            .await?;
        self.events.send(Event::Updated { id });
        Ok(doc)
    }

    pub async fn list_documents_for_user(&self, user_email: &str) -> Result<Vec<Document>> {
        self.store.documents_for_user(user_email).await
    }

    /// Delete the document and, with it, its entire access map.
    pub async fn delete_document(&self, id: Uuid) -> Result<()> {
        self.store.delete(id).await?;
        self.events.send(Event::Deleted { id });
        Ok(())
    }

    /// Grant `target_email` the given level on the document. Runs the full
    /// policy path, so the level label is validated and the recipient is
    /// notified on an effective change.
    pub async fn share_document(
        &self,
        id: Uuid,
        target_email: &str,
        level: &str,
        initiator: Actor,
    ) -> Result<AccessEntry> {
        let entry = self
            .policy
            .apply_change(AccessChangeRequest {
                document_id: id,
                target_user: target_email.to_string(),
                requested_level: Some(level.to_string()),
                initiating_user: initiator,
            })
            .await?;
        self.events.send(Event::Shared {
            id,
            user_key: entry.user_key.clone(),
        });
        Ok(entry)
    }

    /// Revoke `target_email`'s entry. The creator's own entry is protected
    /// and this fails with `SelfRemovalForbidden` when targeted.
    pub async fn remove_collaborator(
        &self,
        id: Uuid,
        target_email: &str,
        initiator: Actor,
    ) -> Result<AccessEntry> {
        let entry = self
            .policy
            .apply_change(AccessChangeRequest {
                document_id: id,
                target_user: target_email.to_string(),
                requested_level: None,
                initiating_user: initiator,
            })
            .await?;
        self.events.send(Event::Unshared {
            id,
            user_key: entry.user_key.clone(),
        });
        Ok(entry)
    }

    /// Users with any entry on the document, with their capabilities.
    pub async fn list_sharing(&self, id: Uuid) -> Result<Vec<(String, CapabilitySet)>> {
        let doc = self.store.get(id).await?;
        Ok(doc.accesses.into_iter().collect())
    }
}
