//! The authoritative document -> {user -> capabilities} mapping.
//!
//! The registry does not hold state of its own; every operation goes through
//! the injected store, which serializes access-map updates per document. The
//! creator-protection check here duplicates the policy engine's on purpose:
//! it is the last line of defense for callers that bypass the engine.

use std::sync::Arc;
use uuid::Uuid;

use crate::access::CapabilitySet;
use crate::error::{AccessError, Result};
use crate::storage::DocumentStore;

#[derive(Clone)]
pub struct AccessRegistry {
    store: Arc<dyn DocumentStore>,
}

impl AccessRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Idempotent upsert of one user's entry. Overwrites any existing
    /// capability set.
    pub async fn grant(
        &self,
        document_id: Uuid,
        user_key: &str,
        capabilities: CapabilitySet,
    ) -> Result<()> {
        self.store
            .update_access(document_id, user_key, Some(capabilities))
            .await?;
        Ok(())
    }

    /// Removes one user's entry. Removing an absent entry succeeds as a
    /// no-op; removing the creator's entry always fails.
    pub async fn revoke(&self, document_id: Uuid, user_key: &str) -> Result<()> {
        let doc = self.store.get(document_id).await?;
        if doc.creator_email == user_key {
            return Err(AccessError::ProtectedEntry {
                document_id,
                user: user_key.to_string(),
            });
        }
        self.store.update_access(document_id, user_key, None).await?;
        Ok(())
    }

    /// Current capabilities of one user, `None` when no entry exists. Fails
    /// only when the document itself is missing.
    pub async fn get(&self, document_id: Uuid, user_key: &str) -> Result<Option<CapabilitySet>> {
        let doc = self.store.get(document_id).await?;
        Ok(doc.capabilities_of(user_key))
    }

    /// Snapshot of every user holding an entry on the document.
    pub async fn list_accessors(&self, document_id: Uuid) -> Result<Vec<String>> {
        let doc = self.store.get(document_id).await?;
        Ok(doc.accesses.keys().cloned().collect())
    }

    /// Every document where the user holds any capability.
    pub async fn query(&self, user_key: &str) -> Result<Vec<Uuid>> {
        let docs = self.store.documents_for_user(user_key).await?;
        Ok(docs.into_iter().map(|d| d.id).collect())
    }
}
