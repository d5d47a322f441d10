//! Document model and the store boundary towards the collaboration backend.
//!
//! The backend owns each document together with its access map and must apply
//! `update_access` as one read-modify-write per document; that is the unit of
//! consistency everything above relies on. Implementations hand out value
//! snapshots, never references into their own state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::access::CapabilitySet;
use crate::error::{AccessError, Result};

pub const DEFAULT_TITLE: &str = "Untitled";

/// A collaborative document as this module sees it: metadata plus the
/// per-user access map. Content lives in the collaboration backend and is
/// out of scope here.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub creator_id: String,
    pub creator_email: String,
    pub created_at: DateTime<Utc>,
    pub accesses: HashMap<String, CapabilitySet>,
}

impl Document {
    /// A fresh document with its creator seeded as the sole read/write
    /// accessor.
    pub fn new(id: Uuid, creator_id: String, creator_email: String) -> Self {
        let mut accesses = HashMap::new();
        accesses.insert(creator_email.clone(), CapabilitySet::ReadWrite);
        Self {
            id,
            title: DEFAULT_TITLE.to_string(),
            creator_id,
            creator_email,
            created_at: Utc::now(),
            accesses,
        }
    }

    pub fn capabilities_of(&self, user_key: &str) -> Option<CapabilitySet> {
        self.accesses.get(user_key).copied()
    }
}

/// Mutable metadata fields. Creator identity is immutable and deliberately
/// absent.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MetadataPatch {
    pub title: Option<String>,
}

/// Interface to the external document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create(&self, document: Document) -> Result<Document>;

    async fn get(&self, id: Uuid) -> Result<Document>;

    async fn update_metadata(&self, id: Uuid, patch: MetadataPatch) -> Result<Document>;

    /// Atomically set or clear one user's entry in a document's access map.
    /// `None` removes the entry. Returns the document after the change.
    async fn update_access(
        &self,
        id: Uuid,
        user_key: &str,
        capabilities: Option<CapabilitySet>,
    ) -> Result<Document>;

    /// Removes the document and its access map as one unit.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Snapshot of every document where the user holds any capability.
    async fn documents_for_user(&self, user_key: &str) -> Result<Vec<Document>>;
}

/// In-memory store. Each method takes the map lock for the whole
/// read-modify-write, which gives the per-document atomicity the registry
/// expects from a real backend.
pub struct MemoryStore {
    docs: RwLock<HashMap<Uuid, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, document: Document) -> Result<Document> {
        let mut docs = self.docs.write().await;
        docs.insert(document.id, document.clone());
        Ok(document)
    }

    async fn get(&self, id: Uuid) -> Result<Document> {
        let docs = self.docs.read().await;
        docs.get(&id)
            .cloned()
            .ok_or(AccessError::DocumentNotFound(id))
    }

    async fn update_metadata(&self, id: Uuid, patch: MetadataPatch) -> Result<Document> {
        let mut docs = self.docs.write().await;
        let doc = docs
            .get_mut(&id)
            .ok_or(AccessError::DocumentNotFound(id))?;
        if let Some(title) = patch.title {
            doc.title = title;
        }
        Ok(doc.clone())
    }

    async fn update_access(
        &self,
        id: Uuid,
        user_key: &str,
        capabilities: Option<CapabilitySet>,
    ) -> Result<Document> {
        let mut docs = self.docs.write().await;
        let doc = docs
            .get_mut(&id)
            .ok_or(AccessError::DocumentNotFound(id))?;
        match capabilities {
            Some(caps) => {
                doc.accesses.insert(user_key.to_string(), caps);
            }
            None => {
                doc.accesses.remove(user_key);
            }
        }
        Ok(doc.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut docs = self.docs.write().await;
        docs.remove(&id).ok_or(AccessError::DocumentNotFound(id))?;
        Ok(())
    }

    async fn documents_for_user(&self, user_key: &str) -> Result<Vec<Document>> {
        let docs = self.docs.read().await;
        Ok(docs
            .values()
            .filter(|d| d.accesses.contains_key(user_key))
            .cloned()
            .collect())
    }
}

/// Identifier generation, injected so tests can pin ids.
pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> Uuid;
}

pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}
