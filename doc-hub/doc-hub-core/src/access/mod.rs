//! Access levels, capability sets and the codec between them.

pub mod policy;
pub mod registry;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AccessError, Result};

/// Permission labels callers use when sharing a document.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Viewer,
    Editor,
    Owner,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Viewer => "viewer",
            AccessLevel::Editor => "editor",
            AccessLevel::Owner => "owner",
        }
    }

    pub fn parse(label: &str) -> Result<Self> {
        match label {
            "viewer" => Ok(AccessLevel::Viewer),
            "editor" => Ok(AccessLevel::Editor),
            "owner" => Ok(AccessLevel::Owner),
            other => Err(AccessError::InvalidAccessLevel(other.to_string())),
        }
    }
}

/// Concrete capabilities a user holds on a document. Absence of an entry is
/// the third state: no access at all.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum CapabilitySet {
    ReadOnly,
    ReadWrite,
}

impl CapabilitySet {
    pub fn can_write(&self) -> bool {
        matches!(self, CapabilitySet::ReadWrite)
    }
}

/// Map a permission label to the capability set it grants. Deterministic and
/// side-effect free; unrecognized labels fail with `InvalidAccessLevel`.
pub fn encode(label: &str) -> Result<CapabilitySet> {
    match AccessLevel::parse(label)? {
        AccessLevel::Viewer => Ok(CapabilitySet::ReadOnly),
        AccessLevel::Editor | AccessLevel::Owner => Ok(CapabilitySet::ReadWrite),
    }
}

/// One user's entry on one document, as returned by mutation paths.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessEntry {
    pub document_id: Uuid,
    pub user_key: String,
    pub capabilities: Option<CapabilitySet>,
}

/// A requested access mutation. `requested_level: None` means revocation.
/// Built by a caller, consumed once by the policy engine, never persisted.
#[derive(Clone, Debug)]
pub struct AccessChangeRequest {
    pub document_id: Uuid,
    pub target_user: String,
    pub requested_level: Option<String>,
    pub initiating_user: Actor,
}

/// Identity of the user driving a change, carried into notifications so the
/// recipient can see who shared the document with them.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}
