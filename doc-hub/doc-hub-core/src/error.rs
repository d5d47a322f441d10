//! Typed failure taxonomy for the access-control core.
//!
//! Validation failures are policy decisions and must reach the caller as
//! distinct variants. Only notification delivery is allowed to fail silently,
//! and that lives in its own type so it can never be confused with an access
//! mutation failure.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("document {0} not found")]
    DocumentNotFound(Uuid),

    #[error("user {user} has no access to document {document_id}")]
    AccessDenied { document_id: Uuid, user: String },

    #[error("the document creator cannot be removed from their own document")]
    SelfRemovalForbidden,

    #[error("unrecognized access level '{0}'")]
    InvalidAccessLevel(String),

    #[error("entry for {user} on document {document_id} is protected")]
    ProtectedEntry { document_id: Uuid, user: String },

    #[error("collaboration backend failure: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, AccessError>;

/// Failure of the notification side channel. Never converts a successful
/// access change into an apparent failure; callers log it and move on.
#[derive(Debug, Error)]
#[error("notification transport failure: {0}")]
pub struct TransportError(pub String);
