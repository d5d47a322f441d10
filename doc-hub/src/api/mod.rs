//! HTTP API layer exposing document CRUD and sharing endpoints.

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use doc_hub_core::access::{AccessEntry, Actor, CapabilitySet};
use doc_hub_core::error::AccessError;
use doc_hub_core::service::DocumentService;
use doc_hub_core::storage::Document;

/// Identity of the caller, taken from request headers. Token verification
/// happens upstream of this service.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user_id: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

impl AuthContext {
    fn actor(&self) -> Actor {
        Actor {
            id: self.user_id.clone(),
            name: self.name.clone().unwrap_or_else(|| self.email.clone()),
            email: self.email.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        };
        match (header("X-User-Id"), header("X-User-Email")) {
            (Some(user_id), Some(email)) => Ok(Self {
                user_id,
                email,
                name: header("X-User-Name"),
                avatar_url: header("X-User-Avatar"),
            }),
            _ => Err(StatusCode::UNAUTHORIZED),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DocumentService>,
}

fn status_for(err: &AccessError) -> StatusCode {
    match err {
        AccessError::DocumentNotFound(_) => StatusCode::NOT_FOUND,
        AccessError::AccessDenied { .. }
        | AccessError::SelfRemovalForbidden
        | AccessError::ProtectedEntry { .. } => StatusCode::FORBIDDEN,
        AccessError::InvalidAccessLevel(_) => StatusCode::BAD_REQUEST,
        AccessError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Serialize, Deserialize)]
struct DocResponse {
    id: Uuid,
    title: String,
    creator_id: String,
    creator_email: String,
}

impl From<Document> for DocResponse {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            creator_id: doc.creator_id,
            creator_email: doc.creator_email,
        }
    }
}

#[derive(Deserialize)]
struct RenameRequest {
    title: String,
}

#[derive(Serialize, Deserialize)]
struct ShareRequest {
    email: String,
    level: String,
}

#[derive(Serialize, Deserialize)]
struct UnshareRequest {
    email: String,
}

#[derive(Serialize)]
struct SharingEntry {
    user: String,
    capabilities: CapabilitySet,
}

pub fn router(service: Arc<DocumentService>) -> Router {
    let state = AppState { service };
    Router::new()
        .route("/docs", post(create_doc).get(list_docs))
        .route(
            "/docs/{id}",
            get(get_doc).put(rename_doc).delete(delete_doc),
        )
        .route("/docs/{id}/share", post(share_doc).delete(unshare_doc))
        .route("/docs/{id}/sharing", get(list_sharing))
        .with_state(state)
}

/// Write access of the caller, for mutations the service itself does not
/// gate on a requesting user.
async fn require_write(
    state: &AppState,
    auth: &AuthContext,
    id: Uuid,
) -> Result<(), StatusCode> {
    let caps = state
        .service
        .registry()
        .get(id, &auth.email)
        .await
        .map_err(|e| status_for(&e))?;
    match caps {
        Some(caps) if caps.can_write() => Ok(()),
        _ => Err(StatusCode::FORBIDDEN),
    }
}

async fn create_doc(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<DocResponse>, StatusCode> {
    let doc = state
        .service
        .create_document(&auth.user_id, &auth.email)
        .await
        .map_err(|e| status_for(&e))?;
    Ok(Json(doc.into()))
}

async fn list_docs(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<DocResponse>>, StatusCode> {
    let docs = state
        .service
        .list_documents_for_user(&auth.email)
        .await
        .map_err(|e| status_for(&e))?;
    Ok(Json(docs.into_iter().map(DocResponse::from).collect()))
}

async fn get_doc(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<DocResponse>, StatusCode> {
    let doc = state
        .service
        .get_document(id, &auth.email)
        .await
        .map_err(|e| status_for(&e))?;
    Ok(Json(doc.into()))
}

async fn rename_doc(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<DocResponse>, StatusCode> {
    require_write(&state, &auth, id).await?;
    let doc = state
        .service
        .update_document(id, &req.title)
        .await
        .map_err(|e| status_for(&e))?;
    Ok(Json(doc.into()))
}

async fn delete_doc(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    require_write(&state, &auth, id).await?;
    state
        .service
        .delete_document(id)
        .await
        .map_err(|e| status_for(&e))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn share_doc(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<ShareRequest>,
) -> Result<Json<AccessEntry>, StatusCode> {
    require_write(&state, &auth, id).await?;
    let entry = state
        .service
        .share_document(id, &req.email, &req.level, auth.actor())
        .await
        .map_err(|e| status_for(&e))?;
    Ok(Json(entry))
}

async fn unshare_doc(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UnshareRequest>,
) -> Result<Json<AccessEntry>, StatusCode> {
    require_write(&state, &auth, id).await?;
    let entry = state
        .service
        .remove_collaborator(id, &req.email, auth.actor())
        .await
        .map_err(|e| status_for(&e))?;
    Ok(Json(entry))
}

async fn list_sharing(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SharingEntry>>, StatusCode> {
    // Any collaborator may see who else has access.
    state
        .service
        .get_document(id, &auth.email)
        .await
        .map_err(|e| status_for(&e))?;
    let sharing = state
        .service
        .list_sharing(id)
        .await
        .map_err(|e| status_for(&e))?;
    Ok(Json(
        sharing
            .into_iter()
            .map(|(user, capabilities)| SharingEntry { user, capabilities })
            .collect(),
    ))
}
