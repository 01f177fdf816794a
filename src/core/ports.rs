// Ports define what the core needs from the outside world, without implementing it.
//
// Purpose
// - Describe the remote document store, the authenticator and the user alert sink as traits.
//
// Responsibilities
// - Keep the sync cache independent of any concrete storage provider by coding against traits.
// - Carry the error taxonomy of the transport, including the distinguished permission error.
//
// Boundaries
// - No concrete input or output here. Adapters implement these traits in the adapters layer.
//
// Testing guidance
// - Use the in memory remote file service for tests and local development.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Fixed listing filter for "JSON documents this app can see".
pub const JSON_FILES_QUERY: &str = "mimeType='application/json' and trashed = false";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteFileError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("remote file not found: {0}")]
    NotFound(String),

    #[error("insufficient permissions: {0}")]
    InsufficientPermissions(String),

    #[error("not authenticated: {0}")]
    Unauthenticated(String),
}

/// Identity of a remote document without its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileRef {
    pub id: String,
    pub name: String,
}

/// A fetched remote document. `content` holds the parsed JSON body, or an
/// `{"error": {"type": "Parsing", ...}}` value when the body was not JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    pub content: serde_json::Value,
}

#[async_trait]
pub trait RemoteFileService: Send + Sync {
    async fn list(&self, query: &str) -> Result<Vec<RemoteFileRef>, RemoteFileError>;
    async fn get(&self, id: &str) -> Result<RemoteFile, RemoteFileError>;
    async fn create(
        &self,
        name: &str,
        content: &serde_json::Value,
    ) -> Result<RemoteFileRef, RemoteFileError>;
    async fn update(&self, id: &str, content: &serde_json::Value) -> Result<(), RemoteFileError>;
}

#[async_trait]
impl<S: RemoteFileService + ?Sized> RemoteFileService for Arc<S> {
    async fn list(&self, query: &str) -> Result<Vec<RemoteFileRef>, RemoteFileError> {
        (**self).list(query).await
    }

    async fn get(&self, id: &str) -> Result<RemoteFile, RemoteFileError> {
        (**self).get(id).await
    }

    async fn create(
        &self,
        name: &str,
        content: &serde_json::Value,
    ) -> Result<RemoteFileRef, RemoteFileError> {
        (**self).create(name, content).await
    }

    async fn update(&self, id: &str, content: &serde_json::Value) -> Result<(), RemoteFileError> {
        (**self).update(id, content).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no access token configured")]
    MissingToken,

    #[error("not logged in")]
    NotLoggedIn,
}

pub type LoginStateCallback = Box<dyn Fn(bool) + Send + Sync>;

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self) -> Result<(), AuthError>;
    async fn logout(&self);
    /// Drops the granted access entirely. The user has to log in again before
    /// any remote call succeeds.
    async fn revoke_access(&self);
    fn token(&self) -> Result<String, AuthError>;
    fn user_name(&self) -> Option<String>;
    fn is_logged_in(&self) -> bool;
    /// Registers a callback invoked with the new state on every login state change.
    fn on_login_state_changed(&self, callback: LoginStateCallback);
}

/// User-visible messages raised outside of a request/response cycle.
pub trait UserAlerts: Send + Sync {
    fn alert(&self, message: &str);
}
