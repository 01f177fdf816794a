use crate::core::ports::{RemoteFile, RemoteFileError, RemoteFileRef, RemoteFileService};
use async_trait::async_trait;
use serde_json::Value;

/// Transport used before anyone logged in. Lists nothing and refuses everything else,
/// so local writes stay local until a session cache replaces the detached one.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedRemoteFiles;

const NOT_LOGGED_IN: &str = "not logged in";

#[async_trait]
impl RemoteFileService for DetachedRemoteFiles {
    async fn list(&self, _query: &str) -> Result<Vec<RemoteFileRef>, RemoteFileError> {
        Ok(Vec::new())
    }

    async fn get(&self, _id: &str) -> Result<RemoteFile, RemoteFileError> {
        Err(RemoteFileError::Unauthenticated(NOT_LOGGED_IN.into()))
    }

    async fn create(&self, _name: &str, _content: &Value) -> Result<RemoteFileRef, RemoteFileError> {
        Err(RemoteFileError::Unauthenticated(NOT_LOGGED_IN.into()))
    }

    async fn update(&self, _id: &str, _content: &Value) -> Result<(), RemoteFileError> {
        Err(RemoteFileError::Unauthenticated(NOT_LOGGED_IN.into()))
    }
}
