// Permission error policy around any RemoteFileService.
//
// An `InsufficientPermissions` failure revokes the granted access and raises a
// user alert before the error is handed back. Every other result passes through.

use crate::core::ports::{
    Authenticator, RemoteFile, RemoteFileError, RemoteFileRef, RemoteFileService, UserAlerts,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

pub const INSUFFICIENT_PERMISSIONS_ALERT: &str = "Tally Anything has insufficient permissions. \
Don't worry, this app can only access files that you've created using this app, your data is safe. \
To use this app, please grant the requested permissions while signing in.";

pub struct PermissionGuard<S> {
    inner: S,
    authenticator: Arc<dyn Authenticator>,
    alerts: Arc<dyn UserAlerts>,
}

impl<S: RemoteFileService> PermissionGuard<S> {
    pub fn new(inner: S, authenticator: Arc<dyn Authenticator>, alerts: Arc<dyn UserAlerts>) -> Self {
        Self {
            inner,
            authenticator,
            alerts,
        }
    }

    async fn guard<T>(&self, result: Result<T, RemoteFileError>) -> Result<T, RemoteFileError> {
        if let Err(RemoteFileError::InsufficientPermissions(operation)) = &result {
            warn!(%operation, "remote file service denied permission");
            self.authenticator.revoke_access().await;
            self.alerts.alert(INSUFFICIENT_PERMISSIONS_ALERT);
        }
        result
    }
}

#[async_trait]
impl<S: RemoteFileService> RemoteFileService for PermissionGuard<S> {
    async fn list(&self, query: &str) -> Result<Vec<RemoteFileRef>, RemoteFileError> {
        let result = self.inner.list(query).await;
        self.guard(result).await
    }

    async fn get(&self, id: &str) -> Result<RemoteFile, RemoteFileError> {
        let result = self.inner.get(id).await;
        self.guard(result).await
    }

    async fn create(&self, name: &str, content: &Value) -> Result<RemoteFileRef, RemoteFileError> {
        let result = self.inner.create(name, content).await;
        self.guard(result).await
    }

    async fn update(&self, id: &str, content: &Value) -> Result<(), RemoteFileError> {
        let result = self.inner.update(id, content).await;
        self.guard(result).await
    }
}
