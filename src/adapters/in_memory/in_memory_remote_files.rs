// In memory implementation of the RemoteFileService port.
//
// Purpose
// - Support sync cache tests and local development without a remote file store.
//
// Responsibilities
// - Keep documents in insertion order, ids are UUIDv7 strings.
// - Record every call, including failed ones, so tests can count remote traffic.
// - Simulate an offline backend, denied permissions and a slow transport.

use crate::core::ports::{RemoteFile, RemoteFileError, RemoteFileRef, RemoteFileService};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    List(String),
    Get(String),
    Create { name: String, content: Value },
    Update { id: String, content: Value },
}

#[derive(Default)]
pub struct InMemoryRemoteFiles {
    files: RwLock<Vec<RemoteFile>>,
    calls: Mutex<Vec<RemoteCall>>,
    is_offline: AtomicBool,
    is_denied: AtomicBool,
    delay_ms: AtomicU64,
}

impl InMemoryRemoteFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_offline(&self) {
        self.is_offline.fetch_xor(true, Ordering::SeqCst);
    }

    pub fn deny_permissions(&self, denied: bool) {
        self.is_denied.store(denied, Ordering::SeqCst);
    }

    /// Every call sleeps this long after being recorded.
    pub fn set_delay_ms(&self, delay_ms: u64) {
        self.delay_ms.store(delay_ms, Ordering::SeqCst);
    }

    pub async fn seed(&self, id: &str, name: &str, content: Value) {
        self.files.write().await.push(RemoteFile {
            id: id.to_string(),
            name: name.to_string(),
            content,
        });
    }

    pub async fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().await.clone()
    }

    pub async fn list_calls(&self) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| matches!(call, RemoteCall::List(_)))
            .count()
    }

    pub async fn get_calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                RemoteCall::Get(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn created(&self) -> Vec<(String, Value)> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                RemoteCall::Create { name, content } => Some((name.clone(), content.clone())),
                _ => None,
            })
            .collect()
    }

    pub async fn updated(&self) -> Vec<(String, Value)> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                RemoteCall::Update { id, content } => Some((id.clone(), content.clone())),
                _ => None,
            })
            .collect()
    }

    pub async fn files(&self) -> Vec<RemoteFile> {
        self.files.read().await.clone()
    }

    pub async fn content_by_name(&self, name: &str) -> Option<Value> {
        self.files
            .read()
            .await
            .iter()
            .find(|file| file.name == name)
            .map(|file| file.content.clone())
    }

    async fn record(&self, call: RemoteCall, operation: &str) -> Result<(), RemoteFileError> {
        self.calls.lock().await.push(call);
        let delay_ms = self.delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        if self.is_offline.load(Ordering::SeqCst) {
            return Err(RemoteFileError::Backend(format!("{operation}: offline")));
        }
        if self.is_denied.load(Ordering::SeqCst) {
            return Err(RemoteFileError::InsufficientPermissions(operation.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteFileService for InMemoryRemoteFiles {
    async fn list(&self, query: &str) -> Result<Vec<RemoteFileRef>, RemoteFileError> {
        self.record(RemoteCall::List(query.to_string()), "files.list")
            .await?;
        Ok(self
            .files
            .read()
            .await
            .iter()
            .map(|file| RemoteFileRef {
                id: file.id.clone(),
                name: file.name.clone(),
            })
            .collect())
    }

    async fn get(&self, id: &str) -> Result<RemoteFile, RemoteFileError> {
        self.record(RemoteCall::Get(id.to_string()), "files.get")
            .await?;
        self.files
            .read()
            .await
            .iter()
            .find(|file| file.id == id)
            .cloned()
            .ok_or_else(|| RemoteFileError::NotFound(id.to_string()))
    }

    async fn create(&self, name: &str, content: &Value) -> Result<RemoteFileRef, RemoteFileError> {
        let call = RemoteCall::Create {
            name: name.to_string(),
            content: content.clone(),
        };
        self.record(call, "files.create").await?;
        let id = Uuid::now_v7().to_string();
        self.seed(&id, name, content.clone()).await;
        Ok(RemoteFileRef {
            id,
            name: name.to_string(),
        })
    }

    async fn update(&self, id: &str, content: &Value) -> Result<(), RemoteFileError> {
        let call = RemoteCall::Update {
            id: id.to_string(),
            content: content.clone(),
        };
        self.record(call, "files.update").await?;
        let mut files = self.files.write().await;
        let file = files
            .iter_mut()
            .find(|file| file.id == id)
            .ok_or_else(|| RemoteFileError::NotFound(id.to_string()))?;
        file.content = content.clone();
        Ok(())
    }
}
