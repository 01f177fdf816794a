// RemoteFileService over a local folder.
//
// Purpose
// - Run the service against real files without a cloud provider.
//
// Layout
// - `<root>/<id>/<name>`: one sub-folder per document, holding a single pretty printed JSON file.
// - Ids are UUIDv7 strings, so listing in id order is creation order.
//
// Responsibilities
// - Require a token from the authenticator before touching the folder.
// - Hand unparseable bodies back as an `{"error": {"type": "Parsing", ...}}` value.
// - Map permission denied io errors to `InsufficientPermissions`.

use crate::core::ports::{
    Authenticator, RemoteFile, RemoteFileError, RemoteFileRef, RemoteFileService,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

const JSON_EXTENSION: &str = ".json";

pub struct DirectoryRemoteFiles {
    root: PathBuf,
    authenticator: Arc<dyn Authenticator>,
}

impl DirectoryRemoteFiles {
    pub fn new(root: impl Into<PathBuf>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            root: root.into(),
            authenticator,
        }
    }

    fn authorize(&self) -> Result<(), RemoteFileError> {
        self.authenticator
            .token()
            .map(|_| ())
            .map_err(|err| RemoteFileError::Unauthenticated(err.to_string()))
    }

    fn document_dir(&self, id: &str) -> Result<PathBuf, RemoteFileError> {
        let valid = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid {
            return Err(RemoteFileError::NotFound(id.to_string()));
        }
        Ok(self.root.join(id))
    }

    async fn document_path(&self, id: &str, operation: &str) -> Result<PathBuf, RemoteFileError> {
        let dir = self.document_dir(id)?;
        match json_file_in(&dir).await {
            Ok(Some(name)) => Ok(dir.join(name)),
            Ok(None) => Err(RemoteFileError::NotFound(id.to_string())),
            Err(err) => Err(map_io_error(err, operation, id)),
        }
    }
}

#[async_trait]
impl RemoteFileService for DirectoryRemoteFiles {
    async fn list(&self, query: &str) -> Result<Vec<RemoteFileRef>, RemoteFileError> {
        self.authorize()?;
        debug!(query, root = %self.root.display(), "listing documents");
        let mut dirs = match fs::read_dir(&self.root).await {
            Ok(dirs) => dirs,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(map_io_error(err, "files.list", "")),
        };
        let mut files = Vec::new();
        while let Some(dir) = dirs
            .next_entry()
            .await
            .map_err(|err| map_io_error(err, "files.list", ""))?
        {
            let Some(id) = dir.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let is_dir = dir.file_type().await.is_ok_and(|kind| kind.is_dir());
            if !is_dir {
                continue;
            }
            if let Ok(Some(name)) = json_file_in(&dir.path()).await {
                files.push(RemoteFileRef { id, name });
            }
        }
        files.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(files)
    }

    async fn get(&self, id: &str) -> Result<RemoteFile, RemoteFileError> {
        self.authorize()?;
        let path = self.document_path(id, "files.get").await?;
        let body = fs::read_to_string(&path)
            .await
            .map_err(|err| map_io_error(err, "files.get", id))?;
        let content = serde_json::from_str(&body).unwrap_or_else(|err| {
            json!({"error": {"type": "Parsing", "message": err.to_string()}})
        });
        Ok(RemoteFile {
            id: id.to_string(),
            name: file_name(&path),
            content,
        })
    }

    async fn create(&self, name: &str, content: &Value) -> Result<RemoteFileRef, RemoteFileError> {
        self.authorize()?;
        if name.contains(['/', '\\']) || !name.ends_with(JSON_EXTENSION) {
            return Err(RemoteFileError::Backend(format!("invalid document name: {name}")));
        }
        let id = Uuid::now_v7().to_string();
        let dir = self.root.join(&id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|err| map_io_error(err, "files.create", &id))?;
        write_pretty(&dir.join(name), content)
            .await
            .map_err(|err| map_io_error(err, "files.create", &id))?;
        info!(id = %id, name, "created document");
        Ok(RemoteFileRef {
            id,
            name: name.to_string(),
        })
    }

    async fn update(&self, id: &str, content: &Value) -> Result<(), RemoteFileError> {
        self.authorize()?;
        let path = self.document_path(id, "files.update").await?;
        write_pretty(&path, content)
            .await
            .map_err(|err| map_io_error(err, "files.update", id))
    }
}

async fn json_file_in(dir: &Path) -> io::Result<Option<String>> {
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(JSON_EXTENSION) {
            return Ok(Some(name));
        }
    }
    Ok(None)
}

async fn write_pretty(path: &Path, content: &Value) -> io::Result<()> {
    let body = serde_json::to_string_pretty(content).map_err(io::Error::other)?;
    fs::write(path, body).await
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string()
}

fn map_io_error(err: io::Error, operation: &str, id: &str) -> RemoteFileError {
    match err.kind() {
        io::ErrorKind::NotFound => RemoteFileError::NotFound(id.to_string()),
        io::ErrorKind::PermissionDenied => {
            RemoteFileError::InsufficientPermissions(operation.to_string())
        }
        _ => RemoteFileError::Backend(format!("{operation}: {err}")),
    }
}
