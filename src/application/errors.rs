use crate::core::ports::RemoteFileError;
use thiserror::Error;

/// Errors surfaced by the sync cache. Cloneable so a shared fetch can hand the
/// same failure to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error(transparent)]
    Remote(#[from] RemoteFileError),

    #[error("persist task aborted: {0}")]
    TaskAborted(String),

    #[error("no async runtime to persist on")]
    NoRuntime,
}

impl SyncError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            SyncError::Remote(RemoteFileError::InsufficientPermissions(_))
        )
    }
}
