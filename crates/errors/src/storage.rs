//! Storage and filesystem-related error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum StorageError {
    #[error("path not found: {path}")]
    PathNotFound { path: String },

    #[error("permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("corrupted data: {message}")]
    CorruptedData { message: String },
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        // Without a known path, avoid inventing placeholders; preserve message only
        Self::IoError {
            message: err.to_string(),
        }
    }
}

impl StorageError {
    /// Convert an `io::Error` into a `StorageError` with an associated path
    #[must_use]
    pub fn from_io_with_path(err: &std::io::Error, path: &std::path::Path) -> Self {
        let path = path.display().to_string();
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::PathNotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::IoError {
                message: format!("{path}: {err}"),
            },
        }
    }

    /// Stable error code for analytics / structured reporting.
    #[must_use]
    pub fn user_code(&self) -> Option<&'static str> {
        match self {
            StorageError::PathNotFound { .. } => Some("storage.path_not_found"),
            StorageError::PermissionDenied { .. } => Some("storage.permission_denied"),
            StorageError::IoError { .. } => Some("storage.io_error"),
            StorageError::CorruptedData { .. } => Some("storage.corrupted_data"),
        }
    }
}
