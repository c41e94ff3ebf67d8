use std::io;
use std::path::PathBuf;

use infakt_core::InfaktError;
use thiserror::Error;

use super::paths::SlotError;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("api error: {0}")]
    Api(#[from] InfaktError),
    #[error("failed to create directory {}: {source}", path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("schema validation failed for {category}: {detail}")]
    SchemaValidation { category: String, detail: String },
    #[error("slot error: {0}")]
    Slot(#[from] SlotError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MirrorError {
    pub(crate) fn schema(category: &str, detail: impl Into<String>) -> Self {
        MirrorError::SchemaValidation {
            category: category.to_string(),
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MirrorError::Api(err) if err.is_retry_exhaustion() => "exceeded_retries",
            MirrorError::Api(InfaktError::InvalidPage { .. }) => "schema_validation",
            MirrorError::Api(_) => "api",
            MirrorError::DirectoryCreation { .. } => "directory_creation",
            MirrorError::Io { .. } => "io",
            MirrorError::SchemaValidation { .. } => "schema_validation",
            MirrorError::Slot(_) => "slot",
            MirrorError::Json(_) => "json",
        }
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: io::Error) -> MirrorError {
    MirrorError::Io {
        path: path.into(),
        source,
    }
}
