use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("Invalid profile name: {0}")]
    InvalidProfile(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Unsupported snapshot format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl IngestionError {
    /// Errors the caller can report as "not found" rather than a server failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, IngestionError::ProfileNotFound(_))
    }
}
