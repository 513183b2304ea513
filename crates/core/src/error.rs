use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScratchError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("invalid filename format {format:?}: {reason}")]
    InvalidFormat { format: String, reason: String },
    #[error("could not render settings: {0}")]
    Toml(#[from] toml::ser::Error),
    #[error("invalid project file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not determine the home directory")]
    HomeNotFound,
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScratchError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScratchError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, ScratchError::Io { source, .. } if source.kind() == std::io::ErrorKind::AlreadyExists)
    }

    /// True for errors caused by user settings rather than the filesystem.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            ScratchError::Config(_) | ScratchError::InvalidFormat { .. } | ScratchError::HomeNotFound
        )
    }
}

pub type Result<T> = std::result::Result<T, ScratchError>;
