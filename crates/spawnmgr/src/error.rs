//! Location registry error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("invalid location: {0}")]
    InvalidArgument(String),

    #[error("no location named '{0}'")]
    NotFound(String),

    #[error("failed to access {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a locations file: {reason}", path.display())]
    Malformed { path: PathBuf, reason: &'static str },

    #[error("failed to encode or decode {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
