//! Error taxonomy for model submissions

use thiserror::Error;

use crate::mesh::MeshError;

/// Errors surfaced by the model lifecycle.
///
/// Every variant is terminal for the submission that produced it only; the
/// viewer keeps running and the user may pick another file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewerError {
    #[error("Unsupported format: .{extension}")]
    UnsupportedFormat { extension: String },
    #[error("Loader failed: {0}")]
    LoaderFailure(String),
    #[error("Malformed loader result: {0}")]
    MalformedResult(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl ViewerError {
    /// Whether this error came out of a dispatched load (as opposed to being
    /// rejected before dispatch or raised by configuration).
    pub fn is_load_failure(&self) -> bool {
        matches!(self, Self::LoaderFailure(_) | Self::MalformedResult(_))
    }
}

impl From<MeshError> for ViewerError {
    fn from(err: MeshError) -> Self {
        Self::LoaderFailure(err.to_string())
    }
}

impl From<std::io::Error> for ViewerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ViewerError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
