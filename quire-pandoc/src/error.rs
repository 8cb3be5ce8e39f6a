//! Error types for transcoding operations

use std::io;
use thiserror::Error;

pub type Result<T, E = CodecError> = std::result::Result<T, E>;

/// Errors raised by the rPNG side channel.
#[derive(Debug, Error)]
pub enum RpngError {
    /// No text chunk with the keyword exists in the image
    #[error("no '{0}' chunk in image")]
    NotFound(String),
    /// The bytes do not start with the PNG signature
    #[error("not a PNG image")]
    NotPng,
    /// A chunk header or body runs past the end of the image
    #[error("truncated PNG chunk at byte {0}")]
    Truncated(usize),
    /// The image has no terminal `IEND` chunk to insert before
    #[error("PNG image has no IEND chunk")]
    MissingEnd,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// The rasterizer failed to produce an image
    #[error("rasterization failed: {0}")]
    Raster(String),
    /// The remote node store rejected an upload or lookup
    #[error("node store error: {0}")]
    Store(String),
}

/// Errors raised while running the external engine.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The engine binary could not be located
    #[error("unable to locate pandoc: {0}")]
    NotFound(String),
    #[error("failed to launch pandoc ({binary}): {source}")]
    Spawn {
        binary: String,
        #[source]
        source: io::Error,
    },
    /// The engine reported errors on its diagnostic stream or exited non-zero
    #[error("pandoc failed: {0}")]
    Engine(String),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Errors surfaced by `decode`/`encode`.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Format not found in the registry
    #[error("format '{0}' not found")]
    FormatNotFound(String),
    /// The engine produced a document that is not valid Pandoc JSON
    #[error("malformed document: {0}")]
    Malformed(String),
    #[error(transparent)]
    Rpng(#[from] RpngError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// A background pre-pass task panicked or was cancelled
    #[error("background task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for CodecError {
    fn from(err: tokio::task::JoinError) -> Self {
        CodecError::Task(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert_eq!(
            RpngError::NotFound("json-ld".to_string()).to_string(),
            "no 'json-ld' chunk in image"
        );
        assert!(BridgeError::Engine("boom".to_string())
            .to_string()
            .starts_with("pandoc failed:"));
        assert!(CodecError::from(RpngError::NotPng)
            .to_string()
            .contains("not a PNG"));
    }
}
