//! Error types for the converter

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error kinds that can occur while discovering source files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiscoveryErrorKind {
    /// Permission denied when accessing a file or directory
    PermissionDenied,
    /// File or directory not found
    NotFound,
    /// I/O error during traversal
    IoError,
    /// None of the supplied roots could be read
    NoReadableRoots,
}

/// Represents an error that occurred during discovery
#[derive(Debug, Clone, Error, Serialize)]
#[error("{kind:?}: {message} (path: {path:?})")]
pub struct DiscoveryError {
    /// The kind of error
    pub kind: DiscoveryErrorKind,
    /// The path where the error occurred
    pub path: Option<PathBuf>,
    /// Human-readable error message
    pub message: String,
}

impl DiscoveryError {
    /// Create a new discovery error
    pub fn new(kind: DiscoveryErrorKind, path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
        }
    }

    /// Build an error for `path` from an I/O failure, keeping the kind distinction
    pub fn from_io(path: PathBuf, err: &std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::PermissionDenied => DiscoveryErrorKind::PermissionDenied,
            std::io::ErrorKind::NotFound => DiscoveryErrorKind::NotFound,
            _ => DiscoveryErrorKind::IoError,
        };
        Self::new(kind, Some(path), err.to_string())
    }

    /// Create the fatal error raised when every root failed
    pub fn no_readable_roots(count: usize) -> Self {
        Self::new(
            DiscoveryErrorKind::NoReadableRoots,
            None,
            format!("none of the {} root path(s) could be read", count),
        )
    }
}

/// Errors reported by an [`ImageCodec`](crate::codec::ImageCodec) implementation
#[derive(Debug, Error)]
pub enum CodecError {
    /// The input bytes are not in a format the codec understands
    #[error("unsupported image format: {0}")]
    Unsupported(String),

    /// The input could be identified but not decoded
    #[error("decode failed: {0}")]
    Decode(String),

    /// The pixels could not be encoded
    #[error("encode failed: {0}")]
    Encode(String),

    /// An ICC profile could not be parsed or applied
    #[error("color transform failed: {0}")]
    ColorTransform(String),
}

impl From<image::ImageError> for CodecError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Unsupported(e) => Self::Unsupported(e.to_string()),
            other => Self::Decode(other.to_string()),
        }
    }
}

impl From<lcms2::Error> for CodecError {
    fn from(err: lcms2::Error) -> Self {
        Self::ColorTransform(err.to_string())
    }
}

impl From<jpeg_encoder::EncodingError> for CodecError {
    fn from(err: jpeg_encoder::EncodingError) -> Self {
        Self::Encode(err.to_string())
    }
}

/// Per-item conversion failures, caught at the worker boundary
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Reading or decoding the source failed
    #[error("decode error: {0}")]
    Decode(String),

    /// Encoding or writing the destination failed
    #[error("encode error: {0}")]
    Encode(String),

    /// The destination was missing or empty after encoding
    #[error("empty or missing output: {}", path.display())]
    Verification {
        /// Destination that failed verification
        path: PathBuf,
    },

    /// The source could not be removed after a verified conversion
    #[error("could not delete source: {0}")]
    SourceDelete(#[source] std::io::Error),
}

/// Fatal errors that stop a run before any conversion happens
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No root could be read
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// The worker pool could not be started
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
