//! # Error Module
//!
//! Error types for the triage engine.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Degrade locally** - a decode failure marks one record as Unsure,
//!   it never aborts the batch
//! - **Include context** - file names, byte counts, what went wrong

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors reading record content before decoding
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors decoding raw bytes into a pixel buffer.
///
/// These never travel past the record they belong to: scoring falls back
/// to the zero score and classification resolves to Unsure instead of
/// surfacing them to the batch.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Unsupported image format: {reason}")]
    UnsupportedFormat { reason: String },

    #[error("Failed to decode image: {reason}")]
    DecodeFailed { reason: String },

    #[error("Image is empty")]
    EmptyImage,

    #[error("Pixel buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferMismatch { expected: usize, actual: usize },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, TriageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_error_includes_path() {
        let error = IngestError::FileNotFound {
            path: PathBuf::from("/photos/vacation/IMG_0042.jpg"),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/vacation/IMG_0042.jpg"));
    }

    #[test]
    fn decode_error_includes_reason() {
        let error = DecodeError::DecodeFailed {
            reason: "invalid JPEG marker".to_string(),
        };
        assert!(error.to_string().contains("invalid JPEG marker"));
    }

    #[test]
    fn buffer_mismatch_reports_both_sizes() {
        let error = DecodeError::BufferMismatch {
            expected: 4096,
            actual: 1024,
        };
        let message = error.to_string();
        assert!(message.contains("4096"));
        assert!(message.contains("1024"));
    }

    #[test]
    fn decode_error_converts_to_top_level() {
        let error: TriageError = DecodeError::EmptyImage.into();
        assert!(matches!(error, TriageError::Decode(_)));
    }
}
