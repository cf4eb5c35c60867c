//! Media records: the unit of triage.
//!
//! A record is identity plus cheap metadata plus a handle to its bytes.
//! The caller owns the content; the engine borrows it for the duration
//! of a single call and caches everything it derives elsewhere, keyed by
//! record id.

use crate::error::IngestError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Kind of media a record points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
}

/// Byte content of a record.
///
/// The `Path` variant defers reading until a decode actually needs the
/// bytes, which keeps batch memory bounded; `Bytes` suits callers that
/// already hold the content (GUI hosts, tests).
#[derive(Debug, Clone)]
pub enum MediaContent {
    Bytes(Arc<[u8]>),
    Path(PathBuf),
}

impl MediaContent {
    /// Borrow or read the raw bytes.
    pub fn load(&self) -> Result<Cow<'_, [u8]>, IngestError> {
        match self {
            MediaContent::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
            MediaContent::Path(path) => {
                std::fs::read(path)
                    .map(Cow::Owned)
                    .map_err(|source| match source.kind() {
                        std::io::ErrorKind::NotFound => IngestError::FileNotFound {
                            path: path.clone(),
                        },
                        _ => IngestError::ReadFailed {
                            path: path.clone(),
                            source,
                        },
                    })
            }
        }
    }
}

/// A single photo or video handed to the engine.
///
/// Identity and metadata are immutable for the record's lifetime within
/// the engine.
#[derive(Debug, Clone)]
pub struct MediaRecord {
    pub id: Uuid,
    pub kind: MediaKind,
    /// Base filename, used by the metadata classification rules.
    pub filename: String,
    pub size_bytes: u64,
    /// Capture time when known, otherwise last-modified time.
    pub timestamp: DateTime<Utc>,
    pub content: MediaContent,
}

impl MediaRecord {
    pub fn new(
        kind: MediaKind,
        filename: impl Into<String>,
        size_bytes: u64,
        timestamp: DateTime<Utc>,
        content: MediaContent,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            filename: filename.into(),
            size_bytes,
            timestamp,
            content,
        }
    }
}
