//! # Cache Module
//!
//! Explicit per-record analysis cache.
//!
//! The engine never mutates caller records in place; everything it
//! derives from pixels lands here, keyed by record id, so repeat runs
//! and lazy duplicate scans skip the decode. Entries are all-or-nothing:
//! a record either has a complete analysis or none.

use crate::core::hasher::DHash;
use crate::core::quality::{ImageFeatures, QualityScore};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Everything the engine derives from one record's pixels
#[derive(Debug, Clone)]
pub struct ImageAnalysis {
    pub hash: DHash,
    pub features: ImageFeatures,
    pub quality: QualityScore,
}

/// Storage interface for computed analyses
pub trait AnalysisCache: Send + Sync {
    fn get(&self, id: Uuid) -> Option<ImageAnalysis>;
    fn insert(&self, id: Uuid, analysis: ImageAnalysis);
}

/// Process-local cache; state lives only as long as its owner
#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<Uuid, ImageAnalysis>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AnalysisCache for InMemoryCache {
    fn get(&self, id: Uuid) -> Option<ImageAnalysis> {
        self.entries.read().ok()?.get(&id).cloned()
    }

    fn insert(&self, id: Uuid, analysis: ImageAnalysis) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(id, analysis);
        }
    }
}
