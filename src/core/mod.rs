//! # Core Module
//!
//! The GUI-agnostic triage engine.
//!
//! ## Modules
//! - `record` - media records handed in by the caller
//! - `decode` - injected pixel-source capability + default decoder
//! - `quality` - sharpness/exposure/resolution scoring
//! - `hasher` - 64-bit difference hashes
//! - `classify` - Keep/Discard/Unsure decision ladder
//! - `cluster` - greedy windowed burst grouping
//! - `cache` - per-record analysis cache
//! - `pipeline` - orchestrates the full workflow

pub mod cache;
pub mod classify;
pub mod cluster;
pub mod decode;
pub mod hasher;
pub mod pipeline;
pub mod quality;
pub mod record;

// Re-export commonly used types
pub use cache::{AnalysisCache, ImageAnalysis, InMemoryCache};
pub use classify::{Category, ClassificationResult, Classifier};
pub use cluster::{BurstCandidate, BurstClusterer, ClusterConfig, DuplicateGroup};
pub use decode::{FastPixelSource, PixelBuffer, PixelSource};
pub use hasher::{compute_dhash, DHash};
pub use pipeline::{Pipeline, PipelineBuilder, RecordOutcome, TriageConfig, TriageReport};
pub use quality::{ImageFeatures, QualityAnalyzer, QualityScore};
pub use record::{MediaContent, MediaKind, MediaRecord};
