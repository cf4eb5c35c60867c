//! # Pipeline Module
//!
//! Orchestrates a full triage batch.
//!
//! ## Stages
//! 1. **Analyze** - decode, score, hash, and classify every record;
//!    pure per-record work, parallel within bounded batches
//! 2. **Cluster** - one sequential pass over the surviving hashes
//!
//! ## Parallelism
//! rayon fans the analyze stage out; the batch size caps how many pixel
//! buffers are resident at once. Clustering needs every hash in hand and
//! its visited set is per-call mutable state, so it runs single-threaded
//! after the parallel stage completes.

mod executor;

pub use executor::{Pipeline, PipelineBuilder, RecordOutcome, TriageConfig, TriageReport};
