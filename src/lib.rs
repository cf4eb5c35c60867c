//! # Photo Triage
//!
//! An on-device triage engine for photo libraries: score every shot,
//! separate the obvious discards from the keepers, and collapse bursts
//! of near-identical frames down to their best frame.
//!
//! ## Core Philosophy
//! - **Never delete** - the engine only recommends; callers act
//! - **Degrade, don't abort** - one corrupt file never sinks a batch
//! - **GUI-agnostic** - pixel decoding is injected, progress is streamed
//!
//! ## Architecture
//! The library is split into a core engine (GUI-agnostic) and presentation layers:
//! - `core` - quality scoring, perceptual hashing, classification, burst clustering
//! - `events` - event-driven progress reporting (GUI-ready)
//! - `error` - typed error taxonomy
//! - `cli` - command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{Result, TriageError};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
