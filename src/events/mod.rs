//! # Events Module
//!
//! Event-driven progress reporting for the triage pipeline.
//!
//! The engine streams progress over a channel instead of calling back
//! into a UI; any front-end (CLI progress bar, GUI, nothing at all) can
//! subscribe. Dropped receivers discard events silently.

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::{
    AnalyzeEvent, AnalyzeProgress, ClusterEvent, Event, PipelineEvent, PipelinePhase,
    TriageSummary,
};
