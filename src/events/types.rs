//! Event type definitions for progress reporting.

use crate::core::classify::Category;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// All events emitted by the triage pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Per-record analysis phase events
    Analyze(AnalyzeEvent),
    /// Burst clustering phase events
    Cluster(ClusterEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during the per-record analysis phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AnalyzeEvent {
    /// Analysis has started
    Started { total_records: usize },
    /// Progress update during analysis
    Progress(AnalyzeProgress),
    /// A record received its classification
    RecordClassified { id: Uuid, category: Category },
    /// A record degraded (decode failure) but the batch continues
    Degraded { id: Uuid, message: String },
    /// Analysis completed
    Completed {
        total_classified: usize,
        decode_failures: usize,
    },
}

/// Progress information during analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeProgress {
    /// Number of records analyzed so far
    pub completed: usize,
    /// Total number of records in the batch
    pub total: usize,
    /// Filename of the record just analyzed
    pub current: String,
}

/// Events during the clustering phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClusterEvent {
    /// Clustering has started
    Started { candidates: usize },
    /// Clustering completed
    Completed {
        groups: usize,
        grouped_records: usize,
    },
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed { summary: TriageSummary },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Analyzing,
    Clustering,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Analyzing => write!(f, "Analyzing"),
            PipelinePhase::Clustering => write!(f, "Clustering"),
        }
    }
}

/// Summary of pipeline results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageSummary {
    /// Total records processed
    pub total_records: usize,
    /// Records recommended to keep
    pub kept: usize,
    /// Records recommended to discard
    pub discarded: usize,
    /// Records the engine withheld judgement on
    pub unsure: usize,
    /// Burst groups found
    pub duplicate_groups: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}
