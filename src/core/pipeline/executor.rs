//! Pipeline execution implementation.

use crate::core::cache::{AnalysisCache, ImageAnalysis, InMemoryCache};
use crate::core::classify::{Category, ClassificationResult, Classifier};
use crate::core::cluster::{BurstCandidate, BurstClusterer, ClusterConfig, DuplicateGroup};
use crate::core::decode::{FastPixelSource, PixelSource};
use crate::core::hasher::{compute_dhash, DHash};
use crate::core::quality::{QualityAnalyzer, QualityScore};
use crate::core::record::{MediaKind, MediaRecord};
use crate::error::TriageError;
use crate::events::{
    null_sender, AnalyzeEvent, AnalyzeProgress, ClusterEvent, Event, EventSender, PipelineEvent,
    PipelinePhase, TriageSummary,
};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// Tunables for a triage run
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Width pixel buffers are downsampled to before measurement
    pub analysis_width: u32,
    /// Records decoded concurrently per batch; caps resident buffers
    pub batch_size: usize,
    pub cluster: ClusterConfig,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            analysis_width: 320,
            batch_size: 64,
            cluster: ClusterConfig::default(),
        }
    }
}

/// Builder for the triage pipeline
pub struct PipelineBuilder {
    config: TriageConfig,
    classifier: Classifier,
    source: Option<Box<dyn PixelSource>>,
    cache: Option<Box<dyn AnalysisCache>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: TriageConfig::default(),
            classifier: Classifier::default(),
            source: None,
            cache: None,
        }
    }

    /// Set the analysis downsampling width
    pub fn analysis_width(mut self, width: u32) -> Self {
        self.config.analysis_width = width;
        self
    }

    /// Set how many records are decoded concurrently
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size.max(1);
        self
    }

    /// Set the clustering window
    pub fn window(mut self, window: usize) -> Self {
        self.config.cluster.window = window;
        self
    }

    /// Set the near-duplicate Hamming threshold
    pub fn max_distance(mut self, distance: u32) -> Self {
        self.config.cluster.max_distance = distance;
        self
    }

    /// Replace the classification thresholds
    pub fn classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Inject a pixel source (GUI hosts route their own decoder here)
    pub fn pixel_source(mut self, source: Box<dyn PixelSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Inject an analysis cache
    pub fn cache(mut self, cache: Box<dyn AnalysisCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            config: self.config,
            classifier: self.classifier,
            analyzer: QualityAnalyzer::default(),
            source: self.source.unwrap_or_else(|| Box::new(FastPixelSource)),
            cache: self.cache.unwrap_or_else(|| Box::new(InMemoryCache::new())),
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the engine produced for one record
#[derive(Debug, Clone, Serialize)]
pub struct RecordOutcome {
    pub id: Uuid,
    pub kind: MediaKind,
    pub filename: String,
    pub classification: ClassificationResult,
    /// Present for images (zero-valued when the decode failed); absent for videos
    pub quality: Option<QualityScore>,
    pub hash: Option<DHash>,
}

/// Result of a full triage run
#[derive(Debug, Serialize)]
pub struct TriageReport {
    /// One outcome per input record, in input order
    pub outcomes: Vec<RecordOutcome>,
    pub groups: Vec<DuplicateGroup>,
    pub total_records: usize,
    /// Image records whose pixels never materialized
    pub decode_failures: usize,
    pub duration_ms: u64,
}

impl TriageReport {
    pub fn count(&self, category: Category) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.classification.category == category)
            .count()
    }
}

/// The triage pipeline
pub struct Pipeline {
    config: TriageConfig,
    classifier: Classifier,
    analyzer: QualityAnalyzer,
    source: Box<dyn PixelSource>,
    cache: Box<dyn AnalysisCache>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Run the pipeline without events
    pub fn run(&self, records: &[MediaRecord]) -> TriageReport {
        self.run_with_events(records, &null_sender())
    }

    /// Run the pipeline with event reporting
    pub fn run_with_events(&self, records: &[MediaRecord], events: &EventSender) -> TriageReport {
        let start = Instant::now();

        events.send(Event::Pipeline(PipelineEvent::Started));
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Analyzing,
        }));
        events.send(Event::Analyze(AnalyzeEvent::Started {
            total_records: records.len(),
        }));

        let completed = AtomicUsize::new(0);
        let mut outcomes: Vec<RecordOutcome> = Vec::with_capacity(records.len());

        // Bounded batches keep at most `batch_size` pixel buffers alive
        for batch in records.chunks(self.config.batch_size) {
            let batch_outcomes: Vec<RecordOutcome> = batch
                .par_iter()
                .map(|record| {
                    let outcome = self.analyze_record(record, events);
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;

                    events.send(Event::Analyze(AnalyzeEvent::Progress(AnalyzeProgress {
                        completed: done,
                        total: records.len(),
                        current: record.filename.clone(),
                    })));
                    events.send(Event::Analyze(AnalyzeEvent::RecordClassified {
                        id: record.id,
                        category: outcome.classification.category,
                    }));

                    outcome
                })
                .collect();
            outcomes.extend(batch_outcomes);
        }

        let decode_failures = records
            .iter()
            .zip(&outcomes)
            .filter(|(r, o)| r.kind == MediaKind::Image && o.hash.is_none())
            .count();

        events.send(Event::Analyze(AnalyzeEvent::Completed {
            total_classified: outcomes.len(),
            decode_failures,
        }));

        // Clustering needs every hash in hand; strictly sequential
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Clustering,
        }));

        let candidates = burst_candidates(records, &outcomes);
        events.send(Event::Cluster(ClusterEvent::Started {
            candidates: candidates.len(),
        }));

        let groups = BurstClusterer::new(self.config.cluster).cluster(&candidates);

        events.send(Event::Cluster(ClusterEvent::Completed {
            groups: groups.len(),
            grouped_records: groups.iter().map(|g| g.members.len()).sum(),
        }));

        let duration_ms = start.elapsed().as_millis() as u64;
        let report = TriageReport {
            outcomes,
            groups,
            total_records: records.len(),
            decode_failures,
            duration_ms,
        };

        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: TriageSummary {
                total_records: report.total_records,
                kept: report.count(Category::Keep),
                discarded: report.count(Category::Discard),
                unsure: report.count(Category::Unsure),
                duplicate_groups: report.groups.len(),
                duration_ms,
            },
        }));

        report
    }

    /// Cluster near-duplicates across `records` directly.
    ///
    /// Callers pass the non-Discard subset. Hashes and qualities are
    /// computed lazily through the cache for records that were never
    /// analyzed; records that fail to decode are skipped.
    pub fn find_duplicates(&self, records: &[MediaRecord]) -> Vec<DuplicateGroup> {
        let candidates: Vec<BurstCandidate> = records
            .iter()
            .filter(|r| r.kind == MediaKind::Image)
            .filter_map(|record| match self.image_analysis(record) {
                Ok(analysis) => Some(BurstCandidate {
                    id: record.id,
                    timestamp: record.timestamp,
                    hash: analysis.hash,
                    total: analysis.quality.total,
                }),
                Err(error) => {
                    debug!(filename = %record.filename, %error, "record skipped from clustering");
                    None
                }
            })
            .collect();

        BurstClusterer::new(self.config.cluster).cluster(&candidates)
    }

    /// Classify one record, decoding if it is an image.
    ///
    /// Decode failures degrade to an Unsure classification; they are
    /// reported as events, never as errors.
    fn analyze_record(&self, record: &MediaRecord, events: &EventSender) -> RecordOutcome {
        match record.kind {
            // Videos are judged on metadata alone
            MediaKind::Video => RecordOutcome {
                id: record.id,
                kind: record.kind,
                filename: record.filename.clone(),
                classification: self.classifier.classify(record, None),
                quality: None,
                hash: None,
            },
            MediaKind::Image => match self.image_analysis(record) {
                Ok(analysis) => RecordOutcome {
                    id: record.id,
                    kind: record.kind,
                    filename: record.filename.clone(),
                    classification: self.classifier.classify(record, Some(&analysis.features)),
                    quality: Some(analysis.quality),
                    hash: Some(analysis.hash),
                },
                Err(error) => {
                    warn!(filename = %record.filename, %error, "analysis degraded");
                    events.send(Event::Analyze(AnalyzeEvent::Degraded {
                        id: record.id,
                        message: error.to_string(),
                    }));
                    RecordOutcome {
                        id: record.id,
                        kind: record.kind,
                        filename: record.filename.clone(),
                        // Metadata rules still apply; visual rules resolve to Unsure
                        classification: self.classifier.classify(record, None),
                        quality: Some(QualityScore::zero()),
                        hash: None,
                    }
                }
            },
        }
    }

    /// Fetch or lazily compute the quality score and hash for one image
    /// record, through the cache.
    ///
    /// Unlike classification, errors surface here: callers re-running a
    /// single record after fixing its content want to see the failure.
    pub fn image_analysis(&self, record: &MediaRecord) -> Result<ImageAnalysis, TriageError> {
        if let Some(analysis) = self.cache.get(record.id) {
            debug!(filename = %record.filename, "analysis cache hit");
            return Ok(analysis);
        }

        let bytes = record.content.load()?;
        let buffer = self
            .source
            .decode(&bytes, Some(self.config.analysis_width))?;
        drop(bytes);

        let features = self.analyzer.features(&buffer);
        let quality = QualityScore::from_features(&features);
        let hash = compute_dhash(&buffer)?;

        let analysis = ImageAnalysis {
            hash,
            features,
            quality,
        };
        self.cache.insert(record.id, analysis.clone());
        Ok(analysis)
    }
}

/// Pair records with their outcomes and keep what clustering can use:
/// images, not recommended for discard, with a hash and a quality.
fn burst_candidates(records: &[MediaRecord], outcomes: &[RecordOutcome]) -> Vec<BurstCandidate> {
    records
        .iter()
        .zip(outcomes)
        .filter(|(record, outcome)| {
            record.kind == MediaKind::Image
                && outcome.classification.category != Category::Discard
        })
        .filter_map(|(record, outcome)| {
            Some(BurstCandidate {
                id: record.id,
                timestamp: record.timestamp,
                hash: outcome.hash?,
                total: outcome.quality.as_ref()?.total,
            })
        })
        .collect()
}
