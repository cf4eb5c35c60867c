//! # Classify Module
//!
//! Cheap-first categorical triage. Filename and file-size rules run
//! without touching pixels; visual rules only apply once a decode is in
//! hand. The ladder is evaluated in precedence order and the first
//! matching rule wins.

use crate::core::quality::ImageFeatures;
use crate::core::record::{MediaKind, MediaRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Triage category for a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Keep,
    Discard,
    Unsure,
    /// Caller-side initial state; the engine never emits it
    Pending,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Keep => write!(f, "Keep"),
            Category::Discard => write!(f, "Discard"),
            Category::Unsure => write!(f, "Unsure"),
            Category::Pending => write!(f, "Pending"),
        }
    }
}

/// Outcome of classifying one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: Category,
    /// 0-100
    pub confidence: u8,
    pub reason: String,
    pub tags: Vec<String>,
}

impl ClassificationResult {
    fn new(category: Category, confidence: u8, reason: &str) -> Self {
        Self {
            category,
            confidence,
            reason: reason.to_string(),
            tags: Vec::new(),
        }
    }

    fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }
}

/// Tunable thresholds for the decision ladder
#[derive(Debug, Clone)]
pub struct Classifier {
    /// Files smaller than this read as thumbnails or low-res exports
    pub min_size_bytes: u64,
    /// Aspect ratios outside [min, max] read as panoramas/strips
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
    /// Raw edge-energy floor below which a frame reads as blurry
    pub blur_threshold: f64,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            min_size_bytes: 150 * 1024,
            min_aspect_ratio: 0.48,
            max_aspect_ratio: 2.2,
            blur_threshold: 2.5,
        }
    }
}

impl Classifier {
    /// Run the decision ladder for a record.
    ///
    /// `features` is `None` when the record's pixels could not be decoded;
    /// metadata rules still apply, and the visual rules resolve to Unsure
    /// instead of failing the batch.
    pub fn classify(
        &self,
        record: &MediaRecord,
        features: Option<&ImageFeatures>,
    ) -> ClassificationResult {
        match record.kind {
            MediaKind::Video => self.classify_video(&record.filename),
            MediaKind::Image => self.classify_image(&record.filename, record.size_bytes, features),
        }
    }

    fn classify_image(
        &self,
        filename: &str,
        size_bytes: u64,
        features: Option<&ImageFeatures>,
    ) -> ClassificationResult {
        let lower = filename.to_lowercase();
        if lower.contains("screenshot") || lower.contains("screen_recording") {
            return ClassificationResult::new(Category::Discard, 98, "Filename indicates a screenshot")
                .with_tag("Screenshot");
        }

        if size_bytes < self.min_size_bytes {
            return ClassificationResult::new(Category::Discard, 85, "Low resolution (small file size)");
        }

        // The remaining rules need pixels
        let Some(features) = features else {
            return Self::analysis_failed();
        };

        let aspect = features.aspect_ratio();
        if aspect < self.min_aspect_ratio || aspect > self.max_aspect_ratio {
            return ClassificationResult::new(Category::Discard, 80, "Unusual aspect ratio");
        }

        if features.raw_sharpness < self.blur_threshold {
            return ClassificationResult::new(Category::Discard, 75, "Image appears blurry");
        }

        ClassificationResult::new(Category::Keep, 65, "Standard image resolution")
    }

    /// Videos are judged on filename alone; their frames are never decoded.
    fn classify_video(&self, filename: &str) -> ClassificationResult {
        if filename.to_lowercase().contains("screen") {
            ClassificationResult::new(Category::Discard, 85, "Screen Recording Detected")
                .with_tag("Screen Recording")
        } else {
            ClassificationResult::new(Category::Keep, 85, "Video content").with_tag("Video")
        }
    }

    /// The sole escape from the ladder: decode failed, judgement withheld.
    pub fn analysis_failed() -> ClassificationResult {
        ClassificationResult::new(Category::Unsure, 0, "Analysis failed").with_tag("Error")
    }
}
