//! # Quality Module
//!
//! Scores how worth keeping a frame is: sharpness, exposure, and
//! resolution, each normalized to [0, 1], plus a weighted total.
//!
//! Sharpness is an edge-energy proxy (mean absolute difference between
//! stride-sampled neighbouring lumas), not a true Laplacian; natural
//! photos land roughly in the 2-15 raw range.

use crate::core::decode::PixelBuffer;
use serde::{Deserialize, Serialize};

/// Raw sharpness below the floor normalizes to 0; floor + range maps to 1.
const SHARPNESS_FLOOR: f64 = 2.0;
const SHARPNESS_RANGE: f64 = 6.0;

/// Megapixel normalization: 2 MP scores 0, 12 MP and up score 1.
const MEGAPIXEL_FLOOR: f64 = 2.0;
const MEGAPIXEL_RANGE: f64 = 10.0;

const WEIGHT_SHARPNESS: f64 = 0.6;
const WEIGHT_EXPOSURE: f64 = 0.2;
const WEIGHT_RESOLUTION: f64 = 0.2;

/// Decoded measurements that feed both scoring and classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageFeatures {
    /// Mean |Δluma| between consecutive stride-sampled pixels, raster order.
    pub raw_sharpness: f64,
    /// 1.0 at a mid-gray average, 0.0 at pure black/white averages.
    pub exposure: f64,
    /// Analysis buffer dimensions
    pub width: u32,
    pub height: u32,
    /// Dimensions of the frame before downsampling
    pub source_width: u32,
    pub source_height: u32,
}

impl ImageFeatures {
    pub fn aspect_ratio(&self) -> f64 {
        self.source_width as f64 / self.source_height as f64
    }

    pub fn megapixels(&self) -> f64 {
        self.source_width as f64 * self.source_height as f64 / 1_000_000.0
    }
}

/// Normalized quality of a single image record.
///
/// Either fully computed from a decoded buffer or the all-zero degrade
/// value; never partially valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub sharpness: f64,
    pub exposure: f64,
    pub resolution: f64,
    /// Weighted combination, also in [0, 1]
    pub total: f64,
    pub tags: Vec<String>,
}

impl QualityScore {
    /// The degrade value for records whose pixels never materialized.
    pub fn zero() -> Self {
        Self {
            sharpness: 0.0,
            exposure: 0.0,
            resolution: 0.0,
            total: 0.0,
            tags: Vec::new(),
        }
    }

    pub fn from_features(features: &ImageFeatures) -> Self {
        let sharpness = clamp01((features.raw_sharpness - SHARPNESS_FLOOR) / SHARPNESS_RANGE);
        let exposure = features.exposure;
        let megapixels = features.megapixels();
        let resolution = clamp01((megapixels - MEGAPIXEL_FLOOR) / MEGAPIXEL_RANGE);
        let total = WEIGHT_SHARPNESS * sharpness
            + WEIGHT_EXPOSURE * exposure
            + WEIGHT_RESOLUTION * resolution;

        let mut tags = Vec::new();
        if sharpness > 0.7 {
            tags.push("Very Sharp".to_string());
        }
        if sharpness < 0.3 {
            tags.push("Blurry".to_string());
        }
        if exposure > 0.8 {
            tags.push("Good Exposure".to_string());
        }
        if exposure < 0.4 {
            tags.push("Poor Exposure".to_string());
        }
        tags.push(format!("{:.1}MP", megapixels));

        Self {
            sharpness,
            exposure,
            resolution,
            total,
            tags,
        }
    }
}

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Extracts sharpness and exposure from analysis-resolution buffers.
#[derive(Debug, Clone)]
pub struct QualityAnalyzer {
    /// Sampling stride for the sharpness estimate; every pixel would be
    /// accurate but slow, and the estimate stabilizes well before that.
    stride: usize,
}

impl Default for QualityAnalyzer {
    fn default() -> Self {
        Self { stride: 4 }
    }
}

impl QualityAnalyzer {
    pub fn new(stride: usize) -> Self {
        Self {
            stride: stride.max(1),
        }
    }

    /// Measure a decoded buffer. Pure; safe to run concurrently across records.
    pub fn features(&self, buffer: &PixelBuffer) -> ImageFeatures {
        ImageFeatures {
            raw_sharpness: self.edge_energy(buffer),
            exposure: Self::exposure(buffer),
            width: buffer.width(),
            height: buffer.height(),
            source_width: buffer.source_width(),
            source_height: buffer.source_height(),
        }
    }

    /// Features folded straight into a score.
    pub fn score(&self, buffer: &PixelBuffer) -> QualityScore {
        QualityScore::from_features(&self.features(buffer))
    }

    /// Mean absolute luma difference between consecutive sampled pixels
    /// in raster order, luma = (R + G + B) / 3.
    fn edge_energy(&self, buffer: &PixelBuffer) -> f64 {
        let mut previous: Option<f64> = None;
        let mut sum = 0.0;
        let mut pairs = 0usize;

        for pixel in buffer.pixels().chunks_exact(4).step_by(self.stride) {
            let luma = (pixel[0] as f64 + pixel[1] as f64 + pixel[2] as f64) / 3.0;
            if let Some(prev) = previous {
                sum += (luma - prev).abs();
                pairs += 1;
            }
            previous = Some(luma);
        }

        if pairs == 0 {
            0.0
        } else {
            sum / pairs as f64
        }
    }

    /// Average BT.601 luma folded into distance from mid-gray.
    fn exposure(buffer: &PixelBuffer) -> f64 {
        let pixels = buffer.pixels();
        let count = (pixels.len() / 4) as f64;
        if count == 0.0 {
            return 0.0;
        }

        let sum: f64 = pixels
            .chunks_exact(4)
            .map(|p| 0.299 * p[0] as f64 + 0.587 * p[1] as f64 + 0.114 * p[2] as f64)
            .sum();
        let average = sum / count;

        (1.0 - (128.0 - average).abs() / 128.0).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_buffer(width: u32, height: u32, value: u8) -> PixelBuffer {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&[value, value, value, 255]);
        }
        PixelBuffer::from_rgba(width, height, pixels).unwrap()
    }

    fn noise_buffer(width: u32, height: u32) -> PixelBuffer {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((x.wrapping_mul(31) + y.wrapping_mul(17)) % 256) as u8;
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        PixelBuffer::from_rgba(width, height, pixels).unwrap()
    }

    fn features(raw_sharpness: f64, exposure: f64, source_width: u32, source_height: u32) -> ImageFeatures {
        ImageFeatures {
            raw_sharpness,
            exposure,
            width: 320,
            height: 240,
            source_width,
            source_height,
        }
    }

    #[test]
    fn flat_image_has_zero_sharpness() {
        let analyzer = QualityAnalyzer::default();
        let measured = analyzer.features(&solid_buffer(64, 64, 128));
        assert_eq!(measured.raw_sharpness, 0.0);
    }

    #[test]
    fn noisy_image_is_sharper_than_flat() {
        let analyzer = QualityAnalyzer::default();
        let flat = analyzer.features(&solid_buffer(64, 64, 128));
        let noisy = analyzer.features(&noise_buffer(64, 64));
        assert!(noisy.raw_sharpness > flat.raw_sharpness);
        assert!(noisy.raw_sharpness > 2.5);
    }

    #[test]
    fn mid_gray_has_perfect_exposure() {
        let analyzer = QualityAnalyzer::default();
        let measured = analyzer.features(&solid_buffer(16, 16, 128));
        assert!((measured.exposure - 1.0).abs() < 1e-9);
    }

    #[test]
    fn black_image_has_zero_exposure() {
        let analyzer = QualityAnalyzer::default();
        let measured = analyzer.features(&solid_buffer(16, 16, 0));
        assert!(measured.exposure < 1e-9);
    }

    #[test]
    fn components_stay_in_unit_range() {
        let analyzer = QualityAnalyzer::default();
        for buffer in [
            solid_buffer(32, 32, 0),
            solid_buffer(32, 32, 255),
            noise_buffer(32, 32),
        ] {
            let score = analyzer.score(&buffer);
            for component in [score.sharpness, score.exposure, score.resolution, score.total] {
                assert!((0.0..=1.0).contains(&component), "out of range: {}", component);
            }
        }
    }

    #[test]
    fn sharp_well_exposed_frame_is_tagged() {
        let score = QualityScore::from_features(&features(10.0, 0.9, 4000, 3000));

        assert!(score.tags.contains(&"Very Sharp".to_string()));
        assert!(score.tags.contains(&"Good Exposure".to_string()));
        assert!(score.tags.contains(&"12.0MP".to_string()));
        assert!((score.sharpness - 1.0).abs() < 1e-9);
        assert!((score.resolution - 1.0).abs() < 1e-9);
        assert!((score.total - (0.6 + 0.2 * 0.9 + 0.2)).abs() < 1e-9);
    }

    #[test]
    fn soft_dark_frame_is_tagged() {
        let score = QualityScore::from_features(&features(2.0, 0.2, 1000, 800));

        assert!(score.tags.contains(&"Blurry".to_string()));
        assert!(score.tags.contains(&"Poor Exposure".to_string()));
        assert_eq!(score.sharpness, 0.0);
    }

    #[test]
    fn megapixel_tag_is_always_last() {
        let score = QualityScore::from_features(&features(5.0, 0.5, 640, 480));
        assert!(score.tags.last().unwrap().ends_with("MP"));
    }

    #[test]
    fn zero_score_has_no_tags() {
        let score = QualityScore::zero();
        assert_eq!(score.total, 0.0);
        assert!(score.tags.is_empty());
    }

    #[test]
    fn features_are_deterministic() {
        let analyzer = QualityAnalyzer::default();
        let buffer = noise_buffer(48, 48);
        assert_eq!(analyzer.features(&buffer), analyzer.features(&buffer));
    }
}
