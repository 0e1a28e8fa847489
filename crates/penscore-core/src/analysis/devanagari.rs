//! Devanagari feature extraction.

use image::{GrayImage, Luma};
use imageproc::morphology::{grayscale_open, Mask};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::preprocess::Preprocessed;
use super::{mean, FeatureExtractor};

/// Raw measurements for a Devanagari sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DevanagariFeatures {
    /// Ink in the top rows relative to one solid row. Not clamped.
    pub shirorekha_strength: f64,
    /// Fraction of the page covered by tall vertical strokes.
    pub matra_score: f64,
    /// Population standard deviation of glyph heights.
    pub height_variation: f64,
}

/// Extracts head-line strength, matra density and height variation.
pub struct DevanagariExtractor {
    head_rows: u32,
    /// 3 wide, 20 tall, anchored at its centre.
    matra_mask: Mask,
    min_glyph_height: u32,
    min_glyphs: usize,
}

impl DevanagariExtractor {
    pub fn new() -> Self {
        Self {
            head_rows: 20,
            matra_mask: Mask::from_image(&GrayImage::from_pixel(3, 20, Luma([255])), 1, 10),
            min_glyph_height: 20,
            min_glyphs: 3,
        }
    }

    /// Sum of the top rows normalised by one fully inked row.
    pub fn shirorekha_strength(&self, input: &Preprocessed) -> f64 {
        let rows = self.head_rows.min(input.height());
        let mut sum = 0u64;
        for y in 0..rows {
            for x in 0..input.width() {
                sum += input.binary.get_pixel(x, y)[0] as u64;
            }
        }
        sum as f64 / (input.width() as f64 * 255.0)
    }

    /// Ink surviving a tall narrow opening, normalised by page area.
    pub fn matra_score(&self, input: &Preprocessed) -> f64 {
        let opened = grayscale_open(&input.binary, &self.matra_mask);
        let sum: u64 = opened.pixels().map(|p| p[0] as u64).sum();
        let area = input.width() as f64 * input.height() as f64;
        sum as f64 / (area * 255.0)
    }

    /// Standard deviation of tall glyph heights, 0 when too few glyphs.
    pub fn height_variation(&self, input: &Preprocessed) -> f64 {
        let heights: Vec<f64> = input
            .glyphs
            .iter()
            .filter(|g| g.height > self.min_glyph_height)
            .map(|g| g.height as f64)
            .collect();

        if heights.len() < self.min_glyphs {
            return 0.0;
        }

        population_std_dev(&heights)
    }
}

impl Default for DevanagariExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor for DevanagariExtractor {
    type Output = DevanagariFeatures;

    fn extract(&self, input: &Preprocessed) -> DevanagariFeatures {
        if input.is_empty() {
            return DevanagariFeatures::default();
        }

        let features = DevanagariFeatures {
            shirorekha_strength: self.shirorekha_strength(input),
            matra_score: self.matra_score(input),
            height_variation: self.height_variation(input),
        };

        debug!("Devanagari features: {:?}", features);
        features
    }
}

fn population_std_dev(values: &[f64]) -> f64 {
    let Some(avg) = mean(values) else {
        return 0.0;
    };
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
