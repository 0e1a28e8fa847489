//! Handwriting feature extraction and scoring.
//!
//! An image is binarised once by [`ImagePreprocessor`]; the result feeds the
//! script-specific extractor, whose features are mapped to 0 - 100 scores by
//! the [`scoring`] functions.

mod devanagari;
mod glyphs;
mod latin;
mod preprocess;
pub mod scoring;

pub use devanagari::{DevanagariExtractor, DevanagariFeatures};
pub use glyphs::{glyph_boxes, GlyphBox};
pub use latin::{HoughLine, LatinExtractor, LatinFeatures};
pub use preprocess::{ImagePreprocessor, Preprocessed};
pub use scoring::{assess, Assessment, WEAK_THRESHOLD};

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, GrayImage};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::AnalysisError;
use crate::models::Language;

/// Trait for feature extractors working on a preprocessed image.
pub trait FeatureExtractor {
    /// The measurements this extractor produces.
    type Output;

    /// Measure the preprocessed image.
    fn extract(&self, input: &Preprocessed) -> Self::Output;
}

/// Script-specific raw measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "language", rename_all = "lowercase")]
pub enum Features {
    English(LatinFeatures),
    Devanagari(DevanagariFeatures),
}

impl Features {
    pub fn language(&self) -> Language {
        match self {
            Features::English(_) => Language::English,
            Features::Devanagari(_) => Language::Devanagari,
        }
    }

    /// Named measurements in display order.
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        match self {
            Features::English(f) => vec![
                ("slant_angle", f.slant_angle),
                ("stroke_thickness", f.stroke_thickness),
                ("avg_letter_height", f.avg_letter_height),
                ("avg_spacing", f.avg_spacing),
            ],
            Features::Devanagari(f) => vec![
                ("shirorekha_strength", f.shirorekha_strength),
                ("matra_score", f.matra_score),
                ("height_variation", f.height_variation),
            ],
        }
    }
}

/// Result of analysing one image.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub language: Language,
    pub features: Features,
    #[serde(flatten)]
    pub assessment: Assessment,
    pub processing_time_ms: u64,
    /// The binarised image the features were measured on.
    #[serde(skip)]
    pub processed: GrayImage,
}

/// Runs preprocessing, extraction and scoring for one image.
pub struct Analyzer {
    preprocessor: ImagePreprocessor,
    latin: LatinExtractor,
    devanagari: DevanagariExtractor,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            preprocessor: ImagePreprocessor::new(),
            latin: LatinExtractor::new(),
            devanagari: DevanagariExtractor::new(),
        }
    }

    /// Extract the features of the requested script.
    pub fn features(&self, input: &Preprocessed, language: Language) -> Features {
        match language {
            Language::English => Features::English(self.latin.extract(input)),
            Language::Devanagari => Features::Devanagari(self.devanagari.extract(input)),
        }
    }

    /// Analyse a decoded image.
    pub fn analyze(&self, image: &DynamicImage, language: Language) -> Analysis {
        let start = Instant::now();

        let input = self.preprocessor.preprocess(image);
        let features = self.features(&input, language);
        let assessment = assess(&features);

        let processing_time_ms = start.elapsed().as_millis() as u64;
        debug!(
            "Scored {} sample: overall {} in {}ms",
            language, assessment.overall, processing_time_ms
        );

        Analysis {
            language,
            features,
            assessment,
            processing_time_ms,
            processed: input.binary,
        }
    }

    /// Decode `input`, analyse it and write the binarised image to `processed_out`.
    pub fn analyze_file(
        &self,
        input: &Path,
        processed_out: &Path,
        language: Language,
    ) -> Result<Analysis, AnalysisError> {
        info!("Analysing {} as {}", input.display(), language);

        let image = image::open(input).map_err(AnalysisError::Decode)?;
        let analysis = self.analyze(&image, language);

        analysis
            .processed
            .save(processed_out)
            .map_err(AnalysisError::WriteProcessed)?;
        debug!("Wrote processed image to {}", processed_out.display());

        Ok(analysis)
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Criterion;
    use image::{Rgb, RgbImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn sample_page() -> RgbImage {
        let mut page = RgbImage::from_pixel(200, 120, Rgb([245, 245, 240]));
        for x in [20, 50, 80, 110] {
            draw_filled_rect_mut(&mut page, Rect::at(x, 40).of_size(8, 40), Rgb([20, 20, 30]));
        }
        page
    }

    #[test]
    fn test_analyze_latin_page() {
        let page = DynamicImage::ImageRgb8(sample_page());
        let analysis = Analyzer::new().analyze(&page, Language::English);

        assert_eq!(analysis.language, Language::English);
        assert!(matches!(analysis.features, Features::English(_)));
        assert_eq!(analysis.processed.dimensions(), (200, 120));
        for (_, value) in analysis.assessment.scores.entries() {
            assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn test_blank_devanagari_page_is_all_weak() {
        let page = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Rgb([255, 255, 255])));
        let analysis = Analyzer::new().analyze(&page, Language::Devanagari);

        // no head line and no matras, perfectly uniform (no glyphs)
        assert_eq!(
            analysis.assessment.weak_areas,
            vec![Criterion::Shirorekha, Criterion::Matra]
        );
        assert_eq!(analysis.assessment.overall, round(100.0 / 3.0));
    }

    fn round(v: f64) -> f64 {
        scoring::round1(v)
    }

    #[test]
    fn test_analyze_file_writes_processed_image() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("sample.png");
        let output = dir.path().join("processed_sample.png");
        sample_page().save(&input).unwrap();

        let analysis = Analyzer::new()
            .analyze_file(&input, &output, Language::English)
            .unwrap();

        assert!(output.exists());
        let written = image::open(&output).unwrap();
        assert_eq!((written.width(), written.height()), analysis.processed.dimensions());
    }

    #[test]
    fn test_analyze_file_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.png");
        std::fs::write(&input, b"not an image").unwrap();

        let output = dir.path().join("out.png");
        let result = Analyzer::new().analyze_file(&input, &output, Language::English);
        assert!(matches!(result, Err(AnalysisError::Decode(_))));
    }

    #[test]
    fn test_feature_entries() {
        let features = Features::Devanagari(DevanagariFeatures::default());
        let names: Vec<_> = features.entries().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["shirorekha_strength", "matra_score", "height_variation"]);
    }
}
