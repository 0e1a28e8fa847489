//! Image preprocessing shared by every feature extractor.

use image::{DynamicImage, GenericImageView, GrayImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::filter::gaussian_blur_f32;
use tracing::debug;

use super::glyphs::{glyph_boxes, GlyphBox};

/// Sigma equivalent to a 5x5 Gaussian kernel with automatic sigma.
pub const DEFAULT_BLUR_SIGMA: f32 = 1.1;

/// Binarised image plus the glyph boxes found on it.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Single channel image, ink = 255, paper = 0.
    pub binary: GrayImage,
    /// Bounding boxes of the external contours of `binary`.
    pub glyphs: Vec<GlyphBox>,
}

impl Preprocessed {
    pub fn width(&self) -> u32 {
        self.binary.width()
    }

    pub fn height(&self) -> u32 {
        self.binary.height()
    }

    pub fn is_empty(&self) -> bool {
        self.binary.width() == 0 || self.binary.height() == 0
    }
}

/// Grayscale, blur, inverted Otsu threshold.
pub struct ImagePreprocessor {
    blur_sigma: f32,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self {
            blur_sigma: DEFAULT_BLUR_SIGMA,
        }
    }

    /// Binarise an image and trace its glyphs.
    pub fn preprocess(&self, image: &DynamicImage) -> Preprocessed {
        let (width, height) = image.dimensions();
        debug!("Preprocessing {}x{} image", width, height);

        let binary = self.binarize(&image.to_luma8());
        let glyphs = if binary.width() == 0 || binary.height() == 0 {
            Vec::new()
        } else {
            glyph_boxes(&binary)
        };

        debug!("Found {} glyph boxes", glyphs.len());

        Preprocessed { binary, glyphs }
    }

    /// Binarise a grayscale image so that ink pixels become foreground.
    ///
    /// Empty and uniform images have no ink and come back all zero.
    pub fn binarize(&self, gray: &GrayImage) -> GrayImage {
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return GrayImage::new(width, height);
        }

        let blurred = gaussian_blur_f32(gray, self.blur_sigma);

        let (min, max) = intensity_range(&blurred);
        if min == max {
            debug!("Uniform image (level {}), nothing to binarise", min);
            return GrayImage::new(width, height);
        }

        let level = otsu_level(&blurred);
        debug!("Otsu level: {}", level);

        threshold(&blurred, level, ThresholdType::BinaryInverted)
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

fn intensity_range(image: &GrayImage) -> (u8, u8) {
    image
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])))
}
