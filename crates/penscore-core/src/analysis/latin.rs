//! Latin script feature extraction.

use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::morphology::dilate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::preprocess::Preprocessed;
use super::{mean, FeatureExtractor};

/// Raw measurements for a Latin-script sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatinFeatures {
    /// Mean Hough line angle minus 90 degrees.
    pub slant_angle: f64,
    /// Foreground fraction after one 3x3 dilation (0 - 1).
    pub stroke_thickness: f64,
    /// Mean glyph height in pixels.
    pub avg_letter_height: f64,
    /// Mean horizontal gap between glyph left edges in pixels.
    pub avg_spacing: f64,
}

/// A straight line in normal form with its accumulator vote count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughLine {
    /// Signed distance of the line from the origin.
    pub r: f64,
    /// Angle of the line normal, 0 - 179 degrees.
    pub angle_in_degrees: u32,
    pub votes: u32,
}

/// Extracts slant, stroke thickness, letter height and spacing.
pub struct LatinExtractor {
    canny_low: f32,
    canny_high: f32,
    vote_threshold: u32,
    max_lines: usize,
    min_letter_height: u32,
}

impl LatinExtractor {
    pub fn new() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            vote_threshold: 120,
            max_lines: 10,
            min_letter_height: 10,
        }
    }

    /// Hough lines of the edge map, strongest first.
    pub fn lines(&self, input: &Preprocessed) -> Vec<HoughLine> {
        let edges = canny(&input.binary, self.canny_low, self.canny_high);
        let lines = hough_lines(&edges, self.vote_threshold);
        debug!("Hough lines detected: {}", lines.len());
        lines
    }

    /// Mean deviation of the strongest lines from 90 degrees.
    ///
    /// Angles are those of the line normal, so the writing baseline and
    /// shirorekha-like horizontal strokes measure 0.
    pub fn slant_angle(&self, input: &Preprocessed) -> f64 {
        let angles: Vec<f64> = self
            .lines(input)
            .iter()
            .take(self.max_lines)
            .map(|line| line.angle_in_degrees as f64 - 90.0)
            .collect();

        mean(&angles).unwrap_or(0.0)
    }

    /// Foreground fraction of the binary image after one 3x3 dilation.
    pub fn stroke_thickness(&self, input: &Preprocessed) -> f64 {
        let dilated = dilate(&input.binary, Norm::LInf, 1);
        let area = (dilated.width() as f64) * (dilated.height() as f64);
        let total: f64 = dilated.pixels().map(|p| p[0] as f64 / 255.0).sum();
        total / area
    }

    fn letter_boxes<'a>(&self, input: &'a Preprocessed) -> Vec<&'a super::GlyphBox> {
        input
            .glyphs
            .iter()
            .filter(|g| g.height > self.min_letter_height)
            .collect()
    }
}

impl Default for LatinExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor for LatinExtractor {
    type Output = LatinFeatures;

    fn extract(&self, input: &Preprocessed) -> LatinFeatures {
        if input.is_empty() {
            return LatinFeatures::default();
        }

        let letters = self.letter_boxes(input);

        let heights: Vec<f64> = letters.iter().map(|g| g.height as f64).collect();
        let avg_letter_height = mean(&heights).unwrap_or(0.0);

        let mut xs: Vec<u32> = letters.iter().map(|g| g.x).collect();
        xs.sort_unstable();
        let gaps: Vec<f64> = xs.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
        let avg_spacing = mean(&gaps).unwrap_or(0.0);

        let features = LatinFeatures {
            slant_angle: self.slant_angle(input),
            stroke_thickness: self.stroke_thickness(input),
            avg_letter_height,
            avg_spacing,
        };

        debug!("Latin features: {:?}", features);
        features
    }
}

/// Standard Hough transform over 1 degree and 1 pixel bins.
///
/// Cells with at least `vote_threshold` votes that peak over their four
/// neighbours are returned ordered by votes, ties keeping angle order.
fn hough_lines(edges: &GrayImage, vote_threshold: u32) -> Vec<HoughLine> {
    let (width, height) = edges.dimensions();
    let rmax = (width as f64).hypot(height as f64).ceil() as i64;
    let bins = (2 * rmax + 1) as usize;

    let trig: Vec<(f64, f64)> = (0..180)
        .map(|deg| {
            let theta = (deg as f64).to_radians();
            (theta.cos(), theta.sin())
        })
        .collect();

    let mut acc = vec![0u32; trig.len() * bins];
    for (x, y, pixel) in edges.enumerate_pixels() {
        if pixel[0] == 0 {
            continue;
        }
        for (deg, (cos, sin)) in trig.iter().enumerate() {
            let r = (x as f64 * cos + y as f64 * sin).round() as i64;
            acc[deg * bins + (r + rmax) as usize] += 1;
        }
    }

    let cell = |deg: usize, bin: usize| acc[deg * bins + bin];
    let mut lines = Vec::new();
    for deg in 0..trig.len() {
        for bin in 0..bins {
            let votes = cell(deg, bin);
            if votes < vote_threshold {
                continue;
            }
            let left = if bin > 0 { cell(deg, bin - 1) } else { 0 };
            let right = if bin + 1 < bins { cell(deg, bin + 1) } else { 0 };
            let up = if deg > 0 { cell(deg - 1, bin) } else { 0 };
            let down = if deg + 1 < trig.len() { cell(deg + 1, bin) } else { 0 };

            if votes > left && votes >= right && votes > up && votes >= down {
                lines.push(HoughLine {
                    r: (bin as i64 - rmax) as f64,
                    angle_in_degrees: deg as u32,
                    votes,
                });
            }
        }
    }

    lines.sort_by(|a, b| b.votes.cmp(&a.votes));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ImagePreprocessor;
    use image::{DynamicImage, Luma, Rgb, RgbImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn preprocess(page: RgbImage) -> Preprocessed {
        ImagePreprocessor::new().preprocess(&DynamicImage::ImageRgb8(page))
    }

    #[test]
    fn test_blank_page() {
        let page = RgbImage::from_pixel(120, 80, Rgb([255, 255, 255]));
        let features = LatinExtractor::new().extract(&preprocess(page));

        assert_eq!(features, LatinFeatures::default());
    }

    #[test]
    fn test_height_and_spacing_of_strokes() {
        let mut page = RgbImage::from_pixel(200, 100, Rgb([255, 255, 255]));
        for x in [20, 60, 100] {
            draw_filled_rect_mut(&mut page, Rect::at(x, 30).of_size(10, 40), Rgb([0, 0, 0]));
        }
        // speck below the letter-height cutoff
        draw_filled_rect_mut(&mut page, Rect::at(160, 10).of_size(3, 3), Rgb([0, 0, 0]));

        let features = LatinExtractor::new().extract(&preprocess(page));

        assert!(
            (36.0..=44.0).contains(&features.avg_letter_height),
            "height {}",
            features.avg_letter_height
        );
        assert!(
            (38.0..=42.0).contains(&features.avg_spacing),
            "spacing {}",
            features.avg_spacing
        );
        assert!(features.stroke_thickness > 0.0 && features.stroke_thickness < 1.0);
    }

    #[test]
    fn test_single_glyph_has_no_spacing() {
        let mut page = RgbImage::from_pixel(80, 80, Rgb([255, 255, 255]));
        draw_filled_rect_mut(&mut page, Rect::at(30, 20).of_size(10, 30), Rgb([0, 0, 0]));

        let features = LatinExtractor::new().extract(&preprocess(page));
        assert_eq!(features.avg_spacing, 0.0);
        assert!(features.avg_letter_height > 10.0);
    }

    #[test]
    fn test_stroke_thickness_of_full_page() {
        let input = Preprocessed {
            binary: image::GrayImage::from_pixel(10, 10, Luma([255])),
            glyphs: Vec::new(),
        };
        let thickness = LatinExtractor::new().stroke_thickness(&input);
        assert!((thickness - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_lines_means_no_slant() {
        let input = Preprocessed {
            binary: image::GrayImage::new(50, 50),
            glyphs: Vec::new(),
        };
        assert_eq!(LatinExtractor::new().slant_angle(&input), 0.0);
    }

    #[test]
    fn test_horizontal_stroke_has_no_slant() {
        let mut page = RgbImage::from_pixel(200, 100, Rgb([255, 255, 255]));
        draw_filled_rect_mut(&mut page, Rect::at(20, 45).of_size(160, 10), Rgb([0, 0, 0]));
        let input = preprocess(page);

        let extractor = LatinExtractor::new();
        let lines = extractor.lines(&input);
        assert!(!lines.is_empty());
        assert!(lines.iter().all(|l| l.angle_in_degrees == 90), "{:?}", lines);

        let slant = extractor.slant_angle(&input);
        assert!(slant.abs() < 1e-9, "slant {}", slant);
    }

    #[test]
    fn test_strongest_line_is_averaged_first() {
        // one long baseline and twelve shorter uprights, whose lines all
        // come before the baseline in angle order
        let mut page = RgbImage::from_pixel(600, 400, Rgb([255, 255, 255]));
        draw_filled_rect_mut(&mut page, Rect::at(20, 20).of_size(560, 10), Rgb([0, 0, 0]));
        for i in 0..12 {
            draw_filled_rect_mut(
                &mut page,
                Rect::at(30 + 45 * i, 200).of_size(10, 140),
                Rgb([0, 0, 0]),
            );
        }
        let input = preprocess(page);

        let extractor = LatinExtractor::new();
        let lines = extractor.lines(&input);
        assert!(lines.len() > 10, "only {} lines", lines.len());
        assert_eq!(lines[0].angle_in_degrees, 90);
        assert!(lines.windows(2).all(|w| w[0].votes >= w[1].votes));

        let slant = extractor.slant_angle(&input);
        assert!(slant > -89.0 && slant < -45.0, "slant {}", slant);
    }

    #[test]
    fn test_hough_ranks_by_votes() {
        let mut edges = GrayImage::new(40, 40);
        for x in 0..40 {
            edges.put_pixel(x, 5, Luma([255]));
        }
        for y in 10..35 {
            edges.put_pixel(20, y, Luma([255]));
        }

        let lines = hough_lines(&edges, 20);
        assert_eq!(lines.len(), 2, "{:?}", lines);
        assert_eq!((lines[0].angle_in_degrees, lines[0].r, lines[0].votes), (90, 5.0, 40));
        // 25 upright pixels plus the baseline pixel in column 20
        assert_eq!((lines[1].angle_in_degrees, lines[1].r, lines[1].votes), (0, 20.0, 26));
    }
}
