//! Report PDF generation using lopdf.

use std::fs;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::ImageReader;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info, warn};

use super::{report_file_name, Result};
use crate::models::Report;

/// US Letter in points.
const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;

const IMAGE_WIDTH: i64 = 200;
const IMAGE_HEIGHT: i64 = 150;
const IMAGE_Y: i64 = 500;
const CAPTION_Y: i64 = 660;
const JPEG_QUALITY: u8 = 85;

fn int(value: i64) -> Object {
    Object::Integer(value)
}

fn text(font: &str, size: i64, x: i64, y: i64, line: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), int(size)]),
        Operation::new("Td", vec![int(x), int(y)]),
        Operation::new("Tj", vec![Object::string_literal(line)]),
        Operation::new("ET", vec![]),
    ]
}

fn place_image(name: &str, x: i64) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![int(IMAGE_WIDTH), int(0), int(0), int(IMAGE_HEIGHT), int(x), int(IMAGE_Y)],
        ),
        Operation::new("Do", vec![name.into()]),
        Operation::new("Q", vec![]),
    ]
}

/// Decode an image file and re-encode it as a JPEG XObject.
fn jpeg_xobject(path: &Path) -> Result<Stream> {
    let decoded = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    let rgb = decoded.to_rgb8();

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).encode_image(&rgb)?;

    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(rgb.width()),
        "Height" => i64::from(rgb.height()),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => int(8),
        "Filter" => "DCTDecode",
    };
    Ok(Stream::new(dict, bytes).with_compression(false))
}

fn score_lines(report: &Report) -> Vec<String> {
    let mut lines: Vec<String> = report
        .scores
        .entries()
        .iter()
        .map(|(criterion, value)| format!("{}: {:.1}%", criterion.label(), value))
        .collect();
    lines.push(format!("Overall Score: {:.1}%", report.overall));
    lines
}

fn weak_areas_line(report: &Report) -> String {
    if report.weak_areas.is_empty() {
        return "Weak areas: None".to_string();
    }
    let labels: Vec<&str> = report.weak_areas.iter().map(|c| c.label()).collect();
    format!("Weak areas: {}", labels.join(", "))
}

/// Writes one-page report summaries into a directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    out_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn path_for(&self, report_id: i64) -> PathBuf {
        self.out_dir.join(report_file_name(report_id))
    }

    /// Build the document for a report.
    ///
    /// Images that cannot be read are left out together with their caption.
    pub fn render(&self, report: &Report) -> Result<Document> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });
        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut ops = Vec::new();
        ops.extend(text("F2", 16, 50, 750, "Handwriting Analysis Report"));
        ops.extend(text("F1", 12, 50, 720, &format!("Date: {}", report.date())));
        ops.extend(text("F1", 12, 50, 700, &format!("User ID: {}", report.user_id)));

        let script = report.language().display_name();
        ops.extend(text("F1", 12, 300, 700, &format!("Script: {script}")));

        let mut xobjects = Dictionary::new();
        let images = [
            ("Im1", report.image_path.as_str(), 50, "Original Handwriting"),
            ("Im2", report.processed_path.as_str(), 300, "Processed Image"),
        ];
        for (name, path, x, caption) in images {
            match jpeg_xobject(Path::new(path)) {
                Ok(stream) => {
                    let image_id: ObjectId = doc.add_object(stream);
                    xobjects.set(name, image_id);
                    ops.extend(place_image(name, x));
                    ops.extend(text("F1", 12, x, CAPTION_Y, caption));
                }
                Err(e) => warn!("Skipping image {} in report {}: {}", path, report.id, e),
            }
        }

        for (line, y) in score_lines(report).iter().zip([450, 430, 410, 390]) {
            ops.extend(text("F1", 12, 50, y, line));
        }
        ops.extend(text("F1", 12, 50, 360, &weak_areas_line(report)));

        let content = Content { operations: ops };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
            "XObject" => xobjects,
        });

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => int(1),
            "Resources" => resources_id,
            "MediaBox" => vec![int(0), int(0), int(PAGE_WIDTH), int(PAGE_HEIGHT)],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Ok(doc)
    }

    /// Render and save `report_<id>.pdf`, replacing any earlier copy.
    pub fn write(&self, report: &Report) -> Result<PathBuf> {
        fs::create_dir_all(&self.out_dir)?;

        let mut doc = self.render(report)?;
        let path = self.path_for(report.id);
        let mut file = fs::File::create(&path)?;
        doc.save_to(&mut file)?;

        debug!("PDF objects: {}", doc.objects.len());
        info!("Wrote report {} to {}", report.id, path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::scoring::assess_scores;
    use crate::models::{DevanagariScores, LatinScores, Scores};
    use chrono::NaiveDate;
    use image::{GrayImage, Luma};

    fn report(dir: &Path, scores: Scores) -> Report {
        let assessment = assess_scores(scores);
        Report {
            id: 7,
            user_id: 3,
            image_path: dir.join("sample.png").to_string_lossy().into_owned(),
            processed_path: dir.join("processed_sample.png").to_string_lossy().into_owned(),
            scores,
            overall: assessment.overall,
            weak_areas: assessment.weak_areas,
            created_at: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
        }
    }

    fn page_text(path: &Path) -> (usize, String) {
        let doc = Document::load(path).unwrap();
        let pages = doc.get_pages();
        let page_id = *pages.values().next().unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        (pages.len(), String::from_utf8_lossy(&content).into_owned())
    }

    #[test]
    fn test_write_with_images() {
        let dir = tempfile::tempdir().unwrap();
        let img = GrayImage::from_fn(40, 30, |x, _| Luma([if x % 2 == 0 { 0 } else { 255 }]));
        img.save(dir.path().join("sample.png")).unwrap();
        img.save(dir.path().join("processed_sample.png")).unwrap();

        let scores = Scores::English(LatinScores {
            neatness: 95.0,
            spacing: 98.0,
            consistency: 98.0,
        });
        let writer = ReportWriter::new(dir.path().join("reports"));
        let path = writer.write(&report(dir.path(), scores)).unwrap();

        assert!(path.ends_with("report_7.pdf"));
        let (pages, content) = page_text(&path);
        assert_eq!(pages, 1);
        assert!(content.contains("Handwriting Analysis Report"));
        assert!(content.contains("Neatness: 95.0%"));
        assert!(content.contains("Overall Score: 97.0%"));
        assert!(content.contains("Weak areas: None"));
        assert!(content.contains("/Im1 Do"));
        assert!(content.contains("Processed Image"));
    }

    #[test]
    fn test_missing_images_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let scores = Scores::Devanagari(DevanagariScores {
            shirorekha: 30.0,
            matra: 10.0,
            samanta: 50.0,
        });

        let writer = ReportWriter::new(dir.path());
        let path = writer.write(&report(dir.path(), scores)).unwrap();

        let (pages, content) = page_text(&path);
        assert_eq!(pages, 1);
        assert!(content.contains("Shirorekha: 30.0%"));
        assert!(content.contains("Weak areas: Shirorekha, Matra, Samanta"));
        assert!(!content.contains("/Im1"));
        assert!(!content.contains("Original Handwriting"));
    }
}
