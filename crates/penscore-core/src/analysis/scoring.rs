//! Linear scoring of extracted features.

use serde::Serialize;

use super::devanagari::DevanagariFeatures;
use super::latin::LatinFeatures;
use super::Features;
use crate::models::{Criterion, DevanagariScores, Language, LatinScores, Scores};

/// Scores strictly below this are weak areas.
pub const WEAK_THRESHOLD: f64 = 60.0;

/// Ideal gap between Latin glyphs in pixels.
pub const IDEAL_SPACING: f64 = 30.0;

/// Ideal Latin letter height in pixels.
pub const IDEAL_LETTER_HEIGHT: f64 = 40.0;

/// Scores, their mean and the derived weak areas and feedback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub scores: Scores,
    pub overall: f64,
    pub weak_areas: Vec<Criterion>,
    pub feedback: Vec<String>,
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn bounded(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

fn finalize(value: f64) -> f64 {
    round1(bounded(value))
}

pub fn score_latin(features: &LatinFeatures) -> LatinScores {
    LatinScores {
        neatness: finalize(100.0 - features.slant_angle.abs()),
        spacing: finalize(100.0 - (IDEAL_SPACING - features.avg_spacing).abs()),
        consistency: finalize(100.0 - (IDEAL_LETTER_HEIGHT - features.avg_letter_height).abs()),
    }
}

pub fn score_devanagari(features: &DevanagariFeatures) -> DevanagariScores {
    DevanagariScores {
        shirorekha: finalize(features.shirorekha_strength * 100.0),
        matra: finalize(features.matra_score * 100.0),
        samanta: finalize(100.0 - features.height_variation),
    }
}

pub fn score(features: &Features) -> Scores {
    match features {
        Features::English(f) => Scores::English(score_latin(f)),
        Features::Devanagari(f) => Scores::Devanagari(score_devanagari(f)),
    }
}

/// Mean of the three rounded scores, rounded to one decimal.
pub fn overall(scores: &Scores) -> f64 {
    let entries = scores.entries();
    let sum: f64 = entries.iter().map(|(_, v)| v).sum();
    round1(sum / entries.len() as f64)
}

pub fn is_weak(score: f64) -> bool {
    score < WEAK_THRESHOLD
}

/// Criteria scoring below the threshold, in display order.
pub fn weak_areas(scores: &Scores) -> Vec<Criterion> {
    scores
        .entries()
        .into_iter()
        .filter(|(_, v)| is_weak(*v))
        .map(|(c, _)| c)
        .collect()
}

/// Practice advice shown for a weak criterion.
pub fn advice(criterion: Criterion) -> &'static str {
    match criterion {
        Criterion::Neatness => "Your handwriting slants too much. Try keeping letters upright.",
        Criterion::Spacing => "Spacing between words is inconsistent.",
        Criterion::Consistency => "Letter height varies. Practice maintaining uniform letter size.",
        Criterion::Shirorekha => {
            "Shirorekha (top line) is weak or broken. Try writing smoother top lines."
        }
        Criterion::Matra => "Matras are unclear or inconsistent.",
        Criterion::Samanta => "Letter height varies too much. Practice writing uniform characters.",
    }
}

fn praise(language: Language) -> &'static str {
    match language {
        Language::English => "Your English handwriting is excellent!",
        Language::Devanagari => "Your Devanagari handwriting is excellent!",
    }
}

/// One sentence per weak area, or a single positive sentence.
pub fn feedback(language: Language, weak: &[Criterion]) -> Vec<String> {
    if weak.is_empty() {
        return vec![praise(language).to_string()];
    }
    weak.iter().map(|c| advice(*c).to_string()).collect()
}

/// Assess a set of already computed scores.
pub fn assess_scores(scores: Scores) -> Assessment {
    let weak = weak_areas(&scores);
    Assessment {
        overall: overall(&scores),
        feedback: feedback(scores.language(), &weak),
        weak_areas: weak,
        scores,
    }
}

/// Score features and derive the overall, weak areas and feedback.
pub fn assess(features: &Features) -> Assessment {
    assess_scores(score(features))
}
