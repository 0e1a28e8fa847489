//! Report, score and user models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Timestamp format used for report dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Script the handwriting sample is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Latin script (English).
    English,
    /// Devanagari script (Hindi, Marathi).
    Devanagari,
}

impl Language {
    /// Canonical tag stored in the database and used in URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Devanagari => "devanagari",
        }
    }

    /// Human readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Devanagari => "Devanagari",
        }
    }

    /// The three criteria scored for this script, in display order.
    pub fn criteria(&self) -> [Criterion; 3] {
        match self {
            Language::English => [Criterion::Neatness, Criterion::Spacing, Criterion::Consistency],
            Language::Devanagari => [Criterion::Shirorekha, Criterion::Matra, Criterion::Samanta],
        }
    }
}

impl FromStr for Language {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "english" | "eng" => Ok(Language::English),
            "devanagari" | "hindi" | "marathi" | "dev" => Ok(Language::Devanagari),
            other => Err(AnalysisError::UnsupportedLanguage(other.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single scored legibility trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    Neatness,
    Spacing,
    Consistency,
    Shirorekha,
    Matra,
    Samanta,
}

impl Criterion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::Neatness => "neatness",
            Criterion::Spacing => "spacing",
            Criterion::Consistency => "consistency",
            Criterion::Shirorekha => "shirorekha",
            Criterion::Matra => "matra",
            Criterion::Samanta => "samanta",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Criterion::Neatness => "Neatness",
            Criterion::Spacing => "Spacing",
            Criterion::Consistency => "Consistency",
            Criterion::Shirorekha => "Shirorekha",
            Criterion::Matra => "Matra",
            Criterion::Samanta => "Samanta",
        }
    }

    /// Script this criterion belongs to.
    pub fn language(&self) -> Language {
        match self {
            Criterion::Neatness | Criterion::Spacing | Criterion::Consistency => Language::English,
            Criterion::Shirorekha | Criterion::Matra | Criterion::Samanta => Language::Devanagari,
        }
    }
}

impl FromStr for Criterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "neatness" => Ok(Criterion::Neatness),
            "spacing" => Ok(Criterion::Spacing),
            "consistency" => Ok(Criterion::Consistency),
            "shirorekha" => Ok(Criterion::Shirorekha),
            "matra" => Ok(Criterion::Matra),
            "samanta" => Ok(Criterion::Samanta),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scores for a Latin-script sample (0 - 100, one decimal).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatinScores {
    pub neatness: f64,
    pub spacing: f64,
    pub consistency: f64,
}

/// Scores for a Devanagari sample (0 - 100, one decimal).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DevanagariScores {
    pub shirorekha: f64,
    pub matra: f64,
    pub samanta: f64,
}

/// Script-specific score set. Each script keeps its own fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "language", rename_all = "lowercase")]
pub enum Scores {
    English(LatinScores),
    Devanagari(DevanagariScores),
}

impl Scores {
    pub fn language(&self) -> Language {
        match self {
            Scores::English(_) => Language::English,
            Scores::Devanagari(_) => Language::Devanagari,
        }
    }

    /// The three criterion scores in display order.
    pub fn entries(&self) -> [(Criterion, f64); 3] {
        match self {
            Scores::English(s) => [
                (Criterion::Neatness, s.neatness),
                (Criterion::Spacing, s.spacing),
                (Criterion::Consistency, s.consistency),
            ],
            Scores::Devanagari(s) => [
                (Criterion::Shirorekha, s.shirorekha),
                (Criterion::Matra, s.matra),
                (Criterion::Samanta, s.samanta),
            ],
        }
    }

    /// Score for one criterion, `None` if it belongs to the other script.
    pub fn get(&self, criterion: Criterion) -> Option<f64> {
        self.entries()
            .into_iter()
            .find(|(c, _)| *c == criterion)
            .map(|(_, v)| v)
    }

    /// Criteria sharing the lowest score.
    pub fn lowest(&self) -> Vec<Criterion> {
        let entries = self.entries();
        let min = entries.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
        entries
            .into_iter()
            .filter(|(_, v)| *v == min)
            .map(|(c, _)| c)
            .collect()
    }
}

/// A registered user.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// A persisted analysis of one uploaded image.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub id: i64,
    pub user_id: i64,
    pub image_path: String,
    pub processed_path: String,
    pub scores: Scores,
    pub overall: f64,
    pub weak_areas: Vec<Criterion>,
    pub created_at: NaiveDateTime,
}

impl Report {
    pub fn language(&self) -> Language {
        self.scores.language()
    }

    /// Creation time formatted for display.
    pub fn date(&self) -> String {
        self.created_at.format(DATE_FORMAT).to_string()
    }
}

/// Input for creating a report.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub user_id: i64,
    pub image_path: String,
    pub processed_path: String,
    pub scores: Scores,
    pub overall: f64,
    pub weak_areas: Vec<Criterion>,
    pub created_at: NaiveDateTime,
}

/// Join weak areas for storage.
pub fn join_weak_areas(areas: &[Criterion]) -> String {
    areas.iter().map(Criterion::as_str).collect::<Vec<_>>().join(",")
}

/// Parse a stored weak-area list.
pub fn split_weak_areas(value: &str) -> Result<Vec<Criterion>, String> {
    value
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(Criterion::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_aliases() {
        assert_eq!("English".parse::<Language>().unwrap(), Language::English);
        assert_eq!(" eng ".parse::<Language>().unwrap(), Language::English);
        assert_eq!("hindi".parse::<Language>().unwrap(), Language::Devanagari);
        assert_eq!("Marathi".parse::<Language>().unwrap(), Language::Devanagari);
        assert_eq!("dev".parse::<Language>().unwrap(), Language::Devanagari);
        assert!("klingon".parse::<Language>().is_err());
        assert!("latin".parse::<Language>().is_err());
    }

    #[test]
    fn test_weak_area_storage_format() {
        let areas = vec![Criterion::Shirorekha, Criterion::Samanta];
        let joined = join_weak_areas(&areas);
        assert_eq!(joined, "shirorekha,samanta");
        assert_eq!(split_weak_areas(&joined).unwrap(), areas);
        assert!(split_weak_areas("").unwrap().is_empty());
        assert!(split_weak_areas("neatness,bogus").is_err());
    }

    #[test]
    fn test_lowest_ties() {
        let scores = Scores::English(LatinScores {
            neatness: 70.0,
            spacing: 55.5,
            consistency: 55.5,
        });
        assert_eq!(scores.lowest(), vec![Criterion::Spacing, Criterion::Consistency]);
        assert_eq!(scores.get(Criterion::Neatness), Some(70.0));
        assert_eq!(scores.get(Criterion::Matra), None);
    }
}
