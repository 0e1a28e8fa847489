//! Data models.

pub mod config;
pub mod report;

pub use config::PenscoreConfig;
pub use report::{
    Criterion, DevanagariScores, Language, LatinScores, NewReport, Report, Scores, User,
};
