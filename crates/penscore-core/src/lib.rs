//! Core library for handwriting legibility scoring.
//!
//! This crate provides:
//! - Image preprocessing and feature extraction for Latin and Devanagari script
//! - Linear scoring with weak-area detection and feedback
//! - SQLite storage for users and reports
//! - Progress dashboards, practice worksheets and PDF report summaries

pub mod analysis;
pub mod auth;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod pdf;
pub mod store;
pub mod uploads;
pub mod worksheet;

pub use analysis::{Analysis, Analyzer, Assessment, Features};
pub use dashboard::{summarize, DashboardStats};
pub use error::{PenscoreError, Result};
pub use models::{
    Criterion, DevanagariScores, Language, LatinScores, NewReport, PenscoreConfig, Report, Scores,
    User,
};
pub use pdf::ReportWriter;
pub use store::Database;
pub use uploads::{secure_filename, UploadDir};
pub use worksheet::{PracticeLine, Ruling, Worksheet};
