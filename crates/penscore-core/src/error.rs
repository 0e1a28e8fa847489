//! Error types for the penscore-core library.

use thiserror::Error;

/// Main error type for the penscore library.
#[derive(Error, Debug)]
pub enum PenscoreError {
    /// Image analysis error.
    #[error("analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Report store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Authentication error.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// PDF report error.
    #[error("report error: {0}")]
    Report(#[from] ReportError),

    /// Image decoding/encoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON for [`PenscoreConfig`].
    ///
    /// [`PenscoreConfig`]: crate::PenscoreConfig
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Errors raised while analysing an uploaded image.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The language tag does not name a supported script.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The image could not be decoded.
    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// The processed image could not be written.
    #[error("could not write processed image: {0}")]
    WriteProcessed(#[source] image::ImageError),
}

/// Errors related to the report store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The record does not exist or is not owned by the caller.
    #[error("{0} not found")]
    NotFound(String),

    /// A unique column already holds this value.
    #[error("duplicate {0}")]
    Duplicate(&'static str),

    /// A stored value could not be interpreted.
    #[error("corrupt {field}: {value}")]
    Corrupt { field: String, value: String },

    /// The database worker thread is gone.
    #[error("database worker unavailable: {0}")]
    Worker(String),

    /// I/O error while preparing the database location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to registration and login.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The email is already registered.
    #[error("Email already exists! Try logging in instead.")]
    EmailTaken,

    /// Unknown email or wrong password.
    #[error("Invalid credentials!")]
    InvalidCredentials,

    /// A required form field was empty.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The password hasher failed.
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// Underlying store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors related to PDF report generation.
#[derive(Error, Debug)]
pub enum ReportError {
    /// lopdf failed to encode or save the document.
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// An embedded image could not be encoded.
    #[error("failed to embed image: {0}")]
    Embed(#[from] image::ImageError),

    /// I/O error writing the report file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the penscore library.
pub type Result<T> = std::result::Result<T, PenscoreError>;
