//! One-page PDF summaries of a report.

mod writer;

pub use writer::ReportWriter;

use crate::error::ReportError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// URL prefix the report directory is served under.
pub const REPORTS_URL_PREFIX: &str = "/static/reports";

/// File name of the PDF for a report.
pub fn report_file_name(report_id: i64) -> String {
    format!("report_{report_id}.pdf")
}
