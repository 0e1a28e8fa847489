pub mod analyze;
pub mod batch;
pub mod config;
pub mod serve;
