//! Route handlers, grouped by page family.

pub mod account;
pub mod analysis;
pub mod reports;
pub mod worksheets;
