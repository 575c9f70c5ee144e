//! Repository management modules.
//!
//! Services for the two kinds of patient documents: per-section records and the reports that
//! snapshot them.

pub mod records;
pub mod reports;
