//! Output modules for rendering benchmark results.
//!
//! Supports per-configuration report lines, table (comfy-table), JSON, CSV,
//! summary, and progress spinner output.

pub mod csv;
pub mod json;
pub mod progress;
pub mod report;
pub mod summary;
pub mod table;
