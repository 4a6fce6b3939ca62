//! Configuration parsing and validation
//!
//! This module handles finding and decoding runbook.yml files and checking
//! their structure. Variables and templates are left untouched here; see
//! [`crate::Runbook`] for the resolved form.

pub mod parse;
pub mod schema;
pub mod types;

// Re-export main types
pub use parse::*;
pub use schema::*;
pub use types::*;
