//! Core definitions (errors, results, validation), relied upon by all sidra-* crates.

pub mod error;
pub mod result;

pub use result::Result;
