//! HTML parsing and data extraction
//!
//! This module handles parsing the OpenJDK JEP index page and extracting
//! typed [`Entry`](crate::models::Entry) records from its table.

pub mod sanitize;
pub mod selectors;
pub mod table;

// Re-export main parser and public types
pub use selectors::TableSelectors;
pub use table::{TableParser, MIN_CELLS};
