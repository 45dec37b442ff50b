//! Utility functions for string formatting.

pub mod format;

pub use format::{format_bytes, format_date, format_optional, truncate};
