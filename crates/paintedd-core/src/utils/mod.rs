//! Utility functions for string formatting.

pub mod format;

pub use format::{digits_only, format_price, truncate_string};
