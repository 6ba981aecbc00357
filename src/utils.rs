//! Utility functions and helpers.

pub mod text;

pub use text::{char_len, truncate_chars, FILE_EXCERPT_TRUNCATED, MESSAGE_TRUNCATED};
