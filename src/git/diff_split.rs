//! Per-file splitting of unified diff output.

use tracing::debug;

use crate::git::path_token::header_file_path;
use crate::utils::{char_len, truncate_chars, FILE_EXCERPT_TRUNCATED};

/// Marker that begins a per-file section in unified diff output.
pub const FILE_DIFF_MARKER: &str = "diff --git ";

/// Default per-file excerpt budget in characters.
pub const DEFAULT_MAX_CHARS_PER_FILE: usize = 12_000;

/// Default number of files kept from one diff.
pub const DEFAULT_MAX_FILES: usize = 50;

/// One file's slice of a unified diff, ready to be handed downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRecord {
    /// Repository-relative, forward-slash path (destination side).
    pub file_path: String,
    /// Header plus hunks, trimmed, possibly truncated.
    pub excerpt: String,
    /// Length of `excerpt` in characters.
    pub char_count: usize,
}

impl DiffRecord {
    /// Builds a record, truncating `body` to `max_chars` with the file
    /// excerpt marker when it does not fit.
    pub fn new(file_path: impl Into<String>, body: String, max_chars: usize) -> Self {
        let excerpt = truncate_chars(&body, max_chars, FILE_EXCERPT_TRUNCATED).unwrap_or(body);
        let char_count = char_len(&excerpt);
        Self {
            file_path: file_path.into(),
            excerpt,
            char_count,
        }
    }
}

/// Limits applied while splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitLimits {
    /// Per-file excerpt budget in characters (measured after trimming).
    pub max_chars_per_file: usize,
    /// Maximum number of records returned; `None` means unlimited.
    pub max_files: Option<usize>,
}

impl Default for SplitLimits {
    fn default() -> Self {
        Self {
            max_chars_per_file: DEFAULT_MAX_CHARS_PER_FILE,
            max_files: Some(DEFAULT_MAX_FILES),
        }
    }
}

impl SplitLimits {
    /// Same per-file budget, no file cap; used when the caller packs later.
    pub fn unlimited_files(max_chars_per_file: usize) -> Self {
        Self {
            max_chars_per_file,
            max_files: None,
        }
    }
}

/// Splits a unified diff into one [`DiffRecord`] per `diff --git` section.
///
/// Input order is preserved. Text before the first header is discarded,
/// sections whose trimmed body is empty are dropped, and once
/// `max_files` records exist no further section is opened. CRLF line
/// endings are accepted and re-joined with `\n`.
pub fn split_by_file(diff: &str, limits: SplitLimits) -> Vec<DiffRecord> {
    let max_files = limits.max_files.unwrap_or(usize::MAX);
    let mut records = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in diff.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.starts_with(FILE_DIFF_MARKER) {
            flush(&mut current, &mut records, limits.max_chars_per_file);
            if records.len() >= max_files {
                break;
            }
            current = Some((header_file_path(line), vec![line]));
            continue;
        }

        if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }

    flush(&mut current, &mut records, limits.max_chars_per_file);
    records.truncate(max_files);

    debug!(files = records.len(), "Split unified diff by file");
    records
}

/// Closes the open section, emitting it unless its trimmed body is empty.
fn flush(
    current: &mut Option<(String, Vec<&str>)>,
    records: &mut Vec<DiffRecord>,
    max_chars: usize,
) {
    if let Some((path, lines)) = current.take() {
        let body = lines.join("\n");
        let body = body.trim();
        if !body.is_empty() {
            records.push(DiffRecord::new(path, body.to_string(), max_chars));
        }
    }
}
