//! Character-budget truncation shared by the diff parser, the synthetic
//! patch builder and the context packer.

/// Marker appended when a single file's excerpt exceeds its budget.
pub const FILE_EXCERPT_TRUNCATED: &str = "\n... [file excerpt truncated]";

/// Marker appended when a packed fragment exceeds its budget.
pub const MESSAGE_TRUNCATED: &str = "\n... [message truncated]";

/// Returns the number of Unicode scalar values in `text`.
///
/// All budgets in this crate are measured in characters, never bytes, so
/// a cut can not land inside a multi-byte sequence.
#[must_use]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Cuts `text` to its first `max_chars` characters and appends `marker`.
///
/// Returns `None` when the text already fits, so callers can tell whether
/// a truncation happened.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize, marker: &str) -> Option<String> {
    let cut = text.char_indices().nth(max_chars).map(|(idx, _)| idx)?;
    let mut out = String::with_capacity(cut + marker.len());
    out.push_str(&text[..cut]);
    out.push_str(marker);
    Some(out)
}
