//! Diff-shaped records for content that has no previous version.
//!
//! Untracked files never show up in `git diff`, so their patch is built
//! here in the same shape git uses for an added file.

use crate::git::diff_split::DiffRecord;
use crate::utils::char_len;

/// Returns true when `content` should be treated as binary.
///
/// A single NUL byte anywhere is taken as sufficient evidence.
pub fn looks_binary(content: &[u8]) -> bool {
    content.contains(&0)
}

/// Builds the added-file record for `repo_relative_path`.
///
/// Binary content gets the header plus a `Binary files ... differ` line.
/// Text content is decoded lossily, CRLF-normalized and emitted as one
/// `+` line per source line under a single `@@ -0,0 +1,N @@` hunk; empty
/// content produces the header alone, as git does for an empty new file.
///
/// The hunk count always reflects the whole file, but body lines stop
/// being rendered once the patch is past `max_chars`.
pub fn build_added_file_record(
    repo_relative_path: &str,
    content: &[u8],
    max_chars: usize,
) -> DiffRecord {
    let patch = if looks_binary(content) {
        build_binary_patch(repo_relative_path)
    } else {
        let text = String::from_utf8_lossy(content);
        build_text_patch(repo_relative_path, &text, max_chars)
    };
    DiffRecord::new(repo_relative_path, patch, max_chars)
}

fn added_file_header(path: &str) -> String {
    format!(
        "diff --git a/{path} b/{path}\n\
         new file mode 100644\n\
         --- /dev/null\n\
         +++ b/{path}"
    )
}

fn build_binary_patch(path: &str) -> String {
    format!(
        "{}\nBinary files /dev/null and b/{path} differ",
        added_file_header(path)
    )
}

fn build_text_patch(path: &str, text: &str, max_chars: usize) -> String {
    // One character past the budget is enough for the record to add its marker.
    let mut patch = CappedText::new(max_chars.saturating_add(1));
    patch.push_str(&added_file_header(path));

    if text.is_empty() {
        return patch.into_string();
    }

    // CRLF normalization never changes the number of `\n`.
    let line_count = text.matches('\n').count() + 1;
    patch.push_str(&format!("\n@@ -0,0 +1,{line_count} @@"));

    let mut lines = text.split('\n').peekable();
    while let Some(line) = lines.next() {
        if patch.is_full() {
            break;
        }
        let line = if lines.peek().is_some() {
            line.strip_suffix('\r').unwrap_or(line)
        } else {
            line
        };
        patch.push_str("\n+");
        patch.push_str(line);
    }
    patch.into_string()
}

/// String builder that silently stops accepting text after `limit`
/// characters.
struct CappedText {
    out: String,
    remaining: usize,
}

impl CappedText {
    fn new(limit: usize) -> Self {
        Self {
            out: String::new(),
            remaining: limit,
        }
    }

    fn is_full(&self) -> bool {
        self.remaining == 0
    }

    fn push_str(&mut self, text: &str) {
        if self.is_full() {
            return;
        }
        match text.char_indices().nth(self.remaining) {
            Some((cut, _)) => {
                self.out.push_str(&text[..cut]);
                self.remaining = 0;
            }
            None => {
                self.out.push_str(text);
                self.remaining -= char_len(text);
            }
        }
    }

    fn into_string(self) -> String {
        self.out
    }
}
