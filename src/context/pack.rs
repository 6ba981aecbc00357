//! Packing a change set and history into ordered, size-bounded fragments.
//!
//! Fragments come out in a fixed order: one per non-blank diff entry
//! (staged, then tracked, then untracked), an optional history fragment,
//! and a closing fragment carrying the caller's task instructions.

use serde::Serialize;

use crate::git::change_set::{ChangeSection, ChangeSet, SectionKind};
use crate::utils::text::{truncate_chars, MESSAGE_TRUNCATED};

/// Default character budget of one fragment.
pub const DEFAULT_FRAGMENT_BUDGET: usize = 14_000;

/// Characters reserved per fragment for the header and fence lines.
pub const DEFAULT_FRAGMENT_OVERHEAD: usize = 600;

const HISTORY_HEADER: &str = "Attachment: recent commits for changed files (for context)";
const HISTORY_NOTICE: &str =
    "History context has also been provided in a previous message. Please use it.";
const NO_DIFF_NOTICE: &str = "No diff excerpts were provided.";

/// What a fragment carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "section")]
pub enum FragmentLabel {
    /// One diff excerpt from the given section.
    Diff(SectionKind),
    /// The rendered commit history.
    History,
    /// Section notices followed by the task instructions.
    Closing,
}

/// One unit of packed context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextFragment {
    /// Fragment kind.
    pub label: FragmentLabel,
    /// 1-based position within its section (always 1 outside diffs).
    pub ordinal: usize,
    /// Entries in its section (always 1 outside diffs).
    pub total: usize,
    /// Repository-relative path for diff fragments.
    pub path: Option<String>,
    /// Full fragment text.
    pub body: String,
    /// Whether the excerpt was cut to fit the budget.
    pub truncated: bool,
}

/// Fragment size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackLimits {
    /// Character budget of one fragment.
    pub fragment_budget: usize,
    /// Characters reserved for framing.
    pub overhead: usize,
}

impl Default for PackLimits {
    fn default() -> Self {
        Self {
            fragment_budget: DEFAULT_FRAGMENT_BUDGET,
            overhead: DEFAULT_FRAGMENT_OVERHEAD,
        }
    }
}

impl PackLimits {
    /// Characters of diff excerpt that fit in one fragment.
    pub fn max_excerpt_chars(&self) -> usize {
        self.fragment_budget.saturating_sub(self.overhead)
    }
}

/// Turns a [`ChangeSet`] plus history text into [`ContextFragment`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextPacker {
    limits: PackLimits,
}

impl ContextPacker {
    /// Creates a packer with the given limits.
    pub fn new(limits: PackLimits) -> Self {
        Self { limits }
    }

    /// Packs everything in order. The output depends only on the inputs.
    pub fn pack(
        &self,
        change_set: &ChangeSet,
        history: &str,
        instructions: &str,
    ) -> Vec<ContextFragment> {
        let mut fragments = Vec::new();

        for (kind, section) in change_set.sections() {
            self.pack_section(kind, section, &mut fragments);
        }

        let history = history.trim();
        if !history.is_empty() {
            fragments.push(ContextFragment {
                label: FragmentLabel::History,
                ordinal: 1,
                total: 1,
                path: None,
                body: format!("{HISTORY_HEADER}\n\n{history}"),
                truncated: false,
            });
        }

        fragments.push(ContextFragment {
            label: FragmentLabel::Closing,
            ordinal: 1,
            total: 1,
            path: None,
            body: closing_body(change_set, !history.is_empty(), instructions),
            truncated: false,
        });

        fragments
    }

    fn pack_section(
        &self,
        kind: SectionKind,
        section: &ChangeSection,
        out: &mut Vec<ContextFragment>,
    ) {
        let total = section.len();
        let max_excerpt = self.limits.max_excerpt_chars();

        for (index, (path, diff)) in section.iter().enumerate() {
            if diff.trim().is_empty() {
                continue;
            }

            let cut = truncate_chars(diff, max_excerpt, MESSAGE_TRUNCATED);
            let truncated = cut.is_some();
            let excerpt = cut.as_deref().unwrap_or(diff);

            let body = format!(
                "Attachment {ordinal}/{total}: diff excerpt ({kind})\nFile: {path}\n\
                 ```diff\n{excerpt}\n```",
                ordinal = index + 1
            );

            out.push(ContextFragment {
                label: FragmentLabel::Diff(kind),
                ordinal: index + 1,
                total,
                path: Some(path.to_string()),
                body,
                truncated,
            });
        }
    }
}

fn section_notice(kind: SectionKind) -> &'static str {
    match kind {
        SectionKind::Staged => {
            "Staged diff excerpts have been provided in previous messages. Please use them."
        }
        SectionKind::Tracked => {
            "Tracked diff excerpts have been provided in previous messages. Please use them."
        }
        SectionKind::Untracked => {
            "Untracked new file excerpts have been provided in previous messages. Please use them."
        }
    }
}

fn closing_body(change_set: &ChangeSet, has_history: bool, instructions: &str) -> String {
    let notices: Vec<&str> = change_set
        .sections()
        .filter(|(_, section)| !section.is_empty())
        .map(|(kind, _)| section_notice(kind))
        .collect();

    let mut body = if notices.is_empty() {
        NO_DIFF_NOTICE.to_string()
    } else {
        notices.join("\n")
    };
    if has_history {
        body.push('\n');
        body.push_str(HISTORY_NOTICE);
    }
    body.push_str("\n\n");
    body.push_str(instructions);
    body
}
