//! Settings loaded from `$HOME/.commit-context/settings.json`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::context::pack::{PackLimits, DEFAULT_FRAGMENT_BUDGET, DEFAULT_FRAGMENT_OVERHEAD};
use crate::git::diff_split::DEFAULT_MAX_CHARS_PER_FILE;
use crate::git::history::{HistoryLimits, DEFAULT_COMMITS_PER_FILE, DEFAULT_MAX_HISTORY_FILES};

/// Task instructions used when neither the settings file nor the command
/// line provides any.
pub const DEFAULT_INSTRUCTIONS: &str =
    "Write a concise commit message for the changes above. Use the imperative mood.";

/// Size knobs for extraction, history and packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContextLimits {
    /// Characters kept per file excerpt.
    pub max_chars_per_file: usize,
    /// Distinct files queried for history.
    pub max_history_files: usize,
    /// Commits fetched per history file.
    pub commits_per_file: usize,
    /// Character budget of one fragment.
    pub fragment_budget: usize,
    /// Characters reserved per fragment for framing.
    pub fragment_overhead: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            max_chars_per_file: DEFAULT_MAX_CHARS_PER_FILE,
            max_history_files: DEFAULT_MAX_HISTORY_FILES,
            commits_per_file: DEFAULT_COMMITS_PER_FILE,
            fragment_budget: DEFAULT_FRAGMENT_BUDGET,
            fragment_overhead: DEFAULT_FRAGMENT_OVERHEAD,
        }
    }
}

impl ContextLimits {
    /// History caps derived from these limits.
    pub fn history(&self) -> HistoryLimits {
        HistoryLimits {
            max_files: self.max_history_files,
            commits_per_file: self.commits_per_file,
        }
    }

    /// Packing caps derived from these limits.
    pub fn pack(&self) -> PackLimits {
        PackLimits {
            fragment_budget: self.fragment_budget,
            overhead: self.fragment_overhead,
        }
    }
}

/// Contents of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContextConfig {
    /// Size knobs.
    pub limits: ContextLimits,
    /// Task instructions appended to the closing fragment.
    pub instructions: Option<String>,
    /// `git` executable used for the untracked-file fallback.
    pub git_path: Option<PathBuf>,
}

impl ContextConfig {
    /// Loads settings from the default location.
    pub fn load() -> Result<Self> {
        let settings_path = Self::settings_path()?;
        Self::load_from_path(&settings_path)
    }

    /// Loads settings from a specific path; a missing file yields defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        serde_json::from_str::<Self>(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Returns the default settings path.
    pub fn settings_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;

        Ok(home_dir.join(".commit-context").join("settings.json"))
    }

    /// Instructions to use, falling back to [`DEFAULT_INSTRUCTIONS`].
    pub fn instructions(&self) -> &str {
        self.instructions
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or(DEFAULT_INSTRUCTIONS)
    }
}
