//! Filesystem and `git` binary adapters.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use futures::future::BoxFuture;
use tokio::process::Command;
use tracing::debug;

use crate::git::provider::{FileReader, ProcessRunner};

/// Arguments that list unignored files missing from the index, NUL-delimited.
pub const LIST_UNTRACKED_ARGS: [&str; 4] = ["ls-files", "--others", "--exclude-standard", "-z"];

/// Reads files through `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsFileReader;

impl FileReader for FsFileReader {
    fn read<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<Vec<u8>>> {
        Box::pin(tokio::fs::read(path))
    }
}

/// Runs a `git` executable as a child process.
#[derive(Debug, Clone)]
pub struct GitCommandRunner {
    git_path: PathBuf,
}

impl Default for GitCommandRunner {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCommandRunner {
    /// Uses the executable at `git_path` (resolved through `PATH` when
    /// relative).
    pub fn new(git_path: impl Into<PathBuf>) -> Self {
        Self {
            git_path: git_path.into(),
        }
    }
}

impl ProcessRunner for GitCommandRunner {
    fn execute<'a>(
        &'a self,
        args: &'a [&'a str],
        working_dir: &'a Path,
    ) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            debug!(
                binary = %self.git_path.display(),
                args = ?args,
                working_dir = %working_dir.display(),
                "Spawning git process"
            );

            let output = Command::new(&self.git_path)
                .args(args)
                .current_dir(working_dir)
                .stdin(Stdio::null())
                .output()
                .await
                .with_context(|| format!("Failed to run {}", self.git_path.display()))?;

            if !output.status.success() {
                bail!(
                    "git {} exited with {}: {}",
                    args.join(" "),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }

            Ok(output.stdout)
        })
    }
}

/// Splits NUL-delimited `git ls-files -z` output into repository-relative
/// paths, dropping empty entries.
pub fn parse_nul_delimited(stdout: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(stdout)
        .split('\0')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
