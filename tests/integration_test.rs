#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use commit_context::cancel::CancellationSignal;
use commit_context::context::{ContextPipeline, FragmentLabel};
use commit_context::git::{
    ChangeScope, ChangeSet, ChangeSetAssembler, ChangeStatus, FsFileReader, GitCommandRunner,
    GitRepository, HistoryAggregator, RepositoryProvider, SectionKind,
};
use commit_context::ContextError;
use git2::{IndexEntry, IndexTime, Repository, Signature};
use tempfile::TempDir;

/// Temporary git repository with helpers for writing, staging and committing.
struct TestRepo {
    _temp_dir: TempDir,
    repo_path: PathBuf,
    repo: Repository,
}

impl TestRepo {
    fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let repo_path = temp_dir.path().to_path_buf();

        let repo = Repository::init(&repo_path)?;

        let mut config = repo.config()?;
        config.set_str("user.name", "Test User")?;
        config.set_str("user.email", "test@example.com")?;

        Ok(TestRepo {
            _temp_dir: temp_dir,
            repo_path,
            repo,
        })
    }

    fn write(&self, relative: &str, content: &[u8]) -> Result<()> {
        let path = self.repo_path.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    fn stage(&self, relative: &str) -> Result<()> {
        let mut index = self.repo.index()?;
        index.add_path(Path::new(relative))?;
        index.write()?;
        Ok(())
    }

    /// Writes and stages every file, then commits the index on top of HEAD.
    fn commit(&self, message: &str, files: &[(&str, &str)]) -> Result<git2::Oid> {
        for (path, content) in files {
            self.write(path, content.as_bytes())?;
            self.stage(path)?;
        }

        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = Signature::now("Test User", "test@example.com")?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        Ok(self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?)
    }

    /// Records `relative` the way `git add -N` does: an empty blob flagged
    /// as intent-to-add.
    fn intent_to_add(&self, relative: &str) -> Result<()> {
        let mut index = self.repo.index()?;
        let entry = IndexEntry {
            ctime: IndexTime::new(0, 0),
            mtime: IndexTime::new(0, 0),
            dev: 0,
            ino: 0,
            mode: 0o100_644,
            uid: 0,
            gid: 0,
            file_size: 0,
            id: self.repo.blob(b"")?,
            flags: 0,
            flags_extended: 1 << 13,
            path: relative.as_bytes().to_vec(),
        };
        index.add(&entry)?;
        index.write()?;
        Ok(())
    }

    fn open(&self) -> GitRepository {
        GitRepository::discover(&self.repo_path).unwrap()
    }
}

async fn assemble(repo: &GitRepository, scope: ChangeScope) -> Result<ChangeSet, ContextError> {
    let cancel = CancellationSignal::new();
    let runner = GitCommandRunner::default();
    ChangeSetAssembler::new(repo, &FsFileReader, &runner, &cancel)
        .assemble(scope)
        .await
}

// ── Change assembly ──────────────────────────────────────────────────

#[tokio::test]
async fn partitions_staged_tracked_and_untracked() -> Result<()> {
    let test_repo = TestRepo::new()?;
    test_repo.commit("Initial commit", &[("a.txt", "one\n"), ("b.txt", "two\n")])?;

    test_repo.write("a.txt", b"one\nstaged\n")?;
    test_repo.stage("a.txt")?;
    test_repo.write("b.txt", b"two\nunstaged\n")?;
    test_repo.write("new/c.txt", b"fresh\r\nfile\n")?;

    let set = assemble(&test_repo.open(), ChangeScope::Full).await?;

    assert_eq!(set.staged.paths(), ["a.txt"]);
    assert!(set.staged.diffs()[0].contains("+staged"));
    assert_eq!(set.tracked.paths(), ["b.txt"]);
    assert!(set.tracked.diffs()[0].contains("+unstaged"));
    assert_eq!(set.untracked.paths(), ["new/c.txt"]);
    assert!(set.untracked.diffs()[0].contains("@@ -0,0 +1,3 @@\n+fresh\n+file\n+"));
    Ok(())
}

#[tokio::test]
async fn staged_only_on_clean_index_is_no_changes() -> Result<()> {
    let test_repo = TestRepo::new()?;
    test_repo.commit("Initial commit", &[("a.txt", "one\n")])?;
    test_repo.write("a.txt", b"edited\n")?;

    let err = assemble(&test_repo.open(), ChangeScope::StagedOnly)
        .await
        .unwrap_err();
    assert!(matches!(err, ContextError::NoChanges));
    Ok(())
}

#[tokio::test]
async fn clean_working_copy_is_no_changes() -> Result<()> {
    let test_repo = TestRepo::new()?;
    test_repo.commit("Initial commit", &[("a.txt", "one\n")])?;

    let err = assemble(&test_repo.open(), ChangeScope::Full).await.unwrap_err();
    assert!(matches!(err, ContextError::NoChanges));
    Ok(())
}

#[tokio::test]
async fn unborn_branch_stages_against_empty_tree() -> Result<()> {
    let test_repo = TestRepo::new()?;
    test_repo.write("first.rs", b"fn main() {}\n")?;
    test_repo.stage("first.rs")?;

    let set = assemble(&test_repo.open(), ChangeScope::StagedOnly).await?;
    assert_eq!(set.staged.paths(), ["first.rs"]);
    assert!(set.staged.diffs()[0].contains("+fn main() {}"));
    Ok(())
}

#[tokio::test]
async fn binary_untracked_file_is_marked() -> Result<()> {
    let test_repo = TestRepo::new()?;
    test_repo.commit("Initial commit", &[("a.txt", "one\n")])?;
    test_repo.write("blob.bin", b"\x00\x01\x02")?;

    let set = assemble(&test_repo.open(), ChangeScope::Full).await?;
    assert_eq!(set.untracked.paths(), ["blob.bin"]);
    assert!(set.untracked.diffs()[0].ends_with("Binary files /dev/null and b/blob.bin differ"));
    Ok(())
}

#[tokio::test]
async fn ignored_files_are_not_untracked() -> Result<()> {
    let test_repo = TestRepo::new()?;
    test_repo.commit("Initial commit", &[(".gitignore", "target/\n")])?;
    test_repo.write("target/out.o", b"obj")?;
    test_repo.write("keep.txt", b"keep")?;

    let set = assemble(&test_repo.open(), ChangeScope::Full).await?;
    assert_eq!(set.untracked.paths(), ["keep.txt"]);
    Ok(())
}

#[tokio::test]
async fn intent_to_add_is_reported_as_new() -> Result<()> {
    let test_repo = TestRepo::new()?;
    test_repo.commit("Initial commit", &[("a.txt", "one\n")])?;
    test_repo.write("ita.txt", b"planned\n")?;
    test_repo.intent_to_add("ita.txt")?;

    let repo = test_repo.open();
    let changes = repo.working_tree_changes().await?;
    let ita = changes
        .iter()
        .find(|c| c.path.ends_with("ita.txt"))
        .expect("ita.txt listed");
    assert_eq!(ita.status, ChangeStatus::IntentToAdd);
    assert!(ita.status.is_new());
    assert!(repo.untracked_changes().await?.is_empty());
    Ok(())
}

// ── History ──────────────────────────────────────────────────────────

#[tokio::test]
async fn shared_commit_is_reported_once() -> Result<()> {
    let test_repo = TestRepo::new()?;
    test_repo.commit("Add x", &[("x.rs", "x1\n")])?;
    let shared = test_repo.commit("Touch both", &[("x.rs", "x2\n"), ("y.rs", "y1\n")])?;

    let repo = test_repo.open();
    let cancel = CancellationSignal::new();
    let summary = HistoryAggregator::new(&repo, &cancel)
        .aggregate(&["x.rs", "y.rs"])
        .await?;

    let short = &shared.to_string()[..7];
    let text = summary.to_string();
    assert_eq!(text.matches(short).count(), 1, "{text}");
    let shared_record = summary
        .commits
        .iter()
        .find(|c| c.hash == shared.to_string())
        .unwrap();
    assert_eq!(shared_record.attributed_paths, vec!["x.rs", "y.rs"]);
    assert_eq!(summary.commits.len(), 2);
    Ok(())
}

#[tokio::test]
async fn log_only_returns_commits_touching_path() -> Result<()> {
    let test_repo = TestRepo::new()?;
    test_repo.commit("Add a", &[("a.txt", "1\n")])?;
    test_repo.commit("Add b", &[("b.txt", "1\n")])?;
    test_repo.commit("Edit a", &[("a.txt", "2\n")])?;

    let repo = test_repo.open();
    let entries = repo.log("a.txt", 10).await?;
    let messages: Vec<_> = entries.iter().filter_map(|e| e.message.as_deref()).collect();
    assert_eq!(messages, vec!["Edit a", "Add a"]);
    assert_eq!(entries[0].author_name.as_deref(), Some("Test User"));

    assert_eq!(repo.log("a.txt", 1).await?.len(), 1);
    Ok(())
}

// ── Pipeline ─────────────────────────────────────────────────────────

#[tokio::test]
async fn pipeline_is_deterministic_and_ordered() -> Result<()> {
    let test_repo = TestRepo::new()?;
    test_repo.commit("Initial commit", &[("lib.rs", "pub fn a() {}\n")])?;
    test_repo.write("lib.rs", b"pub fn a() {}\npub fn b() {}\n")?;
    test_repo.write("zeta.md", b"z\n")?;
    test_repo.write("alpha.md", b"a\n")?;

    let repo = test_repo.open();
    let runner = GitCommandRunner::default();
    let cancel = CancellationSignal::new();
    let pipeline = ContextPipeline::new(&repo, &FsFileReader, &runner, &cancel);

    let first = pipeline.build_commit_context(ChangeScope::Full, "Task.").await?;
    let second = pipeline.build_commit_context(ChangeScope::Full, "Task.").await?;
    assert_eq!(first, second);

    let labels: Vec<_> = first.fragments.iter().map(|f| (f.label, f.path.clone())).collect();
    assert_eq!(
        labels,
        vec![
            (FragmentLabel::Diff(SectionKind::Tracked), Some("lib.rs".to_string())),
            (FragmentLabel::Diff(SectionKind::Untracked), Some("alpha.md".to_string())),
            (FragmentLabel::Diff(SectionKind::Untracked), Some("zeta.md".to_string())),
            (FragmentLabel::History, None),
            (FragmentLabel::Closing, None),
        ]
    );
    assert!(first.history.starts_with("Changed files (tracked):\n- lib.rs"));
    assert!(first.fragments.last().unwrap().body.ends_with("\n\nTask."));
    Ok(())
}

#[tokio::test]
async fn pre_cancelled_pipeline_returns_cancelled() -> Result<()> {
    let test_repo = TestRepo::new()?;
    test_repo.commit("Initial commit", &[("a.txt", "1\n")])?;
    test_repo.write("a.txt", b"2\n")?;

    let repo = test_repo.open();
    let runner = GitCommandRunner::default();
    let cancel = CancellationSignal::new();
    cancel.cancel();

    let err = ContextPipeline::new(&repo, &FsFileReader, &runner, &cancel)
        .build_commit_context(ChangeScope::Full, "x")
        .await
        .unwrap_err();
    assert!(matches!(err, ContextError::Cancelled));
    Ok(())
}

#[test]
fn discover_from_subdirectory_finds_root() -> Result<()> {
    let test_repo = TestRepo::new()?;
    test_repo.write("nested/deep/file.txt", b"x")?;

    let repo = GitRepository::discover(test_repo.repo_path.join("nested/deep"))?;
    let expected = test_repo.repo_path.canonicalize()?;
    assert_eq!(repo.root().canonicalize()?, expected);
    Ok(())
}
