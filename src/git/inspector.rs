//! Working-tree queries using git2: changed files and per-file diff text.

use std::fmt;
use std::path::{Path, PathBuf};

use git2::{Diff, DiffFormat, DiffOptions, ErrorCode, Oid, Repository, Status, StatusOptions, Tree};
use tracing::{debug, info, warn};

use crate::error::{CommitError, GitError};
use crate::git::commit::stage_and_commit;
use crate::git::ignore::IgnoreFilter;

const STAGED: Status = Status::INDEX_NEW
    .union(Status::INDEX_MODIFIED)
    .union(Status::INDEX_DELETED)
    .union(Status::INDEX_RENAMED)
    .union(Status::INDEX_TYPECHANGE);

const UNSTAGED: Status = Status::WT_MODIFIED
    .union(Status::WT_DELETED)
    .union(Status::WT_RENAMED)
    .union(Status::WT_TYPECHANGE)
    .union(Status::CONFLICTED);

/// A changed file in the working tree, by repository-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifiedFile {
    pub path: String,
    pub staged: bool,
    pub unstaged: bool,
    pub untracked: bool,
}

impl ModifiedFile {
    fn from_status(path: &str, status: Status) -> Option<Self> {
        let file = ModifiedFile {
            path: path.to_string(),
            staged: status.intersects(STAGED),
            unstaged: status.intersects(UNSTAGED),
            untracked: status.contains(Status::WT_NEW),
        };
        (file.staged || file.unstaged || file.untracked).then_some(file)
    }
}

impl fmt::Display for ModifiedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut states = Vec::new();
        if self.staged {
            states.push("staged");
        }
        if self.unstaged {
            states.push("unstaged");
        }
        if self.untracked {
            states.push("untracked");
        }
        write!(f, "{} ({})", self.path, states.join(", "))
    }
}

/// Diff text for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRecord {
    pub path: String,
    pub diff: String,
}

impl DiffRecord {
    /// Form used when several diffs are concatenated into one prompt.
    pub fn render(&self) -> String {
        format!("File: {}\n{}", self.path, self.diff)
    }
}

/// Read-only view of a repository's pending changes, filtered by `.aigitignore`.
pub struct RepoInspector {
    repo: Repository,
    workdir: PathBuf,
    filter: IgnoreFilter,
}

impl RepoInspector {
    /// Open the repository containing `path` and load its ignore filter.
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = Repository::discover(path).map_err(GitError::OpenRepository)?;
        let workdir = repo.workdir().ok_or(GitError::BareRepository)?.to_path_buf();
        let filter = IgnoreFilter::load(&workdir)?;
        Ok(Self {
            repo,
            workdir,
            filter,
        })
    }

    /// Use an already-open repository with an explicit filter.
    pub fn with_filter(repo: Repository, filter: IgnoreFilter) -> Result<Self, GitError> {
        let workdir = repo.workdir().ok_or(GitError::BareRepository)?.to_path_buf();
        Ok(Self {
            repo,
            workdir,
            filter,
        })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn filter(&self) -> &IgnoreFilter {
        &self.filter
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Staged, unstaged and untracked files, sorted by path, minus ignored ones.
    ///
    /// Files excluded by `.gitignore` never show up here; `.aigitignore` is
    /// applied on top.
    pub fn list_modified_files(&self) -> Result<Vec<ModifiedFile>, GitError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts)).map_err(GitError::Status)?;

        let mut all = Vec::new();
        for entry in statuses.iter() {
            let Some(path) = entry.path() else {
                warn!("Skipping file with non-UTF-8 path");
                continue;
            };
            if let Some(file) = ModifiedFile::from_status(path, entry.status()) {
                all.push(file);
            }
        }
        all.sort_by(|a, b| a.path.cmp(&b.path));
        all.dedup_by(|a, b| a.path == b.path);

        let (ignored, kept): (Vec<_>, Vec<_>) = all
            .into_iter()
            .partition(|f| self.filter.should_ignore(&f.path));

        if !ignored.is_empty() {
            info!("Ignored {} file(s)", ignored.len());
            debug!(
                "Ignored files: {:?}",
                ignored.iter().map(|f| f.path.as_str()).collect::<Vec<_>>()
            );
        }

        Ok(kept)
    }

    /// Diff text for a single file. Never fails: errors come back inline as
    /// `Error getting diff for <path>: <error>`.
    ///
    /// Untracked files yield their full content behind a `New file:` header.
    /// Tracked files yield the staged and unstaged diffs, each under its own
    /// header and omitted when empty.
    pub fn file_diff(&self, path: &str) -> String {
        match self.try_file_diff(path) {
            Ok(diff) => diff,
            Err(e) => {
                warn!("Failed to get diff for {}: {}", path, e);
                format!("Error getting diff for {}: {}", path, e)
            }
        }
    }

    pub fn diff_record(&self, path: &str) -> DiffRecord {
        DiffRecord {
            path: path.to_string(),
            diff: self.file_diff(path),
        }
    }

    fn try_file_diff(&self, path: &str) -> Result<String, GitError> {
        if self.is_untracked(path) {
            let full_path = self.workdir.join(path);
            let content =
                std::fs::read_to_string(&full_path).map_err(|source| GitError::ReadFile {
                    path: full_path,
                    source,
                })?;
            return Ok(format!("New file: {}\n{}", path, content));
        }

        let head_tree = resolve_head_tree(&self.repo)?;

        let staged = self
            .repo
            .diff_tree_to_index(head_tree.as_ref(), None, Some(&mut single_path_opts(path)))
            .map_err(GitError::Diff)?;
        let unstaged = self
            .repo
            .diff_index_to_workdir(None, Some(&mut single_path_opts(path)))
            .map_err(GitError::Diff)?;

        let staged_text = render_patch(&staged)?;
        let unstaged_text = render_patch(&unstaged)?;

        let mut combined = String::new();
        if !staged_text.trim().is_empty() {
            combined.push_str(&format!(
                "Staged changes in {}:\n{}\n",
                path,
                staged_text.trim_end()
            ));
        }
        if !unstaged_text.trim().is_empty() {
            combined.push_str(&format!(
                "Unstaged changes in {}:\n{}\n",
                path,
                unstaged_text.trim_end()
            ));
        }

        Ok(combined.trim().to_string())
    }

    fn is_untracked(&self, path: &str) -> bool {
        match self.repo.status_file(Path::new(path)) {
            Ok(status) => status.contains(Status::WT_NEW) && !status.intersects(STAGED),
            Err(_) => false,
        }
    }

    /// Stage the filtered modified-file set and commit it on HEAD.
    ///
    /// The file set is recomputed here, so whatever changed since the last
    /// analysis run is included.
    pub fn commit_changes(&self, message: &str) -> Result<Oid, CommitError> {
        if message.trim().is_empty() {
            return Err(CommitError::EmptyMessage);
        }

        let files = self.list_modified_files().map_err(CommitError::Status)?;
        if files.is_empty() {
            return Err(CommitError::NoChanges);
        }

        let paths: Vec<String> = files.into_iter().map(|f| f.path).collect();
        info!("Committing {} file(s)", paths.len());
        stage_and_commit(&self.repo, &paths, message)
    }
}

fn single_path_opts(path: &str) -> DiffOptions {
    let mut opts = DiffOptions::new();
    opts.pathspec(path).disable_pathspec_match(true);
    opts
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
///
/// Returns `Ok(None)` for repos with no commits (unborn branch / not found).
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, GitError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(GitError::Diff(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(GitError::Diff)?;
    Ok(Some(tree))
}

/// Unified diff text of a diff object, with `+`/`-`/` ` line prefixes.
fn render_patch(diff: &Diff<'_>) -> Result<String, GitError> {
    let mut text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let origin = line.origin();
        if origin == '+' || origin == '-' || origin == ' ' {
            text.push(origin);
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(GitError::Diff)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_repo() -> (tempfile::TempDir, RepoInspector) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let filter = IgnoreFilter::from_patterns(dir.path(), ["*.log", "build/"]);
        let inspector = RepoInspector::with_filter(repo, filter).unwrap();
        (dir, inspector)
    }

    fn commit_file(inspector: &RepoInspector, name: &str, content: &str) {
        let repo = inspector.repository();
        std::fs::write(inspector.workdir().join(name), content).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = git2::Signature::now("Test", "test@test.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &parents)
            .unwrap();
    }

    #[test]
    fn test_modified_file_display() {
        let file = ModifiedFile {
            path: "src/lib.rs".to_string(),
            staged: true,
            unstaged: true,
            untracked: false,
        };
        assert_eq!(file.to_string(), "src/lib.rs (staged, unstaged)");
    }

    #[test]
    fn test_diff_record_render() {
        let record = DiffRecord {
            path: "a.txt".to_string(),
            diff: "+hello".to_string(),
        };
        assert_eq!(record.render(), "File: a.txt\n+hello");
    }

    #[test]
    fn test_clean_repo_has_no_modified_files() {
        let (_dir, inspector) = init_repo();
        commit_file(&inspector, "a.txt", "a\n");
        assert!(inspector.list_modified_files().unwrap().is_empty());
    }

    #[test]
    fn test_list_classifies_staged_unstaged_untracked() {
        let (dir, inspector) = init_repo();
        commit_file(&inspector, "tracked.txt", "one\n");
        commit_file(&inspector, "staged.txt", "one\n");

        std::fs::write(dir.path().join("tracked.txt"), "two\n").unwrap();
        std::fs::write(dir.path().join("staged.txt"), "two\n").unwrap();
        let mut index = inspector.repository().index().unwrap();
        index.add_path(Path::new("staged.txt")).unwrap();
        index.write().unwrap();
        std::fs::write(dir.path().join("new.txt"), "fresh\n").unwrap();

        let files = inspector.list_modified_files().unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["new.txt", "staged.txt", "tracked.txt"]);

        assert!(files[0].untracked && !files[0].staged);
        assert!(files[1].staged && !files[1].unstaged);
        assert!(files[2].unstaged && !files[2].staged);
    }

    #[test]
    fn test_list_applies_ignore_filter() {
        let (dir, inspector) = init_repo();
        std::fs::write(dir.path().join("debug.log"), "x\n").unwrap();
        std::fs::create_dir_all(dir.path().join("build")).unwrap();
        std::fs::write(dir.path().join("build/out.bin"), "x\n").unwrap();
        std::fs::write(dir.path().join("main.rs"), "fn main() {}\n").unwrap();

        let files = inspector.list_modified_files().unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["main.rs"]);
    }

    #[test]
    fn test_untracked_file_diff_has_new_file_header() {
        let (dir, inspector) = init_repo();
        std::fs::write(dir.path().join("new.txt"), "hello world\n").unwrap();

        let diff = inspector.file_diff("new.txt");
        assert_eq!(diff, "New file: new.txt\nhello world\n");
    }

    #[test]
    fn test_unstaged_modification_diff() {
        let (dir, inspector) = init_repo();
        commit_file(&inspector, "file.txt", "original\n");
        std::fs::write(dir.path().join("file.txt"), "modified\n").unwrap();

        let diff = inspector.file_diff("file.txt");
        assert!(diff.starts_with("Unstaged changes in file.txt:"));
        assert!(diff.contains("-original"));
        assert!(diff.contains("+modified"));
        assert!(!diff.contains("Staged changes"));
    }

    #[test]
    fn test_staged_and_unstaged_sections_are_combined() {
        let (dir, inspector) = init_repo();
        commit_file(&inspector, "file.txt", "v1\n");

        std::fs::write(dir.path().join("file.txt"), "v2\n").unwrap();
        let mut index = inspector.repository().index().unwrap();
        index.add_path(Path::new("file.txt")).unwrap();
        index.write().unwrap();
        std::fs::write(dir.path().join("file.txt"), "v3\n").unwrap();

        let diff = inspector.file_diff("file.txt");
        let staged_at = diff.find("Staged changes in file.txt:").unwrap();
        let unstaged_at = diff.find("Unstaged changes in file.txt:").unwrap();
        assert!(staged_at < unstaged_at);
        assert!(diff.contains("+v2"));
        assert!(diff.contains("+v3"));
        assert_eq!(diff, diff.trim());
    }

    #[test]
    fn test_diff_is_scoped_to_requested_path() {
        let (dir, inspector) = init_repo();
        commit_file(&inspector, "a.txt", "a\n");
        commit_file(&inspector, "b.txt", "b\n");
        std::fs::write(dir.path().join("a.txt"), "a2\n").unwrap();
        std::fs::write(dir.path().join("b.txt"), "b2\n").unwrap();

        let diff = inspector.file_diff("a.txt");
        assert!(diff.contains("+a2"));
        assert!(!diff.contains("+b2"));
    }

    #[test]
    fn test_unreadable_untracked_file_reports_inline_error() {
        let (dir, inspector) = init_repo();
        std::fs::write(dir.path().join("blob.bin"), [0xffu8, 0xfe, 0x00, 0x80]).unwrap();

        let diff = inspector.file_diff("blob.bin");
        assert!(diff.starts_with("Error getting diff for blob.bin:"));
    }

    #[test]
    fn test_open_rejects_non_repository() {
        let dir = tempfile::tempdir().unwrap();
        let result = RepoInspector::open(dir.path());
        assert!(matches!(result, Err(GitError::OpenRepository(_))));
    }

    #[test]
    fn test_commit_changes_rejects_empty_message() {
        let (dir, inspector) = init_repo();
        std::fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        assert!(matches!(
            inspector.commit_changes("   "),
            Err(CommitError::EmptyMessage)
        ));
    }

    #[test]
    fn test_commit_changes_without_changes_fails() {
        let (dir, inspector) = init_repo();
        std::fs::write(dir.path().join("only.log"), "ignored\n").unwrap();
        assert!(matches!(
            inspector.commit_changes("chore: nothing"),
            Err(CommitError::NoChanges)
        ));
    }
}
