//! Staging and committing a set of working-tree paths.

use std::path::Path;

use git2::{ErrorCode, Oid, Repository};
use tracing::debug;

use crate::error::CommitError;

/// Stage `paths` and create a commit on HEAD.
///
/// Paths still present in the working tree are added; missing ones are
/// removed from the index. On an unborn branch the commit has no parent.
/// Fails with [`CommitError::NoChanges`] when the staged tree is the same
/// as HEAD's (or empty on an unborn branch).
pub fn stage_and_commit(
    repo: &Repository,
    paths: &[String],
    message: &str,
) -> Result<Oid, CommitError> {
    let workdir = repo
        .workdir()
        .ok_or_else(|| CommitError::StagingFailed(git2::Error::from_str("bare repository")))?;

    let mut index = repo.index().map_err(CommitError::StagingFailed)?;
    for path in paths {
        let rel = Path::new(path);
        if workdir.join(rel).symlink_metadata().is_ok() {
            debug!("Staging {}", path);
            index.add_path(rel).map_err(CommitError::StagingFailed)?;
        } else {
            debug!("Staging removal of {}", path);
            index.remove_path(rel).map_err(CommitError::StagingFailed)?;
        }
    }
    index.write().map_err(CommitError::StagingFailed)?;

    let tree_id = index.write_tree().map_err(CommitError::StagingFailed)?;
    let tree = repo.find_tree(tree_id).map_err(CommitError::CommitFailed)?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit().map_err(CommitError::CommitFailed)?),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => None,
        Err(e) => return Err(CommitError::CommitFailed(e)),
    };

    // e.g. a file added to the index and then deleted from the working tree
    let unchanged = match &parent {
        Some(commit) => commit.tree_id() == tree_id,
        None => tree.is_empty(),
    };
    if unchanged {
        debug!("Staged tree matches HEAD, nothing to commit");
        return Err(CommitError::NoChanges);
    }

    let sig = repo.signature().map_err(CommitError::ConfigError)?;
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .map_err(CommitError::CommitFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;

    fn configured_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@test.com").unwrap();
        (dir, repo)
    }

    #[test]
    fn test_stage_and_commit_on_unborn_branch() {
        let (dir, repo) = configured_repo();
        std::fs::write(dir.path().join("a.txt"), "hello\n").unwrap();

        let oid = stage_and_commit(&repo, &["a.txt".to_string()], "feat: add a").unwrap();
        let commit = repo.find_commit(oid).unwrap();
        assert_eq!(commit.message().unwrap(), "feat: add a");
        assert_eq!(commit.parent_count(), 0);
        assert!(commit.tree().unwrap().get_name("a.txt").is_some());
    }

    #[test]
    fn test_stage_and_commit_only_listed_paths() {
        let (dir, repo) = configured_repo();
        let sig = Signature::now("Test User", "test@test.com").unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[]).unwrap();

        std::fs::write(dir.path().join("keep.txt"), "keep\n").unwrap();
        std::fs::write(dir.path().join("skip.txt"), "skip\n").unwrap();

        let oid = stage_and_commit(&repo, &["keep.txt".to_string()], "feat: keep").unwrap();
        let commit = repo.find_commit(oid).unwrap();
        assert_eq!(commit.parent_count(), 1);
        let tree = commit.tree().unwrap();
        assert!(tree.get_name("keep.txt").is_some());
        assert!(tree.get_name("skip.txt").is_none());
    }

    #[test]
    fn test_stage_and_commit_records_deletion() {
        let (dir, repo) = configured_repo();
        std::fs::write(dir.path().join("gone.txt"), "bye\n").unwrap();
        stage_and_commit(&repo, &["gone.txt".to_string()], "feat: add").unwrap();

        std::fs::remove_file(dir.path().join("gone.txt")).unwrap();
        let oid = stage_and_commit(&repo, &["gone.txt".to_string()], "chore: remove").unwrap();
        let tree = repo.find_commit(oid).unwrap().tree().unwrap();
        assert!(tree.get_name("gone.txt").is_none());
    }

    #[test]
    fn test_staged_then_deleted_file_is_no_change() {
        let (dir, repo) = configured_repo();
        std::fs::write(dir.path().join("base.txt"), "base\n").unwrap();
        let head = stage_and_commit(&repo, &["base.txt".to_string()], "feat: base").unwrap();

        std::fs::write(dir.path().join("tmp.txt"), "tmp\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("tmp.txt")).unwrap();
        index.write().unwrap();
        std::fs::remove_file(dir.path().join("tmp.txt")).unwrap();

        let err = stage_and_commit(&repo, &["tmp.txt".to_string()], "chore: tmp").unwrap_err();
        assert!(matches!(err, CommitError::NoChanges));
        assert_eq!(repo.head().unwrap().target(), Some(head));
    }

    #[test]
    fn test_staged_then_deleted_file_on_unborn_branch_is_no_change() {
        let (dir, repo) = configured_repo();
        std::fs::write(dir.path().join("tmp.txt"), "tmp\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("tmp.txt")).unwrap();
        index.write().unwrap();
        std::fs::remove_file(dir.path().join("tmp.txt")).unwrap();

        let err = stage_and_commit(&repo, &["tmp.txt".to_string()], "chore: tmp").unwrap_err();
        assert!(matches!(err, CommitError::NoChanges));
    }
}
