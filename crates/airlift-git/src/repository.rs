//! Git repository operations

use std::path::{Path, PathBuf};

use git2::{ErrorCode, IndexAddOption, Repository, Signature};
use tracing::{debug, info, instrument};

use airlift_core::error::GitError;

/// Result type for git operations
pub type Result<T> = std::result::Result<T, GitError>;

/// Git repository wrapper
pub struct GitRepo {
    pub(crate) repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open the repository at `path`, initializing one if it does not exist.
    /// Idempotent: an already-initialized repository is opened as-is.
    #[instrument(fields(path = %path.display()))]
    pub fn open_or_init(path: &Path) -> Result<Self> {
        match Repository::open(path) {
            Ok(repo) => {
                debug!(path = %path.display(), "opened existing git repository");
                Ok(Self {
                    path: path.to_path_buf(),
                    repo,
                })
            }
            Err(e) if e.code() == ErrorCode::NotFound => {
                info!(path = %path.display(), "initializing git repository");
                let repo = Repository::init(path).map_err(|e| GitError::InitFailed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
                Ok(Self {
                    path: path.to_path_buf(),
                    repo,
                })
            }
            Err(e) => Err(GitError::OpenFailed(e.to_string())),
        }
    }

    /// Get the repository path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Register a remote under `alias`, ignoring an already-registered one.
    /// The alias is derived from the URL, so an existing alias always points
    /// at the same URL.
    pub fn ensure_remote(&self, alias: &str, url: &str) -> Result<()> {
        match self.repo.find_remote(alias) {
            Ok(_) => {
                debug!(alias, "remote already registered");
                Ok(())
            }
            Err(e) if e.code() == ErrorCode::NotFound => {
                info!(alias, url, "registering remote");
                self.repo.remote(alias, url)?;
                Ok(())
            }
            Err(e) => Err(GitError::Git2(e)),
        }
    }

    /// Stage files for commit.
    ///
    /// With `include` empty the whole tree is staged. `exclude` pathspecs are
    /// then removed from the index only; files stay on disk (the equivalent
    /// of `git rm -r --cached`).
    #[instrument(skip(self))]
    pub fn stage(&self, include: &[String], exclude: &[String]) -> Result<()> {
        let mut index = self.repo.index().map_err(|e| GitError::StageFailed(e.to_string()))?;

        if include.is_empty() {
            index
                .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
                .map_err(|e| GitError::StageFailed(e.to_string()))?;
        } else {
            index
                .add_all(include.iter(), IndexAddOption::DEFAULT, None)
                .map_err(|e| GitError::StageFailed(e.to_string()))?;
        }

        for pattern in exclude {
            index
                .remove_all([pattern].iter(), None)
                .map_err(|e| GitError::StageFailed(e.to_string()))?;
        }

        index.write().map_err(|e| GitError::StageFailed(e.to_string()))?;
        Ok(())
    }

    /// Create a commit from the current index.
    ///
    /// Returns `None` when the index tree matches the parent commit's tree:
    /// nothing changed, which is a no-op rather than an error.
    #[instrument(skip(self, message))]
    pub fn commit(&self, message: &str) -> Result<Option<String>> {
        let mut index = self.repo.index().map_err(|e| GitError::CommitFailed(e.to_string()))?;
        let tree_id = index
            .write_tree()
            .map_err(|e| GitError::CommitFailed(e.to_string()))?;
        let tree = self.repo.find_tree(tree_id)?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => None,
            Err(e) => return Err(GitError::Git2(e)),
        };

        if let Some(ref parent) = parent {
            if parent.tree_id() == tree_id {
                info!("nothing to commit, working tree clean");
                return Ok(None);
            }
        }

        let sig = self.signature()?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .map_err(|e| GitError::CommitFailed(e.to_string()))?;

        info!(commit = %oid, "created commit");
        Ok(Some(oid.to_string()))
    }

    /// Move the current HEAD commit onto `branch` and switch HEAD to it
    /// (the equivalent of `git branch -M <branch>`).
    #[instrument(skip(self))]
    pub fn set_branch(&self, branch: &str) -> Result<()> {
        let head = self.repo.head().map_err(|e| GitError::BranchFailed {
            branch: branch.to_string(),
            reason: e.to_string(),
        })?;

        if head.shorthand() == Some(branch) {
            return Ok(());
        }

        let commit = head.peel_to_commit()?;
        self.repo
            .branch(branch, &commit, true)
            .map_err(|e| GitError::BranchFailed {
                branch: branch.to_string(),
                reason: e.to_string(),
            })?;
        self.repo
            .set_head(&format!("refs/heads/{}", branch))
            .map_err(|e| GitError::BranchFailed {
                branch: branch.to_string(),
                reason: e.to_string(),
            })?;

        info!(branch, "moved HEAD to branch");
        Ok(())
    }

    /// Current branch shorthand, if HEAD points at a branch
    pub fn current_branch(&self) -> Result<Option<String>> {
        match self.repo.head() {
            Ok(head) => Ok(head.shorthand().map(|s| s.to_string())),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                Ok(None)
            }
            Err(e) => Err(GitError::Git2(e)),
        }
    }

    fn signature(&self) -> Result<Signature<'static>> {
        // Falls back to a tool identity when user.name/user.email are unset
        self.repo
            .signature()
            .or_else(|_| Signature::now("airlift", "airlift@localhost"))
            .map_err(GitError::Git2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_or_init_creates_repo() {
        let temp = TempDir::new().unwrap();
        let repo = GitRepo::open_or_init(temp.path()).unwrap();
        assert!(repo.path().join(".git").exists());
    }

    #[test]
    fn test_open_or_init_is_idempotent() {
        let temp = TempDir::new().unwrap();
        GitRepo::open_or_init(temp.path()).unwrap();
        std::fs::write(temp.path().join("file.txt"), "content").unwrap();
        // Reopening must not reinitialize or lose state
        let repo = GitRepo::open_or_init(temp.path()).unwrap();
        assert!(repo.path().join("file.txt").exists());
    }

    #[test]
    fn test_ensure_remote_ignores_existing() {
        let temp = TempDir::new().unwrap();
        let repo = GitRepo::open_or_init(temp.path()).unwrap();

        repo.ensure_remote("origin_abc123", "https://github.com/acme/app.git")
            .unwrap();
        repo.ensure_remote("origin_abc123", "https://github.com/acme/app.git")
            .unwrap();

        assert_eq!(repo.repo.remotes().unwrap().len(), 1);
    }

    #[test]
    fn test_commit_then_noop() {
        let temp = TempDir::new().unwrap();
        let repo = GitRepo::open_or_init(temp.path()).unwrap();
        std::fs::write(temp.path().join("main.dart"), "void main() {}").unwrap();

        repo.stage(&[], &[]).unwrap();
        let first = repo.commit("Initial commit").unwrap();
        assert!(first.is_some());

        repo.stage(&[], &[]).unwrap();
        let second = repo.commit("Initial commit").unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn test_exclude_keeps_file_on_disk() {
        let temp = TempDir::new().unwrap();
        let repo = GitRepo::open_or_init(temp.path()).unwrap();
        std::fs::write(temp.path().join("main.dart"), "void main() {}").unwrap();
        std::fs::write(temp.path().join("secrets.env"), "TOKEN=x").unwrap();

        repo.stage(&[], &["secrets.env".to_string()]).unwrap();
        repo.commit("Initial commit").unwrap();

        // Excluded file stays on disk but is absent from the commit tree
        assert!(temp.path().join("secrets.env").exists());
        let head = repo.repo.head().unwrap().peel_to_tree().unwrap();
        assert!(head.get_name("secrets.env").is_none());
        assert!(head.get_name("main.dart").is_some());
    }

    #[test]
    fn test_include_stages_only_matching() {
        let temp = TempDir::new().unwrap();
        let repo = GitRepo::open_or_init(temp.path()).unwrap();
        std::fs::create_dir_all(temp.path().join("lib")).unwrap();
        std::fs::write(temp.path().join("lib/app.dart"), "class App {}").unwrap();
        std::fs::write(temp.path().join("notes.txt"), "scratch").unwrap();

        repo.stage(&["lib".to_string()], &[]).unwrap();
        repo.commit("Initial commit").unwrap();

        let head = repo.repo.head().unwrap().peel_to_tree().unwrap();
        assert!(head.get_name("lib").is_some());
        assert!(head.get_name("notes.txt").is_none());
    }

    #[test]
    fn test_set_branch_renames() {
        let temp = TempDir::new().unwrap();
        let repo = GitRepo::open_or_init(temp.path()).unwrap();
        std::fs::write(temp.path().join("file.txt"), "content").unwrap();
        repo.stage(&[], &[]).unwrap();
        repo.commit("Initial commit").unwrap();

        repo.set_branch("release").unwrap();
        assert_eq!(repo.current_branch().unwrap().as_deref(), Some("release"));

        // Already on the branch: a second call is a no-op
        repo.set_branch("release").unwrap();
        assert_eq!(repo.current_branch().unwrap().as_deref(), Some("release"));
    }
}
