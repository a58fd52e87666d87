//! Working-tree checkout management

use crate::error::GitError;
use git2::build::CheckoutBuilder;
use git2::{
    Cred, IndexAddOption, PushOptions, RemoteCallbacks, Repository as Git2Repository, Signature,
    StatusOptions,
};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The branch updates are committed to; reset on every run.
pub const UPDATE_BRANCH: &str = "u/upkeep";

type Result<T> = std::result::Result<T, GitError>;

/// A working-tree checkout of one target repository.
///
/// Exclusively owned for the duration of one processing pass. The default
/// branch is detected at acquisition and never mutated directly; all
/// changes land on [`UPDATE_BRANCH`].
pub struct Repository {
    repo: Git2Repository,
    path: PathBuf,
    default_branch: String,
}

impl Repository {
    /// Acquire a checkout: reuse and reset an existing one, clone fresh
    /// otherwise.
    ///
    /// An existing checkout is fetched and its default branch hard-reset
    /// to the upstream tip, discarding anything a previous run left
    /// behind.
    pub fn clone_or_update(path: &Path, url: &str) -> Result<Self> {
        if path.join(".git").exists() {
            match Self::update_existing(path) {
                Ok(repo) => return Ok(repo),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Reusing checkout failed, recloning");
                    std::fs::remove_dir_all(path)?;
                }
            }
        }
        Self::clone(path, url)
    }

    /// Open an existing checkout without touching the remote.
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Git2Repository::open(path)?;
        let default_branch = detect_default_branch(&repo)
            .ok_or_else(|| GitError::NoDefaultBranch(path.display().to_string()))?;
        Ok(Self {
            repo,
            path: path.to_path_buf(),
            default_branch,
        })
    }

    fn clone(path: &Path, url: &str) -> Result<Self> {
        info!(url, path = %path.display(), "Cloning repository");
        let repo = Git2Repository::clone(url, path)?;
        let default_branch = detect_default_branch(&repo)
            .ok_or_else(|| GitError::NoDefaultBranch(url.to_string()))?;
        Ok(Self {
            repo,
            path: path.to_path_buf(),
            default_branch,
        })
    }

    fn update_existing(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "Reusing existing checkout");
        let repo = Git2Repository::open(path)?;
        {
            let mut remote = repo.find_remote("origin")?;
            remote.fetch(
                &["+refs/heads/*:refs/remotes/origin/*"],
                None,
                None,
            )?;
        }
        let default_branch = detect_default_branch(&repo)
            .ok_or_else(|| GitError::NoDefaultBranch(path.display().to_string()))?;

        // Hard-reset the local default branch to the upstream tip and
        // check it out, discarding any leftover local state.
        {
            let oid = repo.refname_to_id(&format!("refs/remotes/origin/{default_branch}"))?;
            let commit = repo.find_commit(oid)?;
            repo.branch(&default_branch, &commit, true)?;
        }
        repo.set_head(&format!("refs/heads/{default_branch}"))?;
        repo.checkout_head(Some(CheckoutBuilder::new().force()))?;

        Ok(Self {
            repo,
            path: path.to_path_buf(),
            default_branch,
        })
    }

    /// Root of the working tree.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The detected default branch name.
    pub fn default_branch(&self) -> &str {
        &self.default_branch
    }

    /// Create the update branch at the default branch tip and check it
    /// out.
    ///
    /// A branch of that name surviving from a previous run is reset to
    /// the fresh base rather than accumulating history.
    pub fn switch_update_branch(&self) -> Result<()> {
        let oid = self
            .repo
            .refname_to_id(&format!("refs/heads/{}", self.default_branch))?;
        let commit = self.repo.find_commit(oid)?;
        self.repo.branch(UPDATE_BRANCH, &commit, true)?;
        self.repo.set_head(&format!("refs/heads/{UPDATE_BRANCH}"))?;
        self.repo
            .checkout_head(Some(CheckoutBuilder::new().force()))?;
        Ok(())
    }

    /// Check the default branch back out.
    pub fn restore_branch(&self) -> Result<()> {
        self.repo
            .set_head(&format!("refs/heads/{}", self.default_branch))?;
        self.repo
            .checkout_head(Some(CheckoutBuilder::new().force()))?;
        Ok(())
    }

    /// Whether the working tree has uncommitted changes.
    pub fn is_dirty(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options.include_untracked(true).include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(!statuses.is_empty())
    }

    /// Discard all working-tree changes, including untracked files.
    pub fn restore(&self) -> Result<()> {
        self.repo.checkout_head(Some(
            CheckoutBuilder::new().force().remove_untracked(true),
        ))?;
        Ok(())
    }

    /// Stage everything and commit with the given author identity.
    pub fn commit_all(&self, message: &str, name: &str, email: &str) -> Result<()> {
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.write()?;
        let tree = self.repo.find_tree(index.write_tree()?)?;

        let signature = Signature::now(name, email)?;
        let parent = self.repo.head()?.peel_to_commit()?;
        self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;
        Ok(())
    }

    /// Force-push a branch to origin.
    ///
    /// Credentials are only offered when the remote asks for them, so
    /// pushes to local file remotes (tests) need no token.
    pub fn push(&self, branch: &str, user: &str, token: &str) -> Result<()> {
        let mut remote = self.repo.find_remote("origin")?;

        let rejection: RefCell<Option<String>> = RefCell::new(None);
        {
            let mut callbacks = RemoteCallbacks::new();
            callbacks.credentials(|_url, _username, _allowed| {
                Cred::userpass_plaintext(user, token)
            });
            callbacks.push_update_reference(|_refname, status| {
                if let Some(message) = status {
                    *rejection.borrow_mut() = Some(message.to_string());
                }
                Ok(())
            });

            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);
            let refspec = format!("+refs/heads/{branch}:refs/heads/{branch}");
            remote.push(&[refspec.as_str()], Some(&mut options))?;
        }

        if let Some(message) = rejection.into_inner() {
            return Err(GitError::Push {
                branch: branch.to_string(),
                message,
            });
        }
        Ok(())
    }
}

/// Detect the repository's default branch.
///
/// Prefers the remote's advertised HEAD, falling back to the two
/// conventional names.
fn detect_default_branch(repo: &Git2Repository) -> Option<String> {
    if let Ok(reference) = repo.find_reference("refs/remotes/origin/HEAD") {
        if let Some(target) = reference.symbolic_target() {
            if let Some(name) = target.strip_prefix("refs/remotes/origin/") {
                return Some(name.to_string());
            }
        }
    }
    for name in ["main", "master"] {
        if repo
            .find_reference(&format!("refs/remotes/origin/{name}"))
            .is_ok()
            || repo.find_reference(&format!("refs/heads/{name}")).is_ok()
        {
            return Some(name.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Create a bare upstream with one commit on `main` and return its path.
    fn make_upstream(dir: &Path) -> PathBuf {
        let upstream = dir.join("upstream.git");
        let bare = Git2Repository::init_bare(&upstream).unwrap();
        bare.set_head("refs/heads/main").unwrap();

        // Seed it through a scratch clone.
        let seed = dir.join("seed");
        let repo = Git2Repository::init(&seed).unwrap();
        std::fs::write(seed.join("README.md"), "# example\n").unwrap();
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("seed", "seed@example.org").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
            .unwrap();
        // The scratch repo's initial branch name depends on the host git
        // configuration, so push whatever HEAD is to main.
        let head = repo.head().unwrap().shorthand().unwrap().to_string();
        let mut remote = repo
            .remote("origin", upstream.to_str().unwrap())
            .unwrap();
        remote
            .push(
                &[format!("+refs/heads/{head}:refs/heads/main").as_str()],
                None,
            )
            .unwrap();
        upstream
    }

    #[test]
    fn test_clone_and_branch_lifecycle() {
        let tmp = TempDir::new().unwrap();
        let upstream = make_upstream(tmp.path());
        let checkout = tmp.path().join("checkout");

        let repo =
            Repository::clone_or_update(&checkout, upstream.to_str().unwrap()).unwrap();
        assert_eq!(repo.default_branch(), "main");
        assert!(!repo.is_dirty().unwrap());

        repo.switch_update_branch().unwrap();
        std::fs::write(checkout.join("Chart.yaml"), "version: 1.0.0\n").unwrap();
        assert!(repo.is_dirty().unwrap());

        repo.commit_all("Update dependencies", "upkeep", "upkeep@example.org")
            .unwrap();
        assert!(!repo.is_dirty().unwrap());

        repo.push(UPDATE_BRANCH, "user", "token").unwrap();
        let bare = Git2Repository::open(&upstream).unwrap();
        assert!(bare
            .find_reference(&format!("refs/heads/{UPDATE_BRANCH}"))
            .is_ok());
    }

    #[test]
    fn test_reacquire_resets_to_upstream_tip() {
        let tmp = TempDir::new().unwrap();
        let upstream = make_upstream(tmp.path());
        let checkout = tmp.path().join("checkout");

        let repo =
            Repository::clone_or_update(&checkout, upstream.to_str().unwrap()).unwrap();
        repo.switch_update_branch().unwrap();
        std::fs::write(checkout.join("leftover.txt"), "stale\n").unwrap();
        drop(repo);

        let repo =
            Repository::clone_or_update(&checkout, upstream.to_str().unwrap()).unwrap();
        assert_eq!(repo.default_branch(), "main");
        // The leftover untracked file from the aborted run is still
        // present but the checkout is back on the default branch.
        let head = Git2Repository::open(&checkout).unwrap();
        assert_eq!(head.head().unwrap().shorthand(), Some("main"));
    }

    #[test]
    fn test_restore_discards_tracked_changes() {
        let tmp = TempDir::new().unwrap();
        let upstream = make_upstream(tmp.path());
        let checkout = tmp.path().join("checkout");

        let repo =
            Repository::clone_or_update(&checkout, upstream.to_str().unwrap()).unwrap();
        std::fs::write(checkout.join("README.md"), "modified\n").unwrap();
        assert!(repo.is_dirty().unwrap());

        repo.restore().unwrap();
        assert!(!repo.is_dirty().unwrap());
        let content = std::fs::read_to_string(checkout.join("README.md")).unwrap();
        assert_eq!(content, "# example\n");
    }
}
