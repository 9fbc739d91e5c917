//! Local repository synchronisation through the `git` executable.
//!
//! Each discovered repository is cloned into `<clone_dir>/<name>` on first
//! sight and pulled on later runs. [`RepoSync`] is the seam the corpus
//! loader uses, so tests can substitute a fake that just writes files.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

/// Clone-or-update plus origin lookup for one local checkout.
pub trait RepoSync: Send + Sync {
    /// Make `dest` an up-to-date checkout of `url`: clone when absent or
    /// empty, pull when it is already a checkout. Any other existing
    /// directory is an error and is left untouched.
    fn sync(&self, url: &str, dest: &Path) -> Result<()>;

    /// The `origin` remote recorded in `repo_dir`, if it can be read.
    fn remote_url(&self, repo_dir: &Path) -> Option<String>;
}

/// [`RepoSync`] backed by the system `git`.
pub struct GitCli;

impl RepoSync for GitCli {
    fn sync(&self, url: &str, dest: &Path) -> Result<()> {
        if is_checkout(dest) {
            git_pull(dest)
        } else if dest.exists() && !is_empty_dir(dest)? {
            bail!(
                "{} exists but is not a git checkout; remove it to re-clone",
                dest.display()
            );
        } else {
            git_clone(url, dest)
        }
    }

    fn remote_url(&self, repo_dir: &Path) -> Option<String> {
        // Without this guard git walks up to an enclosing repository.
        if !is_checkout(repo_dir) {
            return None;
        }
        let output = Command::new("git")
            .arg("-C")
            .arg(repo_dir)
            .args(["config", "--get", "remote.origin.url"])
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if url.is_empty() {
            None
        } else {
            Some(url)
        }
    }
}

/// `dir` is the top of its own working tree.
fn is_checkout(dir: &Path) -> bool {
    dir.join(".git").exists()
}

fn is_empty_dir(dir: &Path) -> Result<bool> {
    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?;
    Ok(entries.next().is_none())
}

fn git_clone(url: &str, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create clone directory: {}", parent.display()))?;
    }

    let output = Command::new("git")
        .arg("clone")
        .arg(url)
        .arg(dest)
        .output()
        .with_context(|| "Failed to execute 'git clone'. Is git installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git clone failed: {}", stderr.trim());
    }

    Ok(())
}

fn git_pull(repo_dir: &Path) -> Result<()> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo_dir)
        .args(["pull", "--ff-only"])
        .output()
        .with_context(|| "Failed to execute 'git pull'")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git pull failed: {}", stderr.trim());
    }

    Ok(())
}

/// Local directory name for a clone URL: the last path segment with a
/// trailing `.git` removed.
///
/// Returns `None` when the URL has no usable last segment.
pub fn repo_name_from_url(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':']).next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_names() {
        assert_eq!(
            repo_name_from_url("https://github.com/dana/rocket.git").as_deref(),
            Some("rocket")
        );
        assert_eq!(
            repo_name_from_url("https://github.com/dana/garden").as_deref(),
            Some("garden")
        );
        assert_eq!(
            repo_name_from_url("git@github.com:dana/ledger.git").as_deref(),
            Some("ledger")
        );
        assert_eq!(
            repo_name_from_url("https://github.com/dana/site/").as_deref(),
            Some("site")
        );
        assert_eq!(repo_name_from_url("https://github.com/dana/.git"), None);
        assert_eq!(repo_name_from_url(""), None);
    }

    #[test]
    fn dotted_names_keep_inner_dots() {
        assert_eq!(
            repo_name_from_url("https://github.com/dana/dana.github.io.git").as_deref(),
            Some("dana.github.io")
        );
    }

    #[test]
    fn remote_url_of_plain_dir_is_none() {
        let dir = tempfile::tempdir().unwrap();
        // Not a repository; a missing git binary also yields None.
        assert_eq!(GitCli.remote_url(dir.path()), None);
    }

    // ============ Against real repositories ============

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git(dir: &Path, args: &[&str]) -> String {
        let output = Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(["-c", "user.name=Folio Test", "-c", "user.email=test@example.com"])
            .args(args)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    fn commit(work: &Path, readme: &str) -> String {
        std::fs::write(work.join("README.md"), readme).unwrap();
        git(work, &["add", "README.md"]);
        git(work, &["commit", "-q", "-m", "update readme"]);
        git(work, &["rev-parse", "HEAD"])
    }

    /// A working repository on branch `main` and a bare copy serving as the
    /// remote. Returns (work dir, bare repo URL).
    fn origin(root: &Path) -> (std::path::PathBuf, String) {
        let work = root.join("work");
        std::fs::create_dir_all(&work).unwrap();
        git(&work, &["init", "-q"]);
        git(&work, &["checkout", "-q", "-B", "main"]);
        commit(&work, "# Alpha\n\nfirst");
        let bare = root.join("origin.git");
        git(
            root,
            &["clone", "-q", "--bare", work.to_str().unwrap(), bare.to_str().unwrap()],
        );
        (work, bare.display().to_string())
    }

    #[test]
    fn clones_when_absent() {
        if !git_available() {
            return;
        }
        let root = tempfile::tempdir().unwrap();
        let (_work, url) = origin(root.path());
        let dest = root.path().join("repos").join("alpha");

        GitCli.sync(&url, &dest).unwrap();

        assert_eq!(
            std::fs::read_to_string(dest.join("README.md")).unwrap(),
            "# Alpha\n\nfirst"
        );
        assert_eq!(GitCli.remote_url(&dest).as_deref(), Some(url.as_str()));
    }

    #[test]
    fn clones_into_empty_dir() {
        if !git_available() {
            return;
        }
        let root = tempfile::tempdir().unwrap();
        let (_work, url) = origin(root.path());
        let dest = root.path().join("alpha");
        std::fs::create_dir_all(&dest).unwrap();

        GitCli.sync(&url, &dest).unwrap();
        assert!(dest.join(".git").exists());
    }

    #[test]
    fn pulls_existing_checkout() {
        if !git_available() {
            return;
        }
        let root = tempfile::tempdir().unwrap();
        let (work, url) = origin(root.path());
        let dest = root.path().join("alpha");
        GitCli.sync(&url, &dest).unwrap();

        let head = commit(&work, "# Alpha\n\nsecond");
        git(&work, &["push", "-q", &url, "main"]);

        GitCli.sync(&url, &dest).unwrap();
        assert_eq!(git(&dest, &["rev-parse", "HEAD"]), head);
        assert_eq!(
            std::fs::read_to_string(dest.join("README.md")).unwrap(),
            "# Alpha\n\nsecond"
        );
    }

    #[test]
    fn plain_dir_inside_another_checkout_is_rejected() {
        if !git_available() {
            return;
        }
        let root = tempfile::tempdir().unwrap();
        let (work, url) = origin(root.path());

        // An outer checkout that is one commit behind its remote.
        let outer = root.path().join("outer");
        git(
            root.path(),
            &["clone", "-q", &url, outer.to_str().unwrap()],
        );
        commit(&work, "# Alpha\n\nsecond");
        git(&work, &["push", "-q", &url, "main"]);
        let outer_head = git(&outer, &["rev-parse", "HEAD"]);

        let cache = outer.join("project_repos").join("alpha");
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(cache.join("README.md"), "# stale").unwrap();

        let err = GitCli.sync(&url, &cache).unwrap_err();
        assert!(err.to_string().contains("not a git checkout"));
        assert_eq!(git(&outer, &["rev-parse", "HEAD"]), outer_head);
        assert_eq!(GitCli.remote_url(&cache), None);
        assert_eq!(
            std::fs::read_to_string(cache.join("README.md")).unwrap(),
            "# stale"
        );
    }
}
