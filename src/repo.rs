//! Enhancements repository location
//!
//! Resolves the checkout that holds `keps/` from an explicit path, the
//! settings, the enclosing git work tree or the GOPATH layout.

use crate::config::CommonArgs;
use crate::query::RepoLocator;
use anyhow::{Context, Result, bail};
use git2::Repository;
use std::path::{Path, PathBuf};

/// Directory holding the KEPs inside the enhancements repository
pub const KEPS_DIR: &str = "keps";

/// Locates the enhancements repository on disk
///
/// Candidates in order: the `--repo-path` argument, the configured path
/// (`ENHANCEMENTS_PATH` included), a git work tree containing `keps/`
/// discovered from the current directory, and finally
/// `$GOPATH/src/k8s.io/enhancements`.
pub struct GitRepoLocator {
    configured: Option<PathBuf>,
    search_from: Option<PathBuf>,
}

impl GitRepoLocator {
    pub fn new(configured: Option<PathBuf>) -> Self {
        Self {
            configured,
            search_from: std::env::current_dir().ok(),
        }
    }

    /// Discover from `dir` instead of the current directory
    pub fn with_search_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.search_from = dir;
        self
    }

    /// Find the git work tree containing the given path
    fn find_work_tree(dir: &Path) -> Option<PathBuf> {
        let repo = Repository::discover(dir).ok()?;
        repo.workdir().map(Path::to_path_buf)
    }

    fn discovered(&self) -> Option<PathBuf> {
        let root = Self::find_work_tree(self.search_from.as_deref()?)?;
        root.join(KEPS_DIR).is_dir().then_some(root)
    }

    fn gopath_default() -> Option<PathBuf> {
        let gopath = match std::env::var_os("GOPATH").filter(|v| !v.is_empty()) {
            Some(p) => PathBuf::from(p),
            None => dirs::home_dir()?.join("go"),
        };
        Some(gopath.join("src").join("k8s.io").join("enhancements"))
    }

    fn check(dir: &Path) -> Result<PathBuf> {
        let meta = std::fs::metadata(dir)
            .with_context(|| format!("unable to find enhancements repo at {}", dir.display()))?;
        if !meta.is_dir() {
            bail!("enhancements repo path {} is not a directory", dir.display());
        }

        // a path inside a checkout resolves to the checkout root
        match Self::find_work_tree(dir) {
            Some(root) if root.join(KEPS_DIR).is_dir() => Ok(root),
            _ => Ok(dir.to_path_buf()),
        }
    }
}

impl RepoLocator for GitRepoLocator {
    fn resolve(&self, args: &CommonArgs) -> Result<PathBuf> {
        if let Some(dir) = args.repo_path.as_deref().or(self.configured.as_deref()) {
            return Self::check(dir);
        }
        if let Some(root) = self.discovered() {
            tracing::debug!(path = %root.display(), "using enhancements repo from working directory");
            return Ok(root);
        }
        match Self::gopath_default() {
            Some(dir) => Self::check(&dir),
            None => bail!("unable to find enhancements repo: no repo path given and no home directory"),
        }
    }
}
