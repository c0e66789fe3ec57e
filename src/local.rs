//! Local KEP storage
//!
//! KEPs live under `keps/<sig>/` either as a directory holding `kep.yaml`
//! or, for older proposals, as a single Markdown file with YAML front matter.

use crate::keps::{Proposal, parse_front_matter, parse_kep_yaml};
use crate::query::{LocalFinder, LocalReader};
use crate::repo::KEPS_DIR;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

pub const KEP_METADATA_FILE: &str = "kep.yaml";
const README_FILE: &str = "README.md";

/// Filesystem-backed finder and reader
#[derive(Debug, Clone)]
pub struct LocalKeps {
    docs_base_url: String,
}

impl LocalKeps {
    pub fn new(docs_base_url: &str) -> Self {
        Self {
            docs_base_url: docs_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn sig_dir(repo_path: &Path, sig: &str) -> PathBuf {
        repo_path.join(KEPS_DIR).join(sig)
    }

    fn is_markdown_kep(path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "md")
            && path.file_name().is_some_and(|name| name != README_FILE)
    }

    fn link(&self, sig: &str, name: &str) -> String {
        format!("{}/{}/{}/{}", self.docs_base_url, KEPS_DIR, sig, name)
    }
}

impl LocalFinder for LocalKeps {
    fn find_documents(&self, repo_path: &Path, sig: &str) -> Result<Vec<String>> {
        let dir = Self::sig_dir(repo_path, sig);
        // a SIG without a directory has no KEPs
        if !dir.exists() {
            tracing::debug!(path = %dir.display(), "no KEP directory for SIG");
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir)
            .with_context(|| format!("Failed to list {}", dir.display()))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
            let path = entry.path();
            let is_candidate = if path.is_dir() {
                path.join(KEP_METADATA_FILE).is_file()
            } else {
                Self::is_markdown_kep(&path)
            };
            if is_candidate {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

impl LocalReader for LocalKeps {
    fn read_document(&self, repo_path: &Path, sig: &str, name: &str) -> Result<Proposal> {
        let path = Self::sig_dir(repo_path, sig).join(name);

        let mut kep = if path.is_dir() {
            let file = path.join(KEP_METADATA_FILE);
            let content = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            parse_kep_yaml(&content).with_context(|| format!("in {}", file.display()))?
        } else if Self::is_markdown_kep(&path) {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            parse_front_matter(&content).with_context(|| format!("in {}", path.display()))?
        } else {
            bail!("{} is not a KEP", path.display());
        };

        kep.name = name.to_string();
        kep.link = self.link(sig, name);
        Ok(kep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_detection() {
        assert!(LocalKeps::is_markdown_kep(Path::new("keps/sig-node/0001-foo.md")));
        assert!(!LocalKeps::is_markdown_kep(Path::new("keps/sig-node/README.md")));
        assert!(!LocalKeps::is_markdown_kep(Path::new("keps/sig-node/OWNERS")));
    }

    #[test]
    fn test_link_trims_base_slash() {
        let local = LocalKeps::new("https://git.k8s.io/enhancements/");
        assert_eq!(
            local.link("sig-node", "753-sidecar-containers"),
            "https://git.k8s.io/enhancements/keps/sig-node/753-sidecar-containers"
        );
    }
}
