//! Configuration for kepctl
//!
//! Settings are read from a TOML file (by default
//! `<config dir>/kepctl/config.toml`) and then overridden from the
//! environment. A missing file is not an error; defaults apply.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GITHUB_OWNER: &str = "kubernetes";
pub const DEFAULT_GITHUB_REPO: &str = "enhancements";
pub const DEFAULT_DOCS_BASE_URL: &str = "https://git.k8s.io/enhancements";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Arguments shared by every kepctl command
#[derive(Debug, Clone, Default)]
pub struct CommonArgs {
    /// Path to a local checkout of the enhancements repository
    pub repo_path: Option<PathBuf>,
    /// File holding a GitHub API token
    pub token_path: Option<PathBuf>,
}

/// GitHub repository that holds the KEPs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubSettings {
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    pub request_timeout_secs: u64,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            owner: DEFAULT_GITHUB_OWNER.to_string(),
            repo: DEFAULT_GITHUB_REPO.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Top-level settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default enhancements repository checkout
    pub repo_path: Option<PathBuf>,
    /// Default GitHub token file
    pub token_path: Option<PathBuf>,
    /// Base URL used to link local KEPs
    pub docs_base_url: String,
    pub github: GitHubSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repo_path: None,
            token_path: None,
            docs_base_url: DEFAULT_DOCS_BASE_URL.to_string(),
            github: GitHubSettings::default(),
        }
    }
}

impl Settings {
    /// Default location of the settings file, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("kepctl").join("config.toml"))
    }

    /// Load settings from a TOML file; a missing file yields defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "settings file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        Ok(settings)
    }

    /// Load from `path`, or the default location when `None`, then apply
    /// environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::default_path() {
                Some(p) => Self::from_file(p)?,
                None => Self::default(),
            },
        };
        settings.merge_env();
        Ok(settings)
    }

    /// Apply `ENHANCEMENTS_PATH` and `KEPCTL_GITHUB_API_URL`
    pub fn merge_env(&mut self) {
        self.merge_from(|key| std::env::var(key).ok());
    }

    fn merge_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("ENHANCEMENTS_PATH").filter(|v| !v.is_empty()) {
            self.repo_path = Some(PathBuf::from(val));
        }
        if let Some(val) = lookup("KEPCTL_GITHUB_API_URL").filter(|v| !v.is_empty()) {
            self.github.api_url = val;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::from_file(dir.path().join("nope.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.github.owner, "kubernetes");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "repo_path = \"/src/enhancements\"\n\n[github]\nowner = \"me\""
        )
        .unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.repo_path, Some(PathBuf::from("/src/enhancements")));
        assert_eq!(settings.github.owner, "me");
        assert_eq!(settings.github.repo, "enhancements");
        assert_eq!(settings.docs_base_url, DEFAULT_DOCS_BASE_URL);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "repo_path = [").unwrap();
        assert!(Settings::from_file(file.path()).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings.merge_from(|key| match key {
            "ENHANCEMENTS_PATH" => Some("/env/enhancements".to_string()),
            "KEPCTL_GITHUB_API_URL" => Some(String::new()),
            _ => None,
        });
        assert_eq!(settings.repo_path, Some(PathBuf::from("/env/enhancements")));
        assert_eq!(settings.github.api_url, DEFAULT_GITHUB_API_URL);
    }
}
