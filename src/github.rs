//! GitHub lookup of in-flight KEPs
//!
//! An in-flight KEP is one that only exists in an open pull request against
//! the enhancements repository. Pull requests are matched by their
//! `kind/kep` and `sig/<name>` labels; the `kep.yaml` files they touch are
//! fetched and parsed.

use crate::config::{CommonArgs, GitHubSettings, Settings};
use crate::keps::{Proposal, parse_kep_yaml};
use crate::local::KEP_METADATA_FILE;
use crate::query::{RemoteFinder, SIG_PREFIX};
use crate::repo::KEPS_DIR;
use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, HeaderMap};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::fs;
use std::time::Duration;

pub const KEP_LABEL: &str = "kind/kep";
const PER_PAGE: usize = 100;
const GITHUB_JSON: &str = "application/vnd.github+json";
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// GitHub credentials for one query
///
/// Without a token the lookup still works, subject to the much lower
/// anonymous rate limit.
#[derive(Clone, Default)]
pub struct Credentials {
    token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Read the token file named by the arguments or settings, falling back
    /// to `GITHUB_TOKEN`. Never fails; problems are logged.
    pub fn from_args(args: &CommonArgs, settings: &Settings) -> Self {
        if let Some(path) = args.token_path.as_ref().or(settings.token_path.as_ref()) {
            match fs::read_to_string(path) {
                Ok(content) if !content.trim().is_empty() => {
                    return Self::with_token(content.trim());
                }
                Ok(_) => tracing::warn!(path = %path.display(), "GitHub token file is empty"),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "unable to read GitHub token file")
                }
            }
        }

        match std::env::var("GITHUB_TOKEN") {
            Ok(token) if !token.trim().is_empty() => Self::with_token(token.trim()),
            _ => Self::anonymous(),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestFile {
    pub filename: String,
    #[serde(default)]
    pub status: String,
    pub raw_url: Option<String>,
}

/// `sig-node` -> `sig/node`
pub fn sig_label(sig: &str) -> String {
    format!("sig/{}", sig.strip_prefix(SIG_PREFIX).unwrap_or(sig))
}

/// Whether a pull request carries both the KEP label and the SIG label
pub fn is_kep_pull_request(pr: &PullRequest, sig: &str) -> bool {
    let sig_label = sig_label(sig);
    let has = |wanted: &str| pr.labels.iter().any(|l| l.name == wanted);
    has(KEP_LABEL) && has(&sig_label)
}

/// Whether a changed file is the metadata of a KEP owned by `sig`
pub fn is_kep_metadata_file(file: &PullRequestFile, sig: &str) -> bool {
    let prefix = format!("{}/{}/", KEPS_DIR, sig);
    file.status != "removed"
        && file.filename.starts_with(&prefix)
        && file.filename.ends_with(&format!("/{}", KEP_METADATA_FILE))
}

/// 429 always; 403 only when the remaining quota is exhausted
fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    match status {
        StatusCode::TOO_MANY_REQUESTS => true,
        StatusCode::FORBIDDEN => headers
            .get(RATE_LIMIT_REMAINING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() == "0"),
        _ => false,
    }
}

/// Directory name of the KEP a metadata file belongs to
fn kep_name(filename: &str) -> String {
    filename
        .rsplit('/')
        .nth(1)
        .unwrap_or(filename)
        .to_string()
}

/// Remote finder backed by the GitHub REST API
pub struct GitHubFinder {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
}

impl GitHubFinder {
    pub fn new(settings: &GitHubSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .user_agent(concat!("kepctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build GitHub HTTP client")?;

        Ok(Self {
            client,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            owner: settings.owner.clone(),
            repo: settings.repo.clone(),
        })
    }

    fn request(&self, credentials: &Credentials, url: &str) -> RequestBuilder {
        let builder = self.client.get(url).header(ACCEPT, GITHUB_JSON);
        match credentials.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        credentials: &Credentials,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .request(credentials, url)
            .query(params)
            .send()
            .with_context(|| format!("GitHub request to {} failed", url))?;

        if is_rate_limited(response.status(), response.headers()) {
            bail!(
                "GitHub API rate limit exceeded ({}){}",
                response.status(),
                if credentials.token().is_none() {
                    "; provide a token with --gh-token-path or GITHUB_TOKEN"
                } else {
                    ""
                }
            );
        }

        response
            .error_for_status()
            .with_context(|| format!("GitHub request to {} failed", url))?
            .json::<T>()
            .with_context(|| format!("Failed to decode GitHub response from {}", url))
    }

    /// Fetch every page of a list endpoint
    fn get_all<T: DeserializeOwned>(
        &self,
        credentials: &Credentials,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut all = Vec::new();
        for page in 1.. {
            let mut query: Vec<(&str, String)> =
                params.iter().map(|(k, v)| (*k, v.to_string())).collect();
            query.push(("per_page", PER_PAGE.to_string()));
            query.push(("page", page.to_string()));

            let items: Vec<T> = self.get_json(credentials, url, &query)?;
            let last = items.len() < PER_PAGE;
            all.extend(items);
            if last {
                break;
            }
        }
        Ok(all)
    }

    fn open_pull_requests(&self, credentials: &Credentials) -> Result<Vec<PullRequest>> {
        let url = format!("{}/repos/{}/{}/pulls", self.api_url, self.owner, self.repo);
        self.get_all(credentials, &url, &[("state", "open")])
            .context("Failed to list open pull requests")
    }

    fn changed_files(&self, credentials: &Credentials, number: u64) -> Result<Vec<PullRequestFile>> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}/files",
            self.api_url, self.owner, self.repo, number
        );
        self.get_all(credentials, &url, &[])
            .with_context(|| format!("Failed to list files of pull request #{}", number))
    }

    fn raw_content(&self, credentials: &Credentials, raw_url: &str) -> Result<String> {
        self.request(credentials, raw_url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .with_context(|| format!("Failed to fetch {}", raw_url))
    }
}

impl RemoteFinder for GitHubFinder {
    fn find_in_flight(&self, credentials: &Credentials, sig: &str) -> Result<Vec<Proposal>> {
        let pulls = self.open_pull_requests(credentials)?;

        let mut keps = Vec::new();
        for pr in pulls.iter().filter(|pr| is_kep_pull_request(pr, sig)) {
            tracing::debug!(number = pr.number, title = %pr.title, "inspecting KEP pull request");

            let files = self.changed_files(credentials, pr.number)?;
            for file in files.iter().filter(|f| is_kep_metadata_file(f, sig)) {
                let Some(raw_url) = file.raw_url.as_deref() else {
                    continue;
                };
                let content = self.raw_content(credentials, raw_url)?;
                match parse_kep_yaml(&content) {
                    Ok(mut kep) => {
                        kep.name = kep_name(&file.filename);
                        kep.link = pr.html_url.clone();
                        kep.pr_number = Some(pr.number);
                        keps.push(kep);
                    }
                    Err(e) => tracing::warn!(
                        number = pr.number,
                        file = %file.filename,
                        error = %format!("{:#}", e),
                        "skipping unparsable KEP in pull request"
                    ),
                }
            }
        }
        Ok(keps)
    }
}
