//! KEP query engine
//!
//! Combines the KEPs found in a local enhancements checkout with in-flight
//! KEPs from open pull requests, filters them by status and stage, and hands
//! the result to a [`Renderer`]. Every collaborator sits behind a trait so
//! the pipeline can run against fakes.

use crate::config::{CommonArgs, Settings};
use crate::error::{QueryError, QueryErrorKind};
use crate::github::{Credentials, GitHubFinder};
use crate::keps::{KNOWN_STAGES, KNOWN_STATUSES, Proposal};
use crate::local::LocalKeps;
use crate::output::{DEFAULT_COLUMNS, OutputFormat, Renderer};
use crate::repo::GitRepoLocator;
use anyhow::Result;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Canonical prefix of owning-SIG identifiers
pub const SIG_PREFIX: &str = "sig-";

/// Finds the root of the enhancements repository
pub trait RepoLocator {
    fn resolve(&self, args: &CommonArgs) -> Result<PathBuf>;
}

/// Lists the KEP identifiers of one SIG in the local repository
pub trait LocalFinder {
    fn find_documents(&self, repo_path: &Path, sig: &str) -> Result<Vec<String>>;
}

/// Reads one local KEP
pub trait LocalReader {
    fn read_document(&self, repo_path: &Path, sig: &str, name: &str) -> Result<Proposal>;
}

/// Finds KEPs that only exist in open pull requests
pub trait RemoteFinder {
    fn find_in_flight(&self, credentials: &Credentials, sig: &str) -> Result<Vec<Proposal>>;
}

/// Give every SIG token the `sig-` prefix, keeping order
///
/// ```
/// use kepctl::query::normalize_sigs;
/// assert_eq!(
///     normalize_sigs(&["sig-api-machinery", "node"]),
///     vec!["sig-api-machinery", "sig-node"]
/// );
/// ```
pub fn normalize_sigs<S: AsRef<str>>(sigs: &[S]) -> Vec<String> {
    sigs.iter()
        .map(|s| {
            let s = s.as_ref();
            if s.starts_with(SIG_PREFIX) {
                s.to_string()
            } else {
                format!("{}{}", SIG_PREFIX, s)
            }
        })
        .collect()
}

/// Validated search criteria
///
/// SIGs are normalized on construction. Statuses and stages are matched
/// exactly and are not checked against the known values; unknown ones are
/// only reported at debug level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    sigs: Vec<String>,
    statuses: HashSet<String>,
    stages: HashSet<String>,
    include_prs: bool,
}

impl SearchCriteria {
    pub fn new(
        sigs: Vec<String>,
        statuses: Vec<String>,
        stages: Vec<String>,
        include_prs: bool,
    ) -> Self {
        for status in statuses.iter().filter(|s| !KNOWN_STATUSES.contains(&s.as_str())) {
            tracing::debug!(%status, "status is not one of the known KEP statuses");
        }
        for stage in stages.iter().filter(|s| !KNOWN_STAGES.contains(&s.as_str())) {
            tracing::debug!(%stage, "stage is not one of the known KEP stages");
        }

        Self {
            sigs: normalize_sigs(&sigs),
            statuses: statuses.into_iter().collect(),
            stages: stages.into_iter().collect(),
            include_prs,
        }
    }

    pub fn sigs(&self) -> &[String] {
        &self.sigs
    }

    pub fn statuses(&self) -> &HashSet<String> {
        &self.statuses
    }

    pub fn stages(&self) -> &HashSet<String> {
        &self.stages
    }

    pub fn include_prs(&self) -> bool {
        self.include_prs
    }
}

/// Keep the proposals whose status and stage are accepted
///
/// An empty acceptance set places no constraint on that field. Order is
/// preserved and duplicates are kept.
pub fn filter_proposals(
    mut proposals: Vec<Proposal>,
    statuses: &HashSet<String>,
    stages: &HashSet<String>,
) -> Vec<Proposal> {
    proposals.retain(|kep| {
        (statuses.is_empty() || statuses.contains(&kep.status))
            && (stages.is_empty() || stages.contains(&kep.stage))
    });
    proposals
}

/// Query client wiring the collaborators together
pub struct Client {
    settings: Settings,
    locator: Box<dyn RepoLocator>,
    finder: Box<dyn LocalFinder>,
    reader: Box<dyn LocalReader>,
    remote: Box<dyn RemoteFinder>,
    renderer: Box<dyn Renderer>,
}

impl Client {
    /// Create a client backed by the filesystem, git and GitHub
    pub fn new(settings: Settings, format: OutputFormat) -> Result<Self> {
        let local = LocalKeps::new(&settings.docs_base_url);
        let remote = GitHubFinder::new(&settings.github)?;
        Ok(Self {
            locator: Box::new(GitRepoLocator::new(settings.repo_path.clone())),
            finder: Box::new(local.clone()),
            reader: Box::new(local),
            remote: Box::new(remote),
            renderer: format.renderer(),
            settings,
        })
    }

    /// Create a client from explicit collaborators
    pub fn from_parts(
        settings: Settings,
        locator: Box<dyn RepoLocator>,
        finder: Box<dyn LocalFinder>,
        reader: Box<dyn LocalReader>,
        remote: Box<dyn RemoteFinder>,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        Self {
            settings,
            locator,
            finder,
            reader,
            remote,
            renderer,
        }
    }

    /// Collect and filter the KEPs matching `criteria`
    ///
    /// Progress goes to `out`, per-KEP read failures go to `err` and are
    /// otherwise skipped. Any other failure aborts the whole search.
    pub fn search(
        &self,
        criteria: &SearchCriteria,
        common: &CommonArgs,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<Vec<Proposal>, QueryError> {
        writeln!(out, "Searching for KEPs...").ok();

        let repo_path = self
            .locator
            .resolve(common)
            .map_err(|e| QueryError::new(QueryErrorKind::SetupFailed, e))?;
        tracing::debug!(repo = %repo_path.display(), "resolved enhancements repository");

        let credentials = Credentials::from_args(common, &self.settings);

        let mut all_keps = Vec::new();
        for sig in criteria.sigs() {
            let names = self
                .finder
                .find_documents(&repo_path, sig)
                .map_err(|e| QueryError::new(QueryErrorKind::LocalEnumerationFailed, e))?;
            tracing::debug!(%sig, count = names.len(), "found local KEPs");

            for name in &names {
                match self.reader.read_document(&repo_path, sig, name) {
                    Ok(kep) => all_keps.push(kep),
                    Err(e) => {
                        writeln!(err, "ERROR READING KEP {}: {:#}", name, e).ok();
                    }
                }
            }

            // existing KEPs with open PRs are listed twice
            if criteria.include_prs() {
                let pr_keps = self
                    .remote
                    .find_in_flight(&credentials, sig)
                    .map_err(|e| QueryError::new(QueryErrorKind::RemoteLookupFailed, e))?;
                tracing::debug!(%sig, count = pr_keps.len(), "found in-flight KEPs");
                all_keps.extend(pr_keps);
            }
        }

        Ok(filter_proposals(
            all_keps,
            criteria.statuses(),
            criteria.stages(),
        ))
    }

    /// Search and render the matching KEPs to `out`
    pub fn query(
        &self,
        criteria: &SearchCriteria,
        common: &CommonArgs,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<(), QueryError> {
        let keep = self.search(criteria, common, out, err)?;
        self.renderer
            .render(&DEFAULT_COLUMNS, &keep, out)
            .map_err(|e| QueryError::new(QueryErrorKind::RenderFailed, e))
    }
}
