//! kepctl Library
//!
//! Query Kubernetes enhancement proposals (KEPs) from a local checkout of the
//! enhancements repository, optionally including KEPs that only exist in
//! open GitHub pull requests, and render the matches as a report.
//!
//! # Architecture
//!
//! - **Surface Layer**: the `kepctl` binary and `KepServerHandler` (MCP)
//! - **Query Layer**: `query` module - criteria, orchestration and filtering
//! - **Collaborator Layer**: `repo`, `local`, `github` and `output` modules
//!
//! # Example
//!
//! ```no_run
//! use kepctl::{Client, CommonArgs, OutputFormat, SearchCriteria, Settings};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let client = Client::new(Settings::load(None)?, OutputFormat::Table)?;
//!     let criteria = SearchCriteria::new(vec!["node".into()], vec![], vec!["beta".into()], false);
//!     client.query(&criteria, &CommonArgs::default(), &mut std::io::stdout(), &mut std::io::stderr())?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod github;
pub mod keps;
pub mod local;
pub mod output;
pub mod query;
pub mod repo;

use anyhow::Result;
use mcp_attr::server::{McpServer, mcp_server};
use mcp_attr::{Result as McpResult, bail_public};

// Re-export commonly used types
pub use config::{CommonArgs, Settings};
pub use error::{QueryError, QueryErrorKind};
pub use keps::Proposal;
pub use output::OutputFormat;
pub use query::{Client, SearchCriteria, filter_proposals, normalize_sigs};

/// Split a comma separated list, dropping empty items
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Run one query against the real collaborators and return the report text
///
/// Per-KEP read errors are appended under a `Warnings:` heading.
pub fn run_query(
    settings: Settings,
    format: OutputFormat,
    criteria: &SearchCriteria,
    common: &CommonArgs,
) -> Result<String> {
    let client = Client::new(settings, format)?;
    let mut report = Vec::new();
    let mut diagnostics = Vec::new();
    client.query(criteria, common, &mut report, &mut diagnostics)?;

    let mut text = String::from_utf8_lossy(&report).into_owned();
    if !diagnostics.is_empty() {
        text.push_str("\nWarnings:\n");
        text.push_str(&String::from_utf8_lossy(&diagnostics));
    }
    Ok(text)
}

/// MCP Server handler for KEP queries
///
/// Holds only the settings; every tool call builds a fresh client and
/// credentials, so nothing is shared between queries.
pub struct KepServerHandler {
    pub(crate) settings: Settings,
    pub(crate) common: CommonArgs,
}

impl KepServerHandler {
    pub fn new(settings: Settings, common: CommonArgs) -> Self {
        Self { settings, common }
    }
}

/// Kubernetes enhancement proposal (KEP) search server.
///
/// KEPs are design documents owned by a SIG (e.g. sig-node, sig-api-machinery).
/// Each KEP has a status (provisional, implementable, implemented, deferred,
/// rejected, withdrawn, replaced) and a stage (alpha, beta, stable).
#[mcp_server]
impl McpServer for KepServerHandler {
    /// **KEP Query**: List KEPs owned by one or more SIGs, filtered by status and stage.
    /// **Note**: With include_prs, KEPs from open pull requests are listed too; a KEP with an open PR appears twice.
    #[tool]
    async fn query(
        &self,
        /// SIGs, comma separated (e.g., "node,sig-apps")
        sig: String,
        /// Statuses to keep, comma separated (e.g., "implementable"). Empty=all.
        status: Option<String>,
        /// Stages to keep, comma separated (e.g., "alpha,beta"). Empty=all.
        stage: Option<String>,
        /// Include KEPs from open GitHub pull requests (default: false)
        include_prs: Option<bool>,
        /// Output format: table/json/yaml (default: table)
        output: Option<String>,
    ) -> McpResult<String> {
        let format = match output.as_deref() {
            Some(s) => match s.parse::<OutputFormat>() {
                Ok(f) => f,
                Err(e) => bail_public!(_, "{}", e),
            },
            None => OutputFormat::default(),
        };

        let criteria = SearchCriteria::new(
            split_list(&sig),
            status.as_deref().map(split_list).unwrap_or_default(),
            stage.as_deref().map(split_list).unwrap_or_default(),
            include_prs.unwrap_or(false),
        );
        if criteria.sigs().is_empty() {
            bail_public!(_, "At least one SIG is required");
        }

        let settings = self.settings.clone();
        let common = self.common.clone();
        let result =
            tokio::task::spawn_blocking(move || run_query(settings, format, &criteria, &common))
                .await;

        match result {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => bail_public!(_, "{:#}", e),
            Err(e) => bail_public!(_, "Query task failed: {}", e),
        }
    }
}
