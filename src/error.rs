//! Error taxonomy for the query pipeline
//!
//! Collaborators report failures as `anyhow::Error`. The query engine wraps
//! each fatal failure in a [`QueryError`] whose [`QueryErrorKind`] names the
//! phase that failed, so callers can tell them apart without matching on text.

use std::fmt;
use thiserror::Error;

/// Phase of the query pipeline that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryErrorKind {
    /// The enhancements repository could not be resolved
    SetupFailed,
    /// Listing the local KEPs of an owning SIG failed
    LocalEnumerationFailed,
    /// Searching GitHub for in-flight KEPs failed
    RemoteLookupFailed,
    /// Writing the report failed
    RenderFailed,
}

impl QueryErrorKind {
    /// Short human-readable context for this phase
    pub fn context(&self) -> &'static str {
        match self {
            QueryErrorKind::SetupFailed => "unable to search KEPs",
            QueryErrorKind::LocalEnumerationFailed => "unable to search for local KEPs",
            QueryErrorKind::RemoteLookupFailed => "unable to search for KEP PRs",
            QueryErrorKind::RenderFailed => "unable to print KEPs",
        }
    }
}

impl fmt::Display for QueryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.context())
    }
}

/// A fatal query failure: the failing phase plus its underlying cause
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct QueryError {
    kind: QueryErrorKind,
    #[source]
    source: anyhow::Error,
}

impl QueryError {
    pub fn new(kind: QueryErrorKind, source: impl Into<anyhow::Error>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    pub fn kind(&self) -> QueryErrorKind {
        self.kind
    }

    /// The wrapped cause
    pub fn cause(&self) -> &anyhow::Error {
        &self.source
    }
}
