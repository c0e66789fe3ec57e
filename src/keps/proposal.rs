use super::serde_impl::{lenient_date, null_default, string_or_number};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Status values used by the enhancements repository
pub const KNOWN_STATUSES: &[&str] = &[
    "provisional",
    "implementable",
    "implemented",
    "deferred",
    "rejected",
    "withdrawn",
    "replaced",
];

/// Stage values used by the enhancements repository
pub const KNOWN_STAGES: &[&str] = &["alpha", "beta", "stable"];

/// Target releases for each maturity stage
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Milestone {
    #[serde(deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub alpha: Option<String>,
    #[serde(deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub beta: Option<String>,
    #[serde(deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub stable: Option<String>,
}

/// One enhancement proposal
///
/// Field names follow the kebab-case keys of `kep.yaml`. `title`,
/// `owning-sig` and `status` are required; everything else defaults.
/// `name`, `link` and `pr_number` are never read from the document: they are
/// filled in by whichever collaborator located it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Proposal {
    pub title: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub kep_number: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub authors: Vec<String>,
    pub owning_sig: String,
    #[serde(default, deserialize_with = "null_default")]
    pub participating_sigs: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub reviewers: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub approvers: Vec<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub creation_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub last_updated: Option<NaiveDate>,
    pub status: String,
    #[serde(default, deserialize_with = "null_default")]
    pub stage: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub latest_milestone: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub milestone: Milestone,

    /// Directory or file name of the KEP within its SIG directory
    #[serde(default, skip_deserializing)]
    pub name: String,
    #[serde(default, skip_deserializing)]
    pub link: String,
    /// Pull request number for in-flight KEPs
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub pr_number: Option<u64>,
}

impl Proposal {
    /// Authors joined for display
    pub fn authors_display(&self) -> String {
        self.authors.join(", ")
    }

    /// Last-updated date for display, empty when unset
    pub fn last_updated_display(&self) -> String {
        self.last_updated
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }

    pub fn is_in_flight(&self) -> bool {
        self.pr_number.is_some()
    }
}
