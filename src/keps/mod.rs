//! KEP domain model and parsing
//!
//! - `proposal`: the parsed `Proposal` record
//! - `parser`: `kep.yaml` and Markdown front-matter parsing
//! - `serde_impl`: lenient field deserializers for hand-written YAML

mod parser;
mod proposal;
mod serde_impl;

pub use parser::{parse_front_matter, parse_kep_yaml};
pub use proposal::{KNOWN_STAGES, KNOWN_STATUSES, Milestone, Proposal};
