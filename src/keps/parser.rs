use super::proposal::Proposal;
use anyhow::{Context, Result, bail};

const FENCE: &str = "---";

/// Parse the contents of a `kep.yaml` file
pub fn parse_kep_yaml(content: &str) -> Result<Proposal> {
    serde_yaml::from_str(content).context("invalid KEP metadata")
}

/// Parse the YAML front matter of a single-file Markdown KEP
///
/// The metadata block must open the document with a `---` line and be
/// closed by the next `---` line.
pub fn parse_front_matter(content: &str) -> Result<Proposal> {
    let mut lines = content.trim_start().lines();
    if lines.next().map(str::trim_end) != Some(FENCE) {
        bail!("missing front matter: document does not start with '{}'", FENCE);
    }

    let mut metadata = Vec::new();
    let mut closed = false;
    for line in lines {
        if line.trim_end() == FENCE {
            closed = true;
            break;
        }
        metadata.push(line);
    }
    if !closed {
        bail!("unterminated front matter: no closing '{}'", FENCE);
    }

    parse_kep_yaml(&metadata.join("\n"))
}
