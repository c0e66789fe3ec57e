//! Report rendering
//!
//! The table renderer prints the selected columns aligned under a header row;
//! the JSON and YAML renderers serialize the full proposals.

use crate::keps::Proposal;
use clap::ValueEnum;
use std::io::{self, Write};
use std::str::FromStr;

/// A report column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    LastUpdated,
    Stage,
    Status,
    Sig,
    Authors,
    Title,
    Link,
}

/// Columns of the query report
pub const DEFAULT_COLUMNS: [Column; 7] = [
    Column::LastUpdated,
    Column::Stage,
    Column::Status,
    Column::Sig,
    Column::Authors,
    Column::Title,
    Column::Link,
];

impl Column {
    pub fn header(&self) -> &'static str {
        match self {
            Column::LastUpdated => "LastUpdated",
            Column::Stage => "Stage",
            Column::Status => "Status",
            Column::Sig => "SIG",
            Column::Authors => "Authors",
            Column::Title => "Title",
            Column::Link => "Link",
        }
    }

    pub fn value(&self, kep: &Proposal) -> String {
        match self {
            Column::LastUpdated => kep.last_updated_display(),
            Column::Stage => kep.stage.clone(),
            Column::Status => kep.status.clone(),
            Column::Sig => kep.owning_sig.clone(),
            Column::Authors => kep.authors_display(),
            Column::Title => kep.title.clone(),
            Column::Link => kep.link.clone(),
        }
    }
}

/// Writes a list of proposals
pub trait Renderer {
    fn render(&self, columns: &[Column], keps: &[Proposal], out: &mut dyn Write) -> io::Result<()>;
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn renderer(&self) -> Box<dyn Renderer> {
        match self {
            OutputFormat::Table => Box::new(TableRenderer),
            OutputFormat::Json => Box::new(JsonRenderer),
            OutputFormat::Yaml => Box::new(YamlRenderer),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            _ => Err(format!(
                "Invalid output format '{}'. Valid options are: table, json, yaml",
                s
            )),
        }
    }
}

/// Aligned plain-text table
pub struct TableRenderer;

const COLUMN_GAP: &str = "  ";

impl TableRenderer {
    fn write_row(out: &mut dyn Write, cells: &[String], widths: &[usize]) -> io::Result<()> {
        let mut line = String::new();
        for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
            if i + 1 == cells.len() {
                line.push_str(cell);
            } else {
                line.push_str(&format!("{:<width$}{}", cell, COLUMN_GAP, width = *width));
            }
        }
        writeln!(out, "{}", line.trim_end())
    }
}

impl Renderer for TableRenderer {
    fn render(&self, columns: &[Column], keps: &[Proposal], out: &mut dyn Write) -> io::Result<()> {
        let header: Vec<String> = columns.iter().map(|c| c.header().to_uppercase()).collect();
        let rows: Vec<Vec<String>> = keps
            .iter()
            .map(|kep| columns.iter().map(|c| c.value(kep)).collect())
            .collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        Self::write_row(out, &header, &widths)?;
        for row in &rows {
            Self::write_row(out, row, &widths)?;
        }
        Ok(())
    }
}

/// Pretty-printed JSON array of proposals
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, _columns: &[Column], keps: &[Proposal], out: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, keps)?;
        writeln!(out)
    }
}

/// YAML sequence of proposals
pub struct YamlRenderer;

impl Renderer for YamlRenderer {
    fn render(&self, _columns: &[Column], keps: &[Proposal], out: &mut dyn Write) -> io::Result<()> {
        let text = serde_yaml::to_string(keps).map_err(io::Error::other)?;
        out.write_all(text.as_bytes())
    }
}
