use crate::types::LineageRow;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Reader for the tab-separated designation table
#[derive(Debug, Clone)]
pub struct DesignationTable {
    path: PathBuf,
}

/// Column positions resolved from the header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    display: usize,
    partial: Option<usize>,
    canonical: Option<usize>,
    date: Option<usize>,
    of_interest: Option<usize>,
}

impl DesignationTable {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read and parse every row of the table
    pub fn load_rows(&self) -> Result<Vec<LineageRow>> {
        debug!("Loading designation table from: {:?}", self.path);

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read designation table from {:?}", self.path))?;

        let rows = Self::parse(&content)
            .with_context(|| format!("Failed to parse designation table {:?}", self.path))?;

        info!("Loaded {} designation rows", rows.len());
        Ok(rows)
    }

    /// Parse table text; the first non-blank line is the header
    pub fn parse(content: &str) -> Result<Vec<LineageRow>> {
        let mut lines = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let Some((_, header)) = lines.next() else {
            return Ok(Vec::new());
        };
        let columns = Columns::from_header(header)?;

        let mut rows = Vec::new();
        for (number, line) in lines {
            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            let field = |index: Option<usize>| {
                index
                    .and_then(|i| fields.get(i))
                    .map(|f| f.to_string())
                    .unwrap_or_default()
            };

            let display_name = field(Some(columns.display));
            if display_name.is_empty() {
                warn!("Skipping line {} without a lineage name", number + 1);
                continue;
            }

            let partial_name = match field(columns.partial) {
                partial if partial.is_empty() => display_name.clone(),
                partial => partial,
            };
            let designation_date = Some(field(columns.date)).filter(|d| !d.is_empty());
            let is_of_interest = match columns.of_interest {
                Some(_) => parse_flag(&field(columns.of_interest))
                    .with_context(|| format!("Invalid interest flag on line {}", number + 1))?,
                None => true,
            };

            rows.push(LineageRow {
                display_name,
                partial_name,
                canonical_name: field(columns.canonical),
                designation_date,
                is_of_interest,
            });
        }

        Ok(rows)
    }
}

impl Columns {
    fn from_header(header: &str) -> Result<Self> {
        let names: Vec<String> = header
            .split('\t')
            .map(|name| name.trim().to_lowercase().replace(['-', ' '], "_"))
            .collect();
        let find = |candidates: &[&str]| names.iter().position(|n| candidates.contains(&n.as_str()));

        let Some(display) = find(&["lineage", "pango", "display_name", "displayname"]) else {
            bail!("designation table header has no lineage column: {:?}", header);
        };

        Ok(Self {
            display,
            partial: find(&["partial", "partial_name", "partialname"]),
            canonical: find(&["unaliased", "canonical", "canonical_name", "canonicalname"]),
            date: find(&["designation_date", "designationdate", "date"]),
            of_interest: find(&["of_interest", "is_of_interest", "isofinterest"]),
        })
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "" | "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        other => bail!("expected a boolean, found '{}'", other),
    }
}
