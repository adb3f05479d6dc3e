use crate::alias::table::{AliasTable, SEPARATOR};
use crate::error::{LineageError, Result};
use crate::types::{LineageDocument, LineageRow};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ANCHOR_STRAIN: &str = "B.1.1.529";

/// Rules applied when turning input rows into records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRules {
    /// Canonical name treated as parentless even though it is dotted
    pub anchor_strain: String,
    /// Placeholder date cells that mark a row as not yet populated
    pub date_sentinels: Vec<String>,
}

impl Default for RecordRules {
    fn default() -> Self {
        Self {
            anchor_strain: DEFAULT_ANCHOR_STRAIN.to_string(),
            date_sentinels: ["#N/A", "N/A", "#VALUE!", "#REF!", "nan", "NaN"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl RecordRules {
    pub fn parent_of(&self, canonical_name: &str) -> Option<String> {
        parent_of(canonical_name, &self.anchor_strain)
    }

    fn is_sentinel(&self, date: &str) -> bool {
        self.date_sentinels.iter().any(|s| s == date)
    }
}

/// Immediate parent of a canonical name: every segment but the last.
///
/// Undotted names and the anchor strain have no parent.
pub fn parent_of(canonical_name: &str, anchor_strain: &str) -> Option<String> {
    if canonical_name == anchor_strain {
        return None;
    }
    canonical_name
        .rsplit_once(SEPARATOR)
        .map(|(parent, _)| parent.to_string())
}

/// One admitted designation row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageRecord {
    designation_date: Option<String>,
    display_name: String,
    partial_name: String,
    canonical_name: String,
    parent_id: Option<String>,
}

impl LineageRecord {
    pub fn new(
        canonical_name: impl Into<String>,
        designation_date: Option<&str>,
        display_name: impl Into<String>,
        partial_name: impl Into<String>,
        rules: &RecordRules,
    ) -> Result<Self> {
        let canonical_name: String = canonical_name.into();
        let display_name: String = display_name.into();
        if canonical_name.is_empty() {
            return Err(LineageError::validation(display_name, "canonical name is empty"));
        }

        let designation_date = match designation_date.map(str::trim) {
            None | Some("") => None,
            Some(date) if rules.is_sentinel(date) => {
                return Err(LineageError::validation(
                    canonical_name,
                    format!("designation date '{}' is a placeholder", date),
                ));
            }
            Some(date) => Some(date.to_string()),
        };

        let parent_id = rules.parent_of(&canonical_name);
        Ok(Self {
            designation_date,
            display_name,
            partial_name: partial_name.into(),
            canonical_name,
            parent_id,
        })
    }

    /// Build a record from an input row, expanding the display name when the
    /// row carries no canonical form.
    ///
    /// Recombinant lineages are their own canonical roots, so a display name
    /// under a recombinant prefix is used as is.
    pub fn from_row(row: &LineageRow, rules: &RecordRules, aliases: &AliasTable) -> Result<Self> {
        let display_name = row.display_name.trim();
        let canonical_name = match row.canonical_name.trim() {
            "" => {
                let prefix = display_name.split(SEPARATOR).next().unwrap_or(display_name);
                if aliases.is_recombinant(prefix) {
                    display_name.to_string()
                } else {
                    aliases.decompress(display_name)
                }
            }
            name => name.to_string(),
        };

        Self::new(
            canonical_name,
            row.designation_date.as_deref(),
            display_name,
            row.partial_name.trim(),
            rules,
        )
    }

    pub fn id(&self) -> &str {
        &self.canonical_name
    }

    pub fn canonical_name(&self) -> &str {
        &self.canonical_name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn partial_name(&self) -> &str {
        &self.partial_name
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn designation_date(&self) -> Option<&str> {
        self.designation_date.as_deref()
    }

    /// Calendar date of designation, when the date cell holds one
    pub fn designated_on(&self) -> Option<NaiveDate> {
        let raw = self.designation_date.as_deref()?;
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
            .ok()
    }

    pub fn to_document(&self) -> LineageDocument {
        LineageDocument {
            display_name: self.display_name.clone(),
            partial_name: self.partial_name.clone(),
            canonical_name: self.canonical_name.clone(),
            designation_date: self.designation_date.clone(),
        }
    }
}
