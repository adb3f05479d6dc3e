use crate::alias::source::AliasSource;
use crate::error::{LineageError, Result};
use crate::types::AliasValue;
use std::collections::HashMap;
use tracing::{debug, info};

pub const SEPARATOR: char = '.';

/// Knobs for alias table construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasOptions {
    /// Leading character of recombinant lineage names
    pub recombinant_marker: char,
    /// Longest alias-to-alias chain accepted before the table is rejected
    pub max_depth: usize,
}

impl Default for AliasOptions {
    fn default() -> Self {
        Self {
            recombinant_marker: 'X',
            max_depth: 32,
        }
    }
}

/// Immutable mapping from compact alias codes to canonical lineage prefixes
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    simple: HashMap<String, String>,
    recombinant: HashMap<String, Vec<String>>,
    options: AliasOptions,
}

impl AliasTable {
    pub fn from_source(source: AliasSource) -> Result<Self> {
        Self::from_source_with(source, AliasOptions::default())
    }

    /// Build the table, rejecting malformed entries and cyclic expansions
    pub fn from_source_with(source: AliasSource, options: AliasOptions) -> Result<Self> {
        let mut simple: HashMap<String, String> = HashMap::new();
        let mut recombinant: HashMap<String, Vec<String>> = HashMap::new();

        for (alias, value) in source.without_empty_values() {
            if alias.is_empty() {
                return Err(LineageError::Configuration("empty alias key".to_string()));
            }

            match value {
                AliasValue::Single(prefix) => {
                    if let Some(existing) = simple.get(&alias) {
                        if *existing == prefix {
                            debug!("Ignoring repeated alias {} -> {}", alias, prefix);
                            continue;
                        }
                    }
                    if simple.contains_key(&alias) || recombinant.contains_key(&alias) {
                        return Err(duplicate(&alias));
                    }
                    simple.insert(alias, prefix);
                }
                AliasValue::Recombinant(prefixes) => {
                    if prefixes.is_empty() {
                        return Err(LineageError::Configuration(format!(
                            "recombinant alias '{}' has no parental lineages",
                            alias
                        )));
                    }
                    if prefixes.iter().any(|p| p.is_empty()) {
                        return Err(LineageError::Configuration(format!(
                            "recombinant alias '{}' lists an empty parental lineage",
                            alias
                        )));
                    }
                    if let Some(existing) = recombinant.get(&alias) {
                        if *existing == prefixes {
                            debug!("Ignoring repeated recombinant alias {}", alias);
                            continue;
                        }
                    }
                    if simple.contains_key(&alias) || recombinant.contains_key(&alias) {
                        return Err(duplicate(&alias));
                    }
                    recombinant.insert(alias, prefixes);
                }
            }
        }

        let table = Self {
            simple,
            recombinant,
            options,
        };
        table.check_acyclic()?;

        info!(
            "Alias table built with {} simple and {} recombinant aliases",
            table.simple.len(),
            table.recombinant.len()
        );
        Ok(table)
    }

    /// Expand a compact name into its canonical dotted form.
    ///
    /// Unknown prefixes are returned unchanged. Recombinant prefixes expand to
    /// the comma-joined expansions of every parental candidate, in table order.
    pub fn decompress(&self, name: &str) -> String {
        let Some((prefix, rest)) = name.split_once(SEPARATOR) else {
            return name.to_string();
        };

        if let Some(expansion) = self.simple.get(prefix) {
            return format!("{}{}{}", expansion, SEPARATOR, rest);
        }

        if let Some(candidates) = self.recombinant.get(prefix) {
            return candidates
                .iter()
                .map(|candidate| {
                    self.decompress(&format!("{}{}{}", strip_wildcard(candidate), SEPARATOR, rest))
                })
                .collect::<Vec<_>>()
                .join(",");
        }

        name.to_string()
    }

    /// Whether `target` occurs in the ancestry of `name`.
    ///
    /// Recombinant names are checked against each of their parental lines
    /// rather than a single expansion.
    pub fn contains_ancestor(&self, name: &str, target: &str) -> bool {
        if name.starts_with(self.options.recombinant_marker) {
            if let Some(candidates) = self.recombinant.get(prefix_of(name)) {
                return candidates
                    .iter()
                    .any(|candidate| self.contains_ancestor(strip_wildcard(candidate), target));
            }
        }

        self.decompress(name).contains(target)
    }

    /// Parental candidates of a recombinant alias
    pub fn candidates(&self, alias: &str) -> Option<&[String]> {
        self.recombinant.get(alias).map(Vec::as_slice)
    }

    pub fn is_alias(&self, alias: &str) -> bool {
        self.simple.contains_key(alias) || self.recombinant.contains_key(alias)
    }

    pub fn is_recombinant(&self, alias: &str) -> bool {
        self.recombinant.contains_key(alias)
    }

    pub fn len(&self) -> usize {
        self.simple.len() + self.recombinant.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_acyclic(&self) -> Result<()> {
        let mut heights = HashMap::new();
        for alias in self.simple.keys().chain(self.recombinant.keys()) {
            let mut path = Vec::new();
            self.chain_height(alias, &mut path, &mut heights)?;
        }
        Ok(())
    }

    /// Length of the longest alias-to-alias chain starting at `alias`
    fn chain_height<'a>(
        &'a self,
        alias: &'a str,
        path: &mut Vec<&'a str>,
        heights: &mut HashMap<&'a str, usize>,
    ) -> Result<usize> {
        if let Some(height) = heights.get(alias) {
            return Ok(*height);
        }
        if path.contains(&alias) {
            return Err(LineageError::CyclicAlias {
                alias: path.first().copied().unwrap_or(alias).to_string(),
            });
        }

        path.push(alias);
        let mut height = 1;
        for next in self.expansion_prefixes(alias) {
            if self.is_alias(next) {
                height = height.max(1 + self.chain_height(next, path, heights)?);
            }
        }
        path.pop();

        if height > self.options.max_depth {
            return Err(LineageError::CyclicAlias {
                alias: alias.to_string(),
            });
        }
        heights.insert(alias, height);
        Ok(height)
    }

    fn expansion_prefixes<'a>(&'a self, alias: &str) -> Vec<&'a str> {
        match (self.simple.get(alias), self.recombinant.get(alias)) {
            (Some(expansion), _) => vec![prefix_of(strip_wildcard(expansion))],
            (None, Some(candidates)) => candidates
                .iter()
                .map(|c| prefix_of(strip_wildcard(c)))
                .collect(),
            (None, None) => Vec::new(),
        }
    }
}

fn duplicate(alias: &str) -> LineageError {
    LineageError::Configuration(format!("alias '{}' is defined more than once", alias))
}

fn prefix_of(name: &str) -> &str {
    name.split(SEPARATOR).next().unwrap_or(name)
}

/// Recombinant parents are sometimes written `BA.2*`, meaning the lineage and its descendants
fn strip_wildcard(name: &str) -> &str {
    name.trim_end_matches('*')
}
