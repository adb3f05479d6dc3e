use crate::error::Result;
use crate::types::AliasValue;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use tracing::debug;

/// Alias source document: alias → prefix or list of prefixes, in document order.
///
/// Entries are kept as a list rather than a map so that duplicate keys survive
/// parsing and can be rejected when the table is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasSource {
    entries: Vec<(String, AliasValue)>,
}

impl AliasSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON alias key document
    pub fn from_json(content: &str) -> Result<Self> {
        let source: AliasSource = serde_json::from_str(content)?;
        debug!("Parsed alias source with {} entries", source.entries.len());
        Ok(source)
    }

    pub fn push(&mut self, alias: impl Into<String>, value: AliasValue) {
        self.entries.push((alias.into(), value));
    }

    pub fn simple(mut self, alias: &str, prefix: &str) -> Self {
        self.push(alias, AliasValue::Single(prefix.to_string()));
        self
    }

    pub fn recombinant(mut self, alias: &str, prefixes: &[&str]) -> Self {
        self.push(
            alias,
            AliasValue::Recombinant(prefixes.iter().map(|p| p.to_string()).collect()),
        );
        self
    }

    /// Drop entries whose value is the empty string.
    ///
    /// Top-level lineages appear in the upstream key mapped to `""`; they are
    /// not aliases of anything.
    pub fn without_empty_values(self) -> Self {
        let before = self.entries.len();
        let entries: Vec<_> = self
            .entries
            .into_iter()
            .filter(|(_, value)| !matches!(value, AliasValue::Single(s) if s.is_empty()))
            .collect();

        if entries.len() != before {
            debug!("Discarded {} empty alias values", before - entries.len());
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[(String, AliasValue)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for AliasSource {
    type Item = (String, AliasValue);
    type IntoIter = std::vec::IntoIter<(String, AliasValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'de> Deserialize<'de> for AliasSource {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SourceVisitor;

        impl<'de> Visitor<'de> for SourceVisitor {
            type Value = AliasSource;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map from alias to a lineage prefix or list of prefixes")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((alias, value)) = map.next_entry::<String, AliasValue>()? {
                    entries.push((alias, value));
                }
                Ok(AliasSource { entries })
            }
        }

        deserializer.deserialize_map(SourceVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_values() {
        let source = AliasSource::from_json(
            r#"{"A": "", "BA": "B.1.1.529", "XA": ["B.1.1.7", "B.1.177"]}"#,
        )
        .unwrap();

        assert_eq!(source.len(), 3);
        assert_eq!(
            source.entries()[1],
            ("BA".to_string(), AliasValue::Single("B.1.1.529".to_string()))
        );
        assert!(matches!(
            &source.entries()[2].1,
            AliasValue::Recombinant(values) if values.len() == 2
        ));
    }

    #[test]
    fn test_duplicate_keys_are_preserved() {
        let source = AliasSource::from_json(r#"{"BA": "B.1.1.529", "BA": ["B.1", "B.2"]}"#).unwrap();
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn test_empty_values_discarded() {
        let source = AliasSource::from_json(r#"{"A": "", "B": "", "BA": "B.1.1.529"}"#)
            .unwrap()
            .without_empty_values();

        assert_eq!(source.len(), 1);
        assert_eq!(source.entries()[0].0, "BA");
    }

    #[test]
    fn test_rejects_non_object_document() {
        assert!(AliasSource::from_json(r#"["BA", "B.1.1.529"]"#).is_err());
        assert!(AliasSource::from_json(r#"{"BA": 12}"#).is_err());
    }
}
