use crate::error::Result;
use crate::types::NodeDocument;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

/// Trait for tree document formatters
pub trait TreeFormatter {
    fn format(&self, document: &NodeDocument) -> Result<String>;
}

/// Indented JSON, four spaces per level
pub struct JsonFormatter;

impl TreeFormatter for JsonFormatter {
    fn format(&self, document: &NodeDocument) -> Result<String> {
        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        document.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Single-line JSON
pub struct CompactJsonFormatter;

impl TreeFormatter for CompactJsonFormatter {
    fn format(&self, document: &NodeDocument) -> Result<String> {
        Ok(serde_json::to_string(document)?)
    }
}

/// Plain text outline, one lineage per line
pub struct TextFormatter;

impl TextFormatter {
    fn write_node(out: &mut String, node: &NodeDocument, depth: usize) {
        let date = node.lineage.designation_date.as_deref().unwrap_or("-");
        out.push_str(&format!(
            "{}{} ({}) [{}]\n",
            "  ".repeat(depth),
            node.lineage.display_name,
            node.id,
            date
        ));
        for child in &node.children {
            Self::write_node(out, child, depth + 1);
        }
    }
}

impl TreeFormatter for TextFormatter {
    fn format(&self, document: &NodeDocument) -> Result<String> {
        let mut out = String::new();
        Self::write_node(&mut out, document, 0);
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Compact,
    Text,
}

impl OutputFormat {
    pub fn formatter(&self) -> Box<dyn TreeFormatter + Send + Sync> {
        match self {
            OutputFormat::Json => Box::new(JsonFormatter),
            OutputFormat::Compact => Box::new(CompactJsonFormatter),
            OutputFormat::Text => Box::new(TextFormatter),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "compact" => Ok(OutputFormat::Compact),
            "text" => Ok(OutputFormat::Text),
            other => Err(format!("Unsupported format: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LineageDocument, ParentDocument};

    fn create_test_document() -> NodeDocument {
        let leaf = NodeDocument {
            id: "B.1.1.529.1".to_string(),
            lineage: LineageDocument {
                display_name: "BA.1".to_string(),
                partial_name: "BA.1".to_string(),
                canonical_name: "B.1.1.529.1".to_string(),
                designation_date: None,
            },
            height: Some(1),
            parent: ParentDocument {
                line_of_descent: Some(vec!["B.1.1.529".to_string()]),
                root_id: Some("B.1.1.529".to_string()),
            },
            children: vec![],
        };

        NodeDocument {
            id: "B.1.1.529".to_string(),
            lineage: LineageDocument {
                display_name: "BA".to_string(),
                partial_name: "BA".to_string(),
                canonical_name: "B.1.1.529".to_string(),
                designation_date: Some("2021-11-26".to_string()),
            },
            height: Some(0),
            parent: ParentDocument {
                line_of_descent: Some(vec![]),
                root_id: Some("B.1.1.529".to_string()),
            },
            children: vec![leaf],
        }
    }

    #[test]
    fn test_json_formatter_uses_four_space_indent() {
        let output = JsonFormatter.format(&create_test_document()).unwrap();
        assert!(output.starts_with("{\n    \"id\": \"B.1.1.529\""));

        let parsed: NodeDocument = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, create_test_document());
    }

    #[test]
    fn test_compact_formatter_is_single_line() {
        let output = CompactJsonFormatter.format(&create_test_document()).unwrap();
        assert!(!output.contains('\n'));
    }

    #[test]
    fn test_text_formatter_outline() {
        let output = TextFormatter.format(&create_test_document()).unwrap();
        assert_eq!(output, "BA (B.1.1.529) [2021-11-26]\n  BA.1 (B.1.1.529.1) [-]\n");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("markdown".parse::<OutputFormat>().is_err());
    }
}
