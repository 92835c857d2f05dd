//! Front matter codec
//!
//! Splits a chapter into its leading `---` delimited YAML block and the
//! markdown body. A block that does not decode to a YAML mapping is treated
//! as plain body text, so malformed metadata never stops editing.

use std::sync::LazyLock;

use regex_lite::Regex;

use super::value::{Map, Value};

/// Opening delimiter line, the smallest enclosed span, then the closing
/// delimiter line including its line break.
static FRONT_MATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^---\r?\n(?:(.*?)\r?\n)??---(?:\r?\n|$)").expect("valid front matter pattern")
});

/// Outcome of parsing the metadata block
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MetadataStatus {
    /// The text does not start with a delimited block
    #[default]
    Absent,
    /// A block was found and decoded to a mapping
    Parsed,
    /// A block was found but ignored; holds the reason
    Invalid(String),
}

/// A chapter split into front matter and body
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrontMatter {
    /// Exact text of the block, delimiters and trailing line break included
    pub block: String,
    /// Everything after the block
    pub body: String,
    /// Decoded block
    pub metadata: Map,
    pub status: MetadataStatus,
}

/// Split `raw` into front matter and body.
///
/// `encode(&fm.block, &fm.body) == raw` holds for every input.
pub fn decode(raw: &str) -> FrontMatter {
    let Some(caps) = FRONT_MATTER.captures(raw) else {
        return FrontMatter::plain(raw, MetadataStatus::Absent);
    };
    let Some(whole) = caps.get(0) else {
        return FrontMatter::plain(raw, MetadataStatus::Absent);
    };
    let yaml = caps.get(1).map_or("", |m| m.as_str());

    match parse_mapping(yaml) {
        Ok(metadata) => FrontMatter {
            block: whole.as_str().to_string(),
            body: raw[whole.end()..].to_string(),
            metadata,
            status: MetadataStatus::Parsed,
        },
        Err(reason) => {
            tracing::warn!("Ignoring front matter: {}", reason);
            FrontMatter::plain(raw, MetadataStatus::Invalid(reason))
        }
    }
}

/// Rebuild a chapter from its block and body
pub fn encode(block: &str, body: &str) -> String {
    format!("{block}{body}")
}

impl FrontMatter {
    fn plain(raw: &str, status: MetadataStatus) -> Self {
        Self {
            block: String::new(),
            body: raw.to_string(),
            metadata: Map::new(),
            status,
        }
    }
}

fn parse_mapping(yaml: &str) -> Result<Map, String> {
    if yaml.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Map(map)) => Ok(map),
        // Only comments inside the fences
        Ok(Value::Null) => Ok(Map::new()),
        Ok(_) => Err("front matter is not a mapping".to_string()),
        Err(e) => Err(e.to_string()),
    }
}
