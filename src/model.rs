//! Metadata documents and declaration inputs
//!
//! All maps are `BTreeMap` so that serialization is ordered and two equal
//! documents always produce identical bytes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// String tags attached to a market and propagated to its children
pub type Tags = BTreeMap<String, String>;

/// Free-form nested metadata fields
pub type Fields = BTreeMap<String, Value>;

/// How to provision a new market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketBackendDeclaration {
    /// Registry identifier of the backend, e.g. `object-store:v1`
    pub backend_type: String,

    pub description: String,

    #[serde(default)]
    pub tags: Tags,

    /// Prefix for the storage container name (defaults to the market name)
    #[serde(default, alias = "bucket_prefix")]
    pub container_hint: Option<String>,

    #[serde(default)]
    pub extensions: Fields,
}

impl MarketBackendDeclaration {
    pub fn new(backend_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            backend_type: backend_type.into(),
            description: description.into(),
            tags: Tags::new(),
            container_hint: None,
            extensions: Fields::new(),
        }
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_container_hint(mut self, hint: impl Into<String>) -> Self {
        self.container_hint = Some(hint.into());
        self
    }

    pub fn with_extensions(mut self, extensions: Fields) -> Self {
        self.extensions = extensions;
        self
    }
}

/// Minimal addressing needed to reconnect to a provisioned market
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketBackendConfiguration {
    pub backend_type: String,

    /// Bucket (object storage) or directory (local filesystem)
    pub container: String,

    pub market_metadata_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// The market document written when a market is declared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub metadata_version: String,
    pub name: String,
    pub description: String,
    pub backend_configuration: MarketBackendConfiguration,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub extensions: Fields,
}

/// Caller-supplied fields for a producer declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProducerArgs {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: Fields,
    /// Merged over the market's tags
    #[serde(default)]
    pub tags: Tags,
}

/// A producer document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerData {
    pub metadata_version: String,
    pub name: String,
    pub market: String,
    pub description: String,
    pub key: String,
    #[serde(default)]
    pub metadata: Fields,
    #[serde(default)]
    pub tags: Tags,
}

/// Caller-supplied fields for a dataset declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetArgs {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: Fields,
    #[serde(default)]
    pub configuration: Fields,
    #[serde(default)]
    pub tags: Tags,
}

/// A dataset document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetData {
    pub metadata_version: String,
    pub name: String,
    pub market: String,
    pub producer: String,
    pub description: String,
    pub key: String,
    #[serde(default)]
    pub metadata: Fields,
    #[serde(default)]
    pub configuration: Fields,
    #[serde(default)]
    pub tags: Tags,
}

/// Market tags overlaid with caller tags; the caller wins on conflicts
pub fn merge_tags(market: &Tags, caller: &Tags) -> Tags {
    let mut merged = market.clone();
    merged.extend(caller.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_tags_caller_wins() {
        let market = Tags::from([
            ("environment".to_string(), "test".to_string()),
            ("project".to_string(), "shopkeeper".to_string()),
        ]);
        let caller = Tags::from([("environment".to_string(), "prod".to_string())]);

        let merged = merge_tags(&market, &caller);
        assert_eq!(merged["environment"], "prod");
        assert_eq!(merged["project"], "shopkeeper");
    }

    #[test]
    fn test_declaration_accepts_bucket_prefix_alias() {
        let declaration: MarketBackendDeclaration = serde_json::from_str(
            r#"{"backend_type":"object-store:v1","description":"d","bucket_prefix":"veg"}"#,
        )
        .unwrap();
        assert_eq!(declaration.container_hint.as_deref(), Some("veg"));
        assert!(declaration.tags.is_empty());
    }
}
