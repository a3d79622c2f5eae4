//! Metadata document codec
//!
//! Documents are stored as compact JSON. Because every map in the model is a
//! `BTreeMap` (and `serde_json::Map` is ordered), serializing the same value
//! always yields the same bytes, which makes the SHA-256 fingerprint usable
//! as an etag.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::errors::{MarketError, Result};

/// Content type recorded on every metadata object
pub const CONTENT_TYPE: &str = "application/json";

/// Encode a document in canonical form
pub fn serialize<T: Serialize>(document: &T) -> Result<String> {
    Ok(serde_json::to_string(document)?)
}

/// Decode a document, failing with `MalformedMetadata` on any shape mismatch
pub fn deserialize<T: DeserializeOwned>(text: &[u8]) -> Result<T> {
    serde_json::from_slice(text).map_err(|source| MarketError::MalformedMetadata { source })
}

/// Hex-encoded SHA-256 of serialized content
pub fn fingerprint(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Structural equality over the canonical serialized form
pub fn canonical_eq<T: Serialize>(a: &T, b: &T) -> Result<bool> {
    Ok(serialize(a)? == serialize(b)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use crate::model::{MarketBackendConfiguration, MarketData, ProducerData, Tags};
    use serde_json::json;

    fn veg_market() -> MarketData {
        MarketData {
            metadata_version: keys::METADATA_VERSION.to_string(),
            name: "veg-market".to_string(),
            description: "Fresh vegetables".to_string(),
            backend_configuration: MarketBackendConfiguration {
                backend_type: "object-store:v1".to_string(),
                container: "veg-market-1a2b3c".to_string(),
                market_metadata_key: keys::market_key("veg-market"),
                region: Some("eu-west-1".to_string()),
            },
            tags: Tags::from([("project".to_string(), "shopkeeper".to_string())]),
            extensions: [(
                "ux".to_string(),
                json!({"theme": "green", "sections": ["roots", "leaves"]}),
            )]
            .into_iter()
            .collect(),
        }
    }

    #[test]
    fn test_market_data_round_trip() {
        let data = veg_market();
        let text = serialize(&data).unwrap();
        let decoded: MarketData = deserialize(text.as_bytes()).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let first = serialize(&veg_market()).unwrap();
        let second = serialize(&veg_market()).unwrap();
        assert_eq!(first, second);
        assert_eq!(fingerprint(&first), fingerprint(&second));
    }

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        assert_eq!(
            fingerprint(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(fingerprint("a"), fingerprint("b"));
    }

    #[test]
    fn test_malformed_text_is_rejected() {
        let error = deserialize::<MarketData>(b"not json").unwrap_err();
        assert!(matches!(error, MarketError::MalformedMetadata { .. }));
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        // A producer document is not a market document
        let producer = json!({
            "metadata_version": "v1",
            "name": "pumpkintown",
            "market": "veg-market",
            "description": "",
            "key": "k",
        });
        let text = producer.to_string();
        assert!(deserialize::<ProducerData>(text.as_bytes()).is_ok());
        let error = deserialize::<MarketData>(text.as_bytes()).unwrap_err();
        assert!(matches!(error, MarketError::MalformedMetadata { .. }));
    }

    #[test]
    fn test_canonical_eq_detects_nested_difference() {
        let a = veg_market();
        let mut b = veg_market();
        assert!(canonical_eq(&a, &b).unwrap());

        b.backend_configuration.container = "other".to_string();
        assert!(!canonical_eq(&a, &b).unwrap());
    }
}
