//! Metadata key addressing
//!
//! Every market, producer and dataset document lives at a deterministic
//! hierarchical key inside the market's container:
//!
//! ```text
//! /shopkeeper/market={market}/metadata-v1.json
//! /shopkeeper/market={market}/producer={producer}/metadata-v1.json
//! /shopkeeper/market={market}/producer={producer}/dataset={dataset}/metadata-v1.json
//! ```
//!
//! Names are inserted verbatim. A name containing `/` or `=` produces a key
//! that can collide with another resource's key.

/// Version tag of the metadata document format
pub const METADATA_VERSION: &str = "v1";

const ROOT: &str = "/shopkeeper";

fn market_dir(market: &str) -> String {
    format!("{ROOT}/market={market}")
}

fn producer_dir(market: &str, producer: &str) -> String {
    format!("{}/producer={producer}", market_dir(market))
}

fn document(dir: &str) -> String {
    format!("{dir}/metadata-{METADATA_VERSION}.json")
}

/// Key of a market's metadata document
pub fn market_key(market: &str) -> String {
    document(&market_dir(market))
}

/// Key of a producer's metadata document
pub fn producer_key(market: &str, producer: &str) -> String {
    document(&producer_dir(market, producer))
}

/// Key of a dataset's metadata document
pub fn dataset_key(market: &str, producer: &str, dataset: &str) -> String {
    document(&format!("{}/dataset={dataset}", producer_dir(market, producer)))
}

/// Object path for a key, with leading slashes stripped
pub fn store_path(key: &str) -> &str {
    key.trim_start_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_key() {
        assert_eq!(
            market_key("veg-market"),
            "/shopkeeper/market=veg-market/metadata-v1.json"
        );
    }

    #[test]
    fn test_producer_key_extends_market_directory() {
        let market = market_key("veg-market");
        let producer = producer_key("veg-market", "pumpkintown");
        assert_eq!(
            producer,
            "/shopkeeper/market=veg-market/producer=pumpkintown/metadata-v1.json"
        );

        let market_dir = market.trim_end_matches("metadata-v1.json");
        assert!(producer.starts_with(market_dir));
        assert!(producer.len() > market.len());
    }

    #[test]
    fn test_dataset_key() {
        assert_eq!(
            dataset_key("veg-market", "pumpkintown", "harvest"),
            "/shopkeeper/market=veg-market/producer=pumpkintown/dataset=harvest/metadata-v1.json"
        );
    }

    #[test]
    fn test_store_path_strips_leading_slash() {
        assert_eq!(
            store_path(&market_key("m")),
            "shopkeeper/market=m/metadata-v1.json"
        );
        assert_eq!(store_path("already/relative"), "already/relative");
    }

    #[test]
    fn test_names_are_not_escaped() {
        assert_eq!(
            producer_key("a/producer=b", "c"),
            "/shopkeeper/market=a/producer=b/producer=c/metadata-v1.json"
        );
    }
}
