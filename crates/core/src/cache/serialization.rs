//! Serialization of cached values.
//!
//! Cached values are stored as JSON bytes, keeping them human-readable when
//! inspecting a shared cache backend.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{CacheError, Result};

/// Serializes a value to cache bytes.
pub fn to_cache_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| CacheError::Serialization(e.to_string()))
}

/// Deserializes cache bytes back to a value.
pub fn from_cache_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| CacheError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        id: String,
        amount: f64,
    }

    #[test]
    fn test_roundtrip() {
        let sample = Sample {
            id: "c1".to_string(),
            amount: 12.5,
        };

        let bytes = to_cache_bytes(&sample).expect("serialize should succeed");
        let back: Sample = from_cache_bytes(&bytes).expect("deserialize should succeed");
        assert_eq!(back, sample);
    }

    #[test]
    fn test_roundtrip_vec() {
        let samples = vec![
            Sample {
                id: "c1".to_string(),
                amount: 1.0,
            },
            Sample {
                id: "c2".to_string(),
                amount: 2.0,
            },
        ];

        let bytes = to_cache_bytes(&samples).expect("serialize should succeed");
        let back: Vec<Sample> = from_cache_bytes(&bytes).expect("deserialize should succeed");
        assert_eq!(back, samples);
    }

    #[test]
    fn test_malformed_bytes() {
        let result: Result<Sample> = from_cache_bytes(b"not json");
        assert!(matches!(result, Err(CacheError::Serialization(_))));
    }
}
