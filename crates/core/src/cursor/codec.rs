//! Opaque pagination cursor codec.
//!
//! A cursor is the URL-safe base64 encoding (no padding) of a JSON object
//! mapping sort-field names to the values of the last row seen, typically
//! the primary sort field plus `id` as a tiebreaker. Clients must treat the
//! token as uninterpreted; the serialization order of the fields is
//! irrelevant to decoding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};

/// The decoded contents of a cursor: sort-field name -> last-seen value.
pub type CursorFields = Map<String, Value>;

/// Encodes a set of sort-field values into an opaque cursor string.
///
/// Returns an empty string if the fields cannot be serialized; callers must
/// treat an empty cursor as absent. Never panics.
pub fn encode(fields: &CursorFields) -> String {
    match serde_json::to_vec(fields) {
        Ok(bytes) => URL_SAFE_NO_PAD.encode(bytes),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to encode cursor fields");
            String::new()
        }
    }
}

/// Decodes an opaque cursor string back into its sort-field values.
///
/// Malformed, truncated, or non-object input decodes to an empty map, which
/// pagination treats as "no cursor" (restart from the beginning). Never
/// errors.
pub fn decode(cursor: &str) -> CursorFields {
    if cursor.is_empty() {
        return Map::new();
    }

    let bytes = match URL_SAFE_NO_PAD.decode(cursor) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(error = %err, "Malformed cursor, treating as absent");
            return Map::new();
        }
    };

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => {
            tracing::warn!("Cursor payload is not an object, treating as absent");
            Map::new()
        }
        Err(err) => {
            tracing::warn!(error = %err, "Malformed cursor payload, treating as absent");
            Map::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(pairs: &[(&str, Value)]) -> CursorFields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_roundtrip_string_and_id() {
        let m = fields(&[
            ("created_at", json!("2026-02-14T09:30:00Z")),
            ("id", json!("6ba7b810-9dad-11d1-80b4-00c04fd430c8")),
        ]);

        assert_eq!(decode(&encode(&m)), m);
    }

    #[test]
    fn test_roundtrip_numeric_value() {
        let m = fields(&[("amount", json!(250.75)), ("id", json!("abc"))]);

        assert_eq!(decode(&encode(&m)), m);
    }

    #[test]
    fn test_roundtrip_null_value() {
        let m = fields(&[("reference_id", Value::Null), ("id", json!("abc"))]);

        assert_eq!(decode(&encode(&m)), m);
    }

    #[test]
    fn test_roundtrip_empty_map() {
        let m = CursorFields::new();

        assert_eq!(decode(&encode(&m)), m);
    }

    #[test]
    fn test_encoded_cursor_is_url_safe() {
        let m = fields(&[
            ("name", json!("value with spaces & symbols ???")),
            ("id", json!("x")),
        ]);

        let cursor = encode(&m);
        assert!(cursor
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_decode_empty_string() {
        assert!(decode("").is_empty());
    }

    #[test]
    fn test_decode_invalid_base64() {
        assert!(decode("not base64 at all!!!").is_empty());
    }

    #[test]
    fn test_decode_truncated_payload() {
        let m = fields(&[("created_at", json!("2026-02-14")), ("id", json!("x"))]);
        let cursor = encode(&m);

        // Chop the token in half; the payload no longer parses.
        let truncated = &cursor[..cursor.len() / 2];
        assert!(decode(truncated).is_empty());
    }

    #[test]
    fn test_decode_non_object_payload() {
        let cursor = URL_SAFE_NO_PAD.encode(b"[1,2,3]");
        assert!(decode(&cursor).is_empty());
    }

    #[test]
    fn test_decode_valid_base64_invalid_json() {
        let cursor = URL_SAFE_NO_PAD.encode(b"{broken");
        assert!(decode(&cursor).is_empty());
    }
}
