// ============================================================
// Layer 3 — Store Document
// ============================================================
// Everything persisted goes through a schemaless JSON object,
// the same shape a document database stores. A key filter is
// itself a document: it matches when every one of its fields
// is present and equal in the candidate.
//
// Reference: serde_json documentation (Map, Value)

use serde_json::{Map, Value};

/// A single stored record.
pub type Document = Map<String, Value>;

/// Field holding the store-assigned numeric identifier.
pub const ID_FIELD: &str = "_id";

/// Build a document from `(field, value)` pairs.
///
/// Example:
///   let filter = doc([("name", "sst".into()), ("set", "train".into())]);
pub fn doc<const N: usize>(fields: [(&str, Value); N]) -> Document {
    fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Returns true if every field of `filter` is equal in `document`.
/// An empty filter matches everything.
pub fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, want)| document.get(key) == Some(want))
}

/// Numeric `_id` of a document, if one was assigned.
pub fn id_of(document: &Document) -> Option<u64> {
    document.get(ID_FIELD).and_then(Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_matches_subset_of_fields() {
        let d = doc([("name", json!("imdb")), ("set", json!("train")), ("data", json!([1, 2]))]);
        assert!(matches(&d, &doc([("name", json!("imdb"))])));
        assert!(matches(&d, &doc([("name", json!("imdb")), ("set", json!("train"))])));
        assert!(!matches(&d, &doc([("name", json!("imdb")), ("set", json!("test"))])));
    }

    #[test]
    fn test_missing_field_does_not_match() {
        let d = doc([("name", json!("imdb"))]);
        assert!(!matches(&d, &doc([("category", json!("sp"))])));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let d = doc([("name", json!("yelp"))]);
        assert!(matches(&d, &Document::new()));
    }

    #[test]
    fn test_id_of() {
        let d = doc([(ID_FIELD, json!(7))]);
        assert_eq!(id_of(&d), Some(7));
        assert_eq!(id_of(&Document::new()), None);
    }
}
