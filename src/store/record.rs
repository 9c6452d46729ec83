//! Records stored in a namespace.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A value stored in the keyed store, identified by a string id.
///
/// The id is unique within a namespace; writing a record whose id already
/// exists replaces the previous record.
pub trait Record: Serialize + DeserializeOwned + Send + 'static {
    /// Returns the record id, or None when the record has no usable id.
    fn id(&self) -> Option<&str>;
}

/// Untyped documents use their string `"id"` field.
impl Record for serde_json::Value {
    fn id(&self) -> Option<&str> {
        self.get("id").and_then(serde_json::Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_record_id() {
        let doc = json!({"id": "TCK-1001", "status": "open"});
        assert_eq!(Record::id(&doc), Some("TCK-1001"));
    }

    #[test]
    fn test_json_record_without_string_id() {
        assert_eq!(Record::id(&json!({"status": "open"})), None);
        assert_eq!(Record::id(&json!({"id": 42})), None);
        assert_eq!(Record::id(&json!(["id"])), None);
    }
}
