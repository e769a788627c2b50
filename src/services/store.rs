use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::ScanError;

/// Document collection holding scan records.
///
/// Documents are stored as given. `created_at` is the sort key the caller
/// derived from the document; listing returns newest first, ties broken by
/// insertion order (latest first). Listed documents carry the generated `_id`.
#[async_trait::async_trait]
pub trait ScanStore: Send + Sync {
    async fn insert(&self, document: Value, created_at: DateTime<Utc>) -> Result<String, ScanError>;

    async fn list_newest_first(&self) -> Result<Vec<Value>, ScanError>;
}

/// Attach the store identifier to a listed document.
pub fn with_id(document: Value, id: &str) -> Value {
    match document {
        Value::Object(mut map) => {
            map.insert("_id".to_string(), Value::String(id.to_string()));
            Value::Object(map)
        }
        other => other,
    }
}


#[cfg(test)]
mod tests {
    use super::memory::MemoryScanStore;
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_with_id_only_touches_objects() {
        assert_eq!(with_id(json!({"a": 1}), "x"), json!({"a": 1, "_id": "x"}));
        assert_eq!(with_id(json!([1]), "x"), json!([1]));
    }

    #[tokio::test]
    async fn test_memory_store_orders_by_created_at_then_insertion() {
        let store = MemoryScanStore::new();
        let t = |h| Utc.with_ymd_and_hms(2025, 3, 1, h, 0, 0).unwrap();

        store.insert(json!({"n": 1}), t(9)).await.unwrap();
        store.insert(json!({"n": 2}), t(11)).await.unwrap();
        store.insert(json!({"n": 3}), t(9)).await.unwrap();

        let listed = store.list_newest_first().await.unwrap();
        let order: Vec<i64> = listed.iter().map(|d| d["n"].as_i64().unwrap()).collect();
        assert_eq!(order, vec![2, 3, 1]);
        assert!(listed.iter().all(|d| d["_id"].is_string()));
    }
}
