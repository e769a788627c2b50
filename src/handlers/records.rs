use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value;
use std::sync::Arc;

use crate::error::ScanError;
use crate::models::ScanRecord;
use crate::services::ScanStore;

pub const CREATED_AT: &str = "createdAt";

/// Record/list operations of the persistence endpoint.
pub struct ScanRecords {
    store: Arc<dyn ScanStore>,
    strict: bool,
}

impl ScanRecords {
    pub fn new(store: Arc<dyn ScanStore>, strict: bool) -> Self {
        Self { store, strict }
    }

    /// Store a document, stamping `createdAt` when the caller left it out.
    ///
    /// Shape is only enforced in strict mode; otherwise a mismatch against
    /// [`ScanRecord`] is logged and the document is stored as sent.
    pub async fn record(&self, mut document: Value) -> Result<String, ScanError> {
        let fields = document
            .as_object_mut()
            .ok_or_else(|| ScanError::InvalidRecord("document must be a JSON object".to_string()))?;

        let created_at = match fields.get(CREATED_AT) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(existing) => Some(sort_key(existing)),
        };
        let created_at = match created_at {
            Some(ts) => ts,
            None => {
                let now = Utc::now();
                fields.insert(
                    CREATED_AT.to_string(),
                    Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
                );
                now
            }
        };

        // createdAt was already read by `sort_key`, which accepts more formats than the typed field.
        let mut shape = document.clone();
        if let Some(fields) = shape.as_object_mut() {
            fields.remove(CREATED_AT);
        }
        if let Err(e) = serde_json::from_value::<ScanRecord>(shape) {
            if self.strict {
                return Err(ScanError::InvalidRecord(e.to_string()));
            }
            log::warn!("⚠️ Storing document that is not a scan record: {}", e);
        }

        let id = self.store.insert(document, created_at).await?;
        log::info!("💾 Stored scan result {} (createdAt {})", id, created_at);
        Ok(id)
    }

    pub async fn list(&self) -> Result<Vec<Value>, ScanError> {
        let documents = self.store.list_newest_first().await?;
        log::info!("📋 Listing {} scan results", documents.len());
        Ok(documents)
    }
}

/// Ordering key for a caller-supplied `createdAt`: RFC 3339 or naive ISO
/// strings (read as UTC) and epoch milliseconds. Anything else sorts as "now".
fn sort_key(value: &Value) -> DateTime<Utc> {
    let parsed = match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            }),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    };

    parsed.unwrap_or_else(|| {
        log::warn!("⚠️ Unrecognized createdAt {}, ordering by insertion time", value);
        Utc::now()
    })
}
