use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::form::validation::Validated;

/// Derived metadata attached to every submission.
#[derive(Debug, Clone)]
pub struct RecordMetadata {
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub page_url: String,
    pub user_agent: String,
    pub referrer: String,
}

/// One submission attempt's payload. Built fresh per submit, never stored.
#[derive(Debug, Clone)]
pub struct SubmissionRecord {
    pub id: Uuid,
    pub fields: BTreeMap<String, String>,
    pub meta: RecordMetadata,
}

impl SubmissionRecord {
    /// Values are taken trimmed, as they were validated.
    pub fn new(validated: Validated<'_>, meta: RecordMetadata) -> Self {
        let fields = validated
            .form()
            .fields()
            .iter()
            .map(|f| (f.name.clone(), f.value.trim().to_string()))
            .collect();

        Self {
            id: Uuid::now_v7(),
            fields,
            meta,
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.as_str())
    }

    /// Milliseconds since the epoch at submission time.
    pub fn timestamp_millis(&self) -> i64 {
        self.meta.timestamp.timestamp_millis()
    }

    /// Flat JSON object of field values plus metadata. Metadata keys win.
    pub fn to_json(&self) -> Value {
        let mut map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();

        map.insert(
            "timestamp".to_string(),
            Value::String(
                self.meta
                    .timestamp
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        );
        map.insert("source".to_string(), Value::String(self.meta.source.clone()));
        map.insert("pageURL".to_string(), Value::String(self.meta.page_url.clone()));
        map.insert("userAgent".to_string(), Value::String(self.meta.user_agent.clone()));
        map.insert("referrer".to_string(), Value::String(self.meta.referrer.clone()));

        Value::Object(map)
    }
}
