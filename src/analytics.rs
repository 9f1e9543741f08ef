use serde::Serialize;
use serde_json::{Value, json};

use crate::submission::SubmissionRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingEvent {
    pub name: String,
    pub params: Value,
}

/// Where conversions are attributed.
#[derive(Debug, Clone)]
pub struct ConversionSettings {
    pub send_to: String,
    pub currency: String,
}

/// Receives tracking events after a successful submission. Sinks are
/// optional; a flow without any simply tracks nothing.
pub trait AnalyticsSink: Send + Sync {
    fn id(&self) -> &str;
    fn track(&self, event: &TrackingEvent);
}

/// Writes events to the structured log under the `analytics` target.
pub struct LogSink;

impl AnalyticsSink for LogSink {
    fn id(&self) -> &str {
        "log"
    }

    fn track(&self, event: &TrackingEvent) {
        tracing::info!(target: "analytics", event = %event.name, params = %event.params, "tracked");
    }
}

pub fn conversion_event(record: &SubmissionRecord, settings: &ConversionSettings) -> TrackingEvent {
    TrackingEvent {
        name: "conversion".to_string(),
        params: json!({
            "send_to": &settings.send_to,
            "value": 1.0,
            "currency": &settings.currency,
            "transaction_id": record.timestamp_millis().to_string(),
        }),
    }
}

pub fn lead_event(record: &SubmissionRecord) -> TrackingEvent {
    TrackingEvent {
        name: "Lead".to_string(),
        params: json!({
            "content_name": record.field("service").unwrap_or_default(),
            "content_category": "Contact Form",
        }),
    }
}

/// Events emitted for one successful submission.
pub fn submission_events(
    record: &SubmissionRecord,
    conversion: Option<&ConversionSettings>,
) -> Vec<TrackingEvent> {
    let mut events = Vec::with_capacity(2);
    if let Some(settings) = conversion {
        events.push(conversion_event(record, settings));
    }
    events.push(lead_event(record));
    events
}
