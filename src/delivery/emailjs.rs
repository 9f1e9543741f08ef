use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use super::{Channel, DeliveryError, DeliveryReceipt, DeliveryStatus, http_client};
use crate::submission::SubmissionRecord;

pub const DEFAULT_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Record fields forwarded as template parameters.
pub const TEMPLATE_FIELDS: [&str; 8] = [
    "name", "email", "phone", "service", "message", "budget", "timeline", "company",
];

#[derive(Debug, Clone)]
pub struct EmailJsConfig {
    pub url: String,
    pub service_id: String,
    pub template_id: String,
    pub user_id: String,
}

pub struct EmailJsChannel {
    client: reqwest::Client,
    config: EmailJsConfig,
}

impl EmailJsChannel {
    pub fn new(config: EmailJsConfig, timeout: Duration) -> Result<Self, DeliveryError> {
        Ok(Self {
            client: http_client(timeout)?,
            config,
        })
    }

    pub fn payload(&self, record: &SubmissionRecord) -> Value {
        let mut params = Map::new();
        for name in TEMPLATE_FIELDS {
            if let Some(value) = record.field(name) {
                params.insert(name.to_string(), Value::String(value.to_string()));
            }
        }

        json!({
            "service_id": &self.config.service_id,
            "template_id": &self.config.template_id,
            "user_id": &self.config.user_id,
            "template_params": params,
        })
    }
}

#[async_trait]
impl Channel for EmailJsChannel {
    fn id(&self) -> &str {
        "emailjs"
    }

    async fn deliver(&self, record: &SubmissionRecord) -> Result<DeliveryReceipt, DeliveryError> {
        let resp = self
            .client
            .post(&self.config.url)
            .header("Content-Type", "application/json")
            .json(&self.payload(record))
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(format!("Email notification failed: {e}")))?;

        let status_code = resp.status().as_u16();
        let status = if resp.status().is_success() {
            DeliveryStatus::Delivered
        } else {
            DeliveryStatus::Rejected
        };

        Ok(DeliveryReceipt {
            channel: self.id().to_string(),
            status,
            status_code: Some(status_code),
        })
    }
}
