use std::time::Duration;

use async_trait::async_trait;

use super::{Channel, DeliveryError, DeliveryReceipt, DeliveryStatus, http_client};
use crate::submission::SubmissionRecord;

/// Posts the record as JSON to a spreadsheet-backed script endpoint.
///
/// The endpoint's answer carries no meaning for the submitter, so any HTTP
/// response counts as delivered. Only failing to send at all is an error.
pub struct ScriptChannel {
    client: reqwest::Client,
    url: String,
}

impl ScriptChannel {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, DeliveryError> {
        if url.is_empty() {
            return Err(DeliveryError::Build("script url is required".to_string()));
        }
        Ok(Self {
            client: http_client(timeout)?,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Channel for ScriptChannel {
    fn id(&self) -> &str {
        "script"
    }

    async fn deliver(&self, record: &SubmissionRecord) -> Result<DeliveryReceipt, DeliveryError> {
        let resp = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&record.to_json())
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    DeliveryError::Build(format!("Script request invalid: {e}"))
                } else {
                    DeliveryError::Transport(format!("Script request failed: {e}"))
                }
            })?;

        let status_code = resp.status().as_u16();
        tracing::debug!("Script endpoint answered {status_code} for submission {}", record.id);

        Ok(DeliveryReceipt {
            channel: self.id().to_string(),
            status: DeliveryStatus::Delivered,
            status_code: Some(status_code),
        })
    }
}
