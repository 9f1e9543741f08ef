pub mod emailjs;
pub mod script;
pub mod smtp;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::submission::SubmissionRecord;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryReceipt {
    pub channel: String,
    pub status: DeliveryStatus,
    pub status_code: Option<u16>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Delivered,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The request could not be put together.
    Build(String),
    Transport(String),
    Timeout(Duration),
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::Build(msg) => write!(f, "Request build failed: {msg}"),
            DeliveryError::Transport(msg) => write!(f, "Delivery failed: {msg}"),
            DeliveryError::Timeout(after) => {
                write!(f, "Delivery timed out after {}ms", after.as_millis())
            }
        }
    }
}

impl std::error::Error for DeliveryError {}

/// An outbound destination for submission records.
#[async_trait]
pub trait Channel: Send + Sync {
    fn id(&self) -> &str;
    async fn deliver(&self, record: &SubmissionRecord) -> Result<DeliveryReceipt, DeliveryError>;
}

/// Run a delivery with an upper bound on how long it may take.
pub async fn deliver_within(
    channel: &dyn Channel,
    record: &SubmissionRecord,
    limit: Duration,
) -> Result<DeliveryReceipt, DeliveryError> {
    match tokio::time::timeout(limit, channel.deliver(record)).await {
        Ok(result) => result,
        Err(_) => Err(DeliveryError::Timeout(limit)),
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, DeliveryError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DeliveryError::Build(format!("Failed to build HTTP client: {e}")))
}
