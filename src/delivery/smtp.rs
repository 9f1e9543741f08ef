use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{Channel, DeliveryError, DeliveryReceipt, DeliveryStatus};
use crate::config::SmtpConfig;
use crate::submission::SubmissionRecord;

/// Mails a plain-text summary of each submission to a fixed inbox.
pub struct SmtpChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    to: String,
}

impl SmtpChannel {
    pub fn new(config: &SmtpConfig) -> Result<Self, DeliveryError> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| DeliveryError::Build(format!("SMTP relay error: {e}")))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
            to: config.to.clone(),
        })
    }
}

pub fn render_summary(record: &SubmissionRecord) -> String {
    let mut body = String::from("New contact form submission\n\n");
    for (name, value) in &record.fields {
        if !value.is_empty() {
            body.push_str(&format!("{name}: {value}\n"));
        }
    }
    body.push_str(&format!(
        "\nSubmitted: {}\nPage: {}\nReferrer: {}\nUser agent: {}\n",
        record.meta.timestamp.to_rfc3339(),
        record.meta.page_url,
        record.meta.referrer,
        record.meta.user_agent,
    ));
    body
}

#[async_trait]
impl Channel for SmtpChannel {
    fn id(&self) -> &str {
        "smtp"
    }

    async fn deliver(&self, record: &SubmissionRecord) -> Result<DeliveryReceipt, DeliveryError> {
        let subject = match record.field("name") {
            Some(name) if !name.is_empty() => format!("New enquiry from {name}"),
            _ => "New enquiry".to_string(),
        };

        let mut builder = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| DeliveryError::Build(format!("Invalid from address: {e}")))?,
            )
            .to(self
                .to
                .parse()
                .map_err(|e| DeliveryError::Build(format!("Invalid to address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);

        if let Some(reply_to) = record.field("email").and_then(|e| e.parse::<Mailbox>().ok()) {
            builder = builder.reply_to(reply_to);
        }

        let message = builder
            .body(render_summary(record))
            .map_err(|e| DeliveryError::Build(format!("Failed to build email: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| DeliveryError::Transport(format!("Failed to send email: {e}")))?;

        Ok(DeliveryReceipt {
            channel: self.id().to_string(),
            status: DeliveryStatus::Delivered,
            status_code: None,
        })
    }
}
