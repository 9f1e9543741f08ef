//! The contact-form submission flow.
//!
//! A [`FormSubmissionFlow`] owns one form and drives it through
//! `Idle -> Validating -> {Idle | Submitting} -> {Success | Error} -> Idle`.
//! All page mutations go through a [`FormSurface`]; all outbound traffic goes
//! through [`Channel`]s. `Success` is only left again through [`reset`].
//!
//! [`reset`]: FormSubmissionFlow::reset

pub mod location;
pub mod surface;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::analytics::{self, AnalyticsSink, ConversionSettings};
use crate::delivery::{self, Channel, DeliveryError, DeliveryReceipt, DeliveryStatus};
use crate::form::validation::{self, ValidationResult};
use crate::form::{ContactForm, prefill};
use crate::submission::{ClientContext, RecordMetadata, SubmissionRecord};

pub use location::Location;
pub use surface::{FormSurface, MemorySurface, Notice, View};

pub const FAILURE_MESSAGE: &str = "Failed to send message. Please try again or contact us directly.";

#[derive(Debug, Clone)]
pub struct FlowSettings {
    /// Label stored in every record's `source` field.
    pub source: String,
    /// Upper bound for each outbound call.
    pub delivery_timeout: Duration,
    pub notice_ttl: Duration,
    pub failure_message: String,
    pub conversion: Option<ConversionSettings>,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            source: "Website".to_string(),
            delivery_timeout: Duration::from_secs(15),
            notice_ttl: Duration::from_secs(5),
            failure_message: FAILURE_MESSAGE.to_string(),
            conversion: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Validating,
    Submitting,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub submission_id: Uuid,
    pub primary: DeliveryReceipt,
    pub notified: bool,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    /// Validation failed; nothing was sent.
    Invalid(ValidationResult),
    Success(SubmissionReceipt),
    /// The primary delivery failed; the user has been told.
    Failed(DeliveryError),
    /// Submit was triggered while the confirmation view was showing.
    Ignored,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

pub struct FormSubmissionFlow<S: FormSurface> {
    form: ContactForm,
    surface: S,
    location: Location,
    client: ClientContext,
    primary: Arc<dyn Channel>,
    notifier: Option<Arc<dyn Channel>>,
    analytics: Vec<Arc<dyn AnalyticsSink>>,
    settings: FlowSettings,
    state: FlowState,
    validation: ValidationResult,
}

impl<S: FormSurface> FormSubmissionFlow<S> {
    pub fn new(form: ContactForm, surface: S, primary: Arc<dyn Channel>) -> Self {
        Self {
            form,
            surface,
            location: Location::default(),
            client: ClientContext::default(),
            primary,
            notifier: None,
            analytics: Vec::new(),
            settings: FlowSettings::default(),
            state: FlowState::Idle,
            validation: ValidationResult::default(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Channel>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_analytics(mut self, sink: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics.push(sink);
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn with_client(mut self, client: ClientContext) -> Self {
        self.client = client;
        self
    }

    pub fn with_settings(mut self, settings: FlowSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn form(&self) -> &ContactForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ContactForm {
        &mut self.form
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn client(&self) -> &ClientContext {
        &self.client
    }

    pub fn last_validation(&self) -> &ValidationResult {
        &self.validation
    }

    /// Populate the form from caller-supplied parameters. Returns how many
    /// fields were set.
    pub fn prefill(&mut self, params: &BTreeMap<String, String>) -> usize {
        prefill::prefill(&mut self.form, params)
    }

    pub fn prefill_from_location(&mut self) -> usize {
        let params = self.location.params();
        self.prefill(&params)
    }

    /// Re-derive every field's validation state and mirror it on the surface.
    pub fn validate(&mut self) -> ValidationResult {
        let result = validation::validate(&self.form);
        annotate(&mut self.surface, &self.validation, &result);
        self.validation = result.clone();
        result
    }

    pub async fn submit(&mut self) -> Outcome {
        if self.state == FlowState::Success {
            tracing::debug!("Submit ignored while the confirmation is showing");
            return Outcome::Ignored;
        }

        self.state = FlowState::Validating;
        let meta = self.metadata();

        let record = match validation::check(&self.form) {
            Ok(validated) => {
                annotate(&mut self.surface, &self.validation, validated.result());
                self.validation = validated.result().clone();
                SubmissionRecord::new(validated, meta)
            }
            Err(result) => {
                annotate(&mut self.surface, &self.validation, &result);
                self.validation = result.clone();
                self.state = FlowState::Idle;
                tracing::debug!(
                    "Contact form rejected: {} invalid field(s)",
                    result.invalid_fields().count()
                );
                return Outcome::Invalid(result);
            }
        };

        self.state = FlowState::Submitting;
        self.surface.set_loading(true);
        tracing::info!(submission = %record.id, "Submitting contact form");

        let outcome = self.dispatch(&record).await;

        self.surface.set_loading(false);
        outcome
    }

    async fn dispatch(&mut self, record: &SubmissionRecord) -> Outcome {
        let limit = self.settings.delivery_timeout;

        let primary = match delivery::deliver_within(self.primary.as_ref(), record, limit).await {
            Ok(receipt) => receipt,
            Err(e) => {
                tracing::error!(submission = %record.id, channel = self.primary.id(), "Form submission error: {e}");
                self.state = FlowState::Error;
                let message = self.settings.failure_message.clone();
                self.on_error(&message);
                return Outcome::Failed(e);
            }
        };

        let notified = self.notify(record).await;
        self.track(record);
        self.on_success();

        Outcome::Success(SubmissionReceipt {
            submission_id: record.id,
            primary,
            notified,
        })
    }

    /// Best effort. Failures are logged and never reach the user.
    async fn notify(&self, record: &SubmissionRecord) -> bool {
        let Some(channel) = &self.notifier else {
            return false;
        };

        match delivery::deliver_within(channel.as_ref(), record, self.settings.delivery_timeout).await {
            Ok(receipt) if receipt.status == DeliveryStatus::Delivered => {
                tracing::debug!(submission = %record.id, channel = channel.id(), "Notification sent");
                true
            }
            Ok(receipt) => {
                tracing::warn!(
                    submission = %record.id,
                    channel = channel.id(),
                    "Notification rejected (status {:?})",
                    receipt.status_code
                );
                false
            }
            Err(e) => {
                tracing::warn!(submission = %record.id, channel = channel.id(), "Notification failed: {e}");
                false
            }
        }
    }

    fn track(&self, record: &SubmissionRecord) {
        if self.analytics.is_empty() {
            return;
        }
        for event in analytics::submission_events(record, self.settings.conversion.as_ref()) {
            for sink in &self.analytics {
                sink.track(&event);
            }
        }
    }

    fn metadata(&self) -> RecordMetadata {
        RecordMetadata {
            timestamp: Utc::now(),
            source: self.settings.source.clone(),
            page_url: self.location.href(),
            user_agent: self.client.user_agent.clone(),
            referrer: self.client.referrer.clone(),
        }
    }

    /// Swap the form for the confirmation, clear the inputs and drop any
    /// prefill parameters from the location.
    pub fn on_success(&mut self) {
        self.surface.show_view(View::Confirmation);
        self.surface.scroll_into_view(View::Confirmation);
        self.form.reset();
        self.location = self.location.without_query();
        self.surface.replace_location(&self.location);
        self.state = FlowState::Success;
    }

    /// Show a dismissible, self-expiring notice. Field values stay as they are.
    pub fn on_error(&mut self, message: &str) {
        self.surface
            .show_notice(Notice::new(message, self.settings.notice_ttl));
        self.state = FlowState::Idle;
    }

    /// Leave the confirmation for an empty form. Anywhere else this only
    /// scrolls the form into view.
    pub fn reset(&mut self) {
        if self.state == FlowState::Success {
            self.surface.show_view(View::Form);
            self.form.reset();
            self.state = FlowState::Idle;
        }
        self.surface.scroll_into_view(View::Form);
    }
}

fn annotate<S: FormSurface>(surface: &mut S, previous: &ValidationResult, current: &ValidationResult) {
    for state in &current.states {
        match &state.message {
            Some(message) if !state.valid => surface.show_field_error(&state.field, message),
            _ => {
                if previous.is_invalid(&state.field) {
                    surface.clear_field_error(&state.field);
                }
            }
        }
    }

    // An email field that was flagged and is now empty but optional drops out
    // of the result entirely.
    for stale in previous.invalid_fields() {
        if current.state(&stale.field).is_none() {
            surface.clear_field_error(&stale.field);
        }
    }
}
