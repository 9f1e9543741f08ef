mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use contactflow::analytics::ConversionSettings;
use contactflow::delivery::DeliveryError;
use contactflow::flow::{
    FAILURE_MESSAGE, FlowSettings, FlowState, FormSubmissionFlow, Location, MemorySurface, Outcome,
    View,
};
use contactflow::form::ContactForm;
use contactflow::form::validation::{EMAIL_MESSAGE, REQUIRED_MESSAGE};
use contactflow::submission::ClientContext;

use common::{Behavior, CallLog, RecordingChannel, RecordingSink, call_log, calls, filled_form};

fn flow_with(
    form: ContactForm,
    primary: Behavior,
    notifier: Behavior,
    log: &CallLog,
) -> FormSubmissionFlow<MemorySurface> {
    FormSubmissionFlow::new(
        form,
        MemorySurface::new(),
        RecordingChannel::new("primary", primary, log),
    )
    .with_notifier(RecordingChannel::new("notifier", notifier, log))
}

// ── Validation ──────────────────────────────────────────────────

#[tokio::test]
async fn any_empty_required_field_blocks_submission() {
    let required: Vec<String> = ContactForm::standard()
        .fields()
        .iter()
        .filter(|f| f.required)
        .map(|f| f.name.clone())
        .collect();
    assert_eq!(required, ["name", "email", "service", "message"]);

    for name in &required {
        let log = call_log();
        let mut form = filled_form();
        form.set_value(name, "   ");

        let mut flow = flow_with(form, Behavior::Deliver, Behavior::Deliver, &log);
        let outcome = flow.submit().await;

        let Outcome::Invalid(result) = outcome else {
            panic!("expected Invalid for blank {name}");
        };
        assert!(result.is_invalid(name));
        assert_eq!(result.invalid_fields().count(), 1);
        assert_eq!(flow.surface().field_error(name), Some(REQUIRED_MESSAGE));
        assert!(calls(&log).is_empty(), "no network call for blank {name}");
        assert!(flow.surface().loading_changes().is_empty());
        assert_eq!(flow.state(), FlowState::Idle);
    }
}

#[tokio::test]
async fn malformed_email_is_rejected() {
    for bad in ["not-an-email", "a@b", "a b@c.de", "@x.com", "jo@@x.com"] {
        let log = call_log();
        let mut form = filled_form();
        form.set_value("email", bad);

        let mut flow = flow_with(form, Behavior::Deliver, Behavior::Deliver, &log);
        let outcome = flow.submit().await;

        assert!(matches!(outcome, Outcome::Invalid(_)), "{bad} should be invalid");
        assert_eq!(flow.surface().field_error("email"), Some(EMAIL_MESSAGE));
        assert!(calls(&log).is_empty());
    }
}

#[tokio::test]
async fn well_formed_email_is_accepted() {
    let log = call_log();
    let mut form = filled_form();
    form.set_value("email", "a@b.co");

    let mut flow = flow_with(form, Behavior::Deliver, Behavior::Deliver, &log);
    let result = flow.validate();
    assert!(result.is_valid());
    assert!(flow.surface().field_errors().is_empty());

    assert!(flow.submit().await.is_success());
}

#[tokio::test]
async fn fixed_fields_have_their_errors_cleared() {
    let log = call_log();
    let mut flow = flow_with(ContactForm::standard(), Behavior::Deliver, Behavior::Deliver, &log);

    let result = flow.validate();
    assert!(!result.is_valid());
    assert_eq!(flow.surface().field_errors().len(), 4);

    flow.form_mut().set_value("name", "Jo");
    flow.form_mut().set_value("email", "jo@x.com");
    let result = flow.validate();

    assert!(!result.is_invalid("name"));
    assert!(!result.is_invalid("email"));
    assert_eq!(flow.surface().field_error("name"), None);
    assert_eq!(flow.surface().field_error("email"), None);
    assert_eq!(flow.surface().field_error("service"), Some(REQUIRED_MESSAGE));
    assert_eq!(flow.surface().field_error("message"), Some(REQUIRED_MESSAGE));
}

#[tokio::test]
async fn prefill_then_validate_flags_only_remaining_fields() {
    let log = call_log();
    let mut flow = flow_with(ContactForm::standard(), Behavior::Deliver, Behavior::Deliver, &log);

    let params = BTreeMap::from([
        ("name".to_string(), "Jo".to_string()),
        ("email".to_string(), "jo@x.com".to_string()),
    ]);
    assert_eq!(flow.prefill(&params), 2);

    let result = flow.validate();
    let invalid: Vec<&str> = result.invalid_fields().map(|s| s.field.as_str()).collect();
    assert_eq!(invalid, ["service", "message"]);
    assert!(result.state("name").unwrap().valid);
    assert!(result.state("email").unwrap().valid);
    assert!(calls(&log).is_empty());
}

// ── Delivery ────────────────────────────────────────────────────

#[tokio::test]
async fn valid_submission_hits_primary_then_notifier_once_each() {
    let log = call_log();
    let mut flow = flow_with(filled_form(), Behavior::Deliver, Behavior::Deliver, &log);

    let outcome = flow.submit().await;

    let Outcome::Success(receipt) = outcome else {
        panic!("expected success");
    };
    assert!(receipt.notified);
    assert_eq!(receipt.primary.channel, "primary");
    assert_eq!(calls(&log), ["primary", "notifier"]);
    assert_eq!(flow.surface().loading_changes(), [true, false]);
    assert!(!flow.surface().is_loading());
}

#[tokio::test]
async fn notifier_failure_does_not_change_the_outcome() {
    for notifier in [Behavior::Fail, Behavior::Reject] {
        let log = call_log();
        let mut flow = flow_with(filled_form(), Behavior::Deliver, notifier, &log);

        let outcome = flow.submit().await;

        let Outcome::Success(receipt) = outcome else {
            panic!("expected success with {notifier:?} notifier");
        };
        assert!(!receipt.notified);
        assert!(flow.surface().notices().is_empty());
        assert_eq!(flow.surface().view(), View::Confirmation);
        assert_eq!(flow.state(), FlowState::Success);
    }
}

#[tokio::test]
async fn primary_failure_shows_notice_and_keeps_values() {
    let log = call_log();
    let mut flow = flow_with(filled_form(), Behavior::Fail, Behavior::Deliver, &log);

    let outcome = flow.submit().await;

    assert!(matches!(outcome, Outcome::Failed(DeliveryError::Transport(_))));
    assert_eq!(calls(&log), ["primary"]);

    let notices = flow.surface().notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, FAILURE_MESSAGE);
    assert_eq!(notices[0].ttl, Duration::from_secs(5));

    assert_eq!(flow.form().value("name"), Some("Jo"));
    assert_eq!(flow.form().value("message"), Some("We need a chatbot."));
    assert_eq!(flow.surface().view(), View::Form);
    assert_eq!(flow.surface().loading_changes(), [true, false]);
    assert_eq!(flow.state(), FlowState::Idle);

    // The user may simply try again.
    let log_retry = call_log();
    let mut retry = flow_with(flow.form().clone(), Behavior::Deliver, Behavior::Deliver, &log_retry);
    assert!(retry.submit().await.is_success());
}

#[tokio::test]
async fn hung_primary_times_out_and_releases_loading() {
    let log = call_log();
    let settings = FlowSettings {
        delivery_timeout: Duration::from_millis(50),
        ..FlowSettings::default()
    };
    let mut flow = flow_with(filled_form(), Behavior::Hang, Behavior::Deliver, &log)
        .with_settings(settings);

    let outcome = flow.submit().await;

    assert!(matches!(
        outcome,
        Outcome::Failed(DeliveryError::Timeout(d)) if d == Duration::from_millis(50)
    ));
    assert_eq!(calls(&log), ["primary"]);
    assert!(!flow.surface().is_loading());
    assert_eq!(flow.surface().notices().len(), 1);
}

#[tokio::test]
async fn record_carries_fields_and_page_metadata() {
    let log = call_log();
    let settings = FlowSettings {
        source: "Example Site".to_string(),
        ..FlowSettings::default()
    };
    let mut form = filled_form();
    form.set_value("name", "  Jo  ");

    let mut flow = flow_with(form, Behavior::Deliver, Behavior::Deliver, &log)
        .with_location(Location::parse("https://example.com/contact?service=ai-consulting"))
        .with_client(ClientContext::new("TestAgent/1.0", "https://example.com/services"))
        .with_settings(settings);

    assert!(flow.submit().await.is_success());

    let recorded = log.lock().unwrap();
    let (_, record) = &recorded[0];
    let json = record.to_json();

    assert_eq!(json["name"], "Jo");
    assert_eq!(json["email"], "jo@x.com");
    assert_eq!(json["phone"], "");
    assert_eq!(json["source"], "Example Site");
    assert_eq!(json["pageURL"], "https://example.com/contact?service=ai-consulting");
    assert_eq!(json["userAgent"], "TestAgent/1.0");
    assert_eq!(json["referrer"], "https://example.com/services");
    let timestamp = json["timestamp"].as_str().unwrap();
    assert!(timestamp.ends_with('Z'));
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());

    // Both channels see the same record.
    assert_eq!(recorded[0].1.id, recorded[1].1.id);
}

#[tokio::test]
async fn analytics_receive_conversion_and_lead() {
    let log = call_log();
    let sink = Arc::new(RecordingSink::default());
    let settings = FlowSettings {
        conversion: Some(ConversionSettings {
            send_to: "AW-1/abc".to_string(),
            currency: "INR".to_string(),
        }),
        ..FlowSettings::default()
    };
    let mut flow = flow_with(filled_form(), Behavior::Deliver, Behavior::Deliver, &log)
        .with_analytics(sink.clone())
        .with_settings(settings);

    assert!(flow.submit().await.is_success());

    let events = sink.events.lock().unwrap();
    let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["conversion", "Lead"]);
    assert_eq!(events[0].params["send_to"], "AW-1/abc");
    assert_eq!(events[0].params["currency"], "INR");
    assert_eq!(events[1].params["content_name"], "ai-consulting");
    assert_eq!(events[1].params["content_category"], "Contact Form");
}

#[tokio::test]
async fn no_analytics_on_failure() {
    let log = call_log();
    let sink = Arc::new(RecordingSink::default());
    let mut flow = flow_with(filled_form(), Behavior::Fail, Behavior::Deliver, &log)
        .with_analytics(sink.clone());

    flow.submit().await;

    assert!(sink.events.lock().unwrap().is_empty());
}

// ── Success, reset ──────────────────────────────────────────────

#[tokio::test]
async fn success_clears_fields_and_strips_query() {
    let log = call_log();
    let mut flow = flow_with(ContactForm::standard(), Behavior::Deliver, Behavior::Deliver, &log)
        .with_location(Location::parse(
            "https://example.com/contact?service=web-development&name=Jo&email=jo%40x.com",
        ));

    assert_eq!(flow.prefill_from_location(), 3);
    flow.form_mut().set_value("message", "Hello");

    assert!(flow.submit().await.is_success());

    assert!(flow.form().is_pristine());
    assert!(flow.form().fields().iter().all(|f| f.value.is_empty()));
    assert_eq!(flow.location().href(), "https://example.com/contact");
    let replaced = flow.surface().replaced_location().unwrap();
    assert!(!replaced.has_query());
    assert_eq!(flow.surface().view(), View::Confirmation);
    assert_eq!(flow.surface().scrolls(), [View::Confirmation]);
}

#[tokio::test]
async fn submit_is_ignored_while_confirmation_shows() {
    let log = call_log();
    let mut flow = flow_with(filled_form(), Behavior::Deliver, Behavior::Deliver, &log);
    assert!(flow.submit().await.is_success());

    for (name, value) in [("name", "Al"), ("email", "al@x.com"), ("service", "other"), ("message", "Hi")] {
        flow.form_mut().set_value(name, value);
    }
    assert!(matches!(flow.submit().await, Outcome::Ignored));
    assert_eq!(calls(&log).len(), 2);
}

#[tokio::test]
async fn reset_from_confirmation_returns_to_empty_form() {
    let log = call_log();
    let mut flow = flow_with(filled_form(), Behavior::Deliver, Behavior::Deliver, &log);
    assert!(flow.submit().await.is_success());

    flow.reset();

    assert_eq!(flow.state(), FlowState::Idle);
    assert_eq!(flow.surface().view(), View::Form);
    assert!(flow.form().is_pristine());
    assert_eq!(flow.surface().scrolls(), [View::Confirmation, View::Form]);

    // A fresh attempt goes through again.
    for (name, value) in [("name", "Al"), ("email", "al@x.com"), ("service", "other"), ("message", "Hi")] {
        flow.form_mut().set_value(name, value);
    }
    assert!(flow.submit().await.is_success());
    assert_eq!(calls(&log).len(), 4);
}

#[tokio::test]
async fn reset_from_idle_only_scrolls() {
    let log = call_log();
    let mut flow = flow_with(filled_form(), Behavior::Deliver, Behavior::Deliver, &log);

    flow.reset();

    assert_eq!(flow.state(), FlowState::Idle);
    assert_eq!(flow.surface().view(), View::Form);
    assert_eq!(flow.surface().scrolls(), [View::Form]);
    assert_eq!(flow.form().value("name"), Some("Jo"));
    assert!(calls(&log).is_empty());
}

#[tokio::test]
async fn on_error_notice_expires_and_can_be_dismissed() {
    let log = call_log();
    let mut flow = flow_with(filled_form(), Behavior::Deliver, Behavior::Deliver, &log);

    flow.on_error("Something went wrong");
    flow.on_error("Second problem");

    let surface = flow.surface_mut();
    let first = surface.notices()[0].clone();
    assert_eq!(surface.active_notices(first.raised_at).len(), 2);
    assert!(
        surface
            .active_notices(first.raised_at + Duration::from_secs(6))
            .is_empty()
    );

    assert!(surface.dismiss_notice(first.id));
    assert!(!surface.dismiss_notice(first.id));
    assert_eq!(surface.notices().len(), 1);
    assert_eq!(surface.notices()[0].message, "Second problem");

    surface.expire_notices(first.raised_at + Duration::from_secs(10));
    assert!(surface.notices().is_empty());
}
