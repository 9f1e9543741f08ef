#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use reqwest::Client;
use serde_json::Value;

use contactflow::analytics::{AnalyticsSink, TrackingEvent};
use contactflow::config::{Config, NotifierConfig};
use contactflow::delivery::emailjs::EmailJsConfig;
use contactflow::delivery::{Channel, DeliveryError, DeliveryReceipt, DeliveryStatus};
use contactflow::form::ContactForm;
use contactflow::form::validation;
use contactflow::submission::{RecordMetadata, SubmissionRecord};

// ── Mock relay server ───────────────────────────────────────────

/// One request received by the mock relay.
#[derive(Debug, Clone)]
pub struct Captured {
    pub path: String,
    pub content_type: Option<String>,
    pub body: Value,
}

type RelayLog = Arc<Mutex<Vec<Captured>>>;

/// Stand-in for the script and notification endpoints.
pub struct MockRelay {
    pub addr: SocketAddr,
    log: RelayLog,
}

impl MockRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn received(&self) -> Vec<Captured> {
        self.log.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.received().into_iter().map(|c| c.path).collect()
    }
}

async fn capture(
    State(log): State<RelayLog>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    log.lock().unwrap().push(Captured {
        path: path.clone(),
        content_type: headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string()),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    match path.as_str() {
        "/fail" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "/slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            (StatusCode::OK, "late").into_response()
        }
        _ => (StatusCode::OK, "OK").into_response(),
    }
}

/// Spawn a relay on a random port that records every POST it receives.
pub async fn spawn_relay() -> MockRelay {
    let log: RelayLog = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new()
        .route("/script", post(capture))
        .route("/notify", post(capture))
        .route("/fail", post(capture))
        .route("/slow", post(capture))
        .with_state(log.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind relay");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Relay failed");
    });

    MockRelay { addr, log }
}

/// A URL nothing is listening on.
pub async fn dead_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/script")
}

// ── In-process doubles ──────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Deliver,
    Reject,
    Fail,
    Hang,
}

pub type CallLog = Arc<Mutex<Vec<(String, SubmissionRecord)>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// A channel that records what it was asked to deliver into a shared log,
/// so ordering across channels can be asserted.
pub struct RecordingChannel {
    name: String,
    behavior: Behavior,
    log: CallLog,
}

impl RecordingChannel {
    pub fn new(name: &str, behavior: Behavior, log: &CallLog) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            behavior,
            log: log.clone(),
        })
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn id(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, record: &SubmissionRecord) -> Result<DeliveryReceipt, DeliveryError> {
        self.log
            .lock()
            .unwrap()
            .push((self.name.clone(), record.clone()));

        let status = match self.behavior {
            Behavior::Deliver => DeliveryStatus::Delivered,
            Behavior::Reject => DeliveryStatus::Rejected,
            Behavior::Fail => {
                return Err(DeliveryError::Transport("connection refused".to_string()));
            }
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                DeliveryStatus::Delivered
            }
        };

        Ok(DeliveryReceipt {
            channel: self.name.clone(),
            status,
            status_code: Some(200),
        })
    }
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().iter().map(|(name, _)| name.clone()).collect()
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<TrackingEvent>>,
}

impl AnalyticsSink for RecordingSink {
    fn id(&self) -> &str {
        "recording"
    }

    fn track(&self, event: &TrackingEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Standard form with every required field filled in.
pub fn filled_form() -> ContactForm {
    let mut form = ContactForm::standard();
    form.set_value("name", "Jo");
    form.set_value("email", "jo@x.com");
    form.set_value("service", "ai-consulting");
    form.set_value("message", "We need a chatbot.");
    form
}

/// A record built from [`filled_form`] with fixed metadata.
pub fn sample_record() -> SubmissionRecord {
    let form = filled_form();
    let validated = validation::check(&form).expect("filled form validates");
    SubmissionRecord::new(
        validated,
        RecordMetadata {
            timestamp: chrono::Utc::now(),
            source: "Test Site".to_string(),
            page_url: "https://example.com/contact".to_string(),
            user_agent: "TestAgent/1.0".to_string(),
            referrer: String::new(),
        },
    )
}

// ── Hosted app ──────────────────────────────────────────────────

pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST a urlencoded form to `path`, return (status, location header, body).
    pub async fn post_form(&self, path: &str, data: &[(&str, &str)]) -> (StatusCode, Option<String>, String) {
        let resp = self
            .client
            .post(self.url(path))
            .form(data)
            .send()
            .await
            .expect("post form failed");
        let status = resp.status();
        let location = resp
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = resp.text().await.unwrap_or_default();
        (status, location, body)
    }
}

pub fn test_config(relay: &MockRelay) -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        script_url: relay.url("/script"),
        source: "Test Site".to_string(),
        delivery_timeout: Duration::from_secs(2),
        notice_ttl: Duration::from_secs(5),
        notifier: NotifierConfig::EmailJs(EmailJsConfig {
            url: relay.url("/notify"),
            service_id: "service_test".to_string(),
            template_id: "template_test".to_string(),
            user_id: "user_test".to_string(),
        }),
        conversion: None,
        honeypot_field: Some("website".to_string()),
        rate_limit: 100,
        rate_limit_window_secs: 60,
        max_body_size: 65_536,
        trusted_proxies: vec![],
        log_level: "warn".to_string(),
    }
}

pub async fn spawn_app(config: Config) -> TestApp {
    let state = contactflow::build_state(config).expect("Failed to build state");
    let app = contactflow::build_app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp { addr, client }
}
