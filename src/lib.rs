pub mod analytics;
pub mod config;
pub mod delivery;
pub mod error;
pub mod flow;
pub mod form;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod submission;
pub mod views;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::analytics::{AnalyticsSink, LogSink};
use crate::config::{Config, NotifierConfig};
use crate::delivery::Channel;
use crate::delivery::emailjs::EmailJsChannel;
use crate::delivery::script::ScriptChannel;
use crate::delivery::smtp::SmtpChannel;
use crate::rate_limit::SubmissionRateLimiter;
use crate::state::{AppState, SharedState};

/// Wire up delivery channels and shared state from configuration.
pub fn build_state(config: Config) -> Result<SharedState, String> {
    let primary: Arc<dyn Channel> = Arc::new(
        ScriptChannel::new(&config.script_url, config.delivery_timeout)
            .map_err(|e| format!("Script channel unavailable: {e}"))?,
    );

    let notifier: Option<Arc<dyn Channel>> = match &config.notifier {
        NotifierConfig::None => None,
        NotifierConfig::EmailJs(emailjs) => {
            match EmailJsChannel::new(emailjs.clone(), config.delivery_timeout) {
                Ok(channel) => {
                    tracing::info!("EmailJS notifications configured");
                    Some(Arc::new(channel))
                }
                Err(e) => {
                    tracing::warn!("EmailJS notifications not available: {e}");
                    None
                }
            }
        }
        NotifierConfig::Smtp(smtp) => match SmtpChannel::new(smtp) {
            Ok(channel) => {
                tracing::info!("SMTP notifications configured");
                Some(Arc::new(channel))
            }
            Err(e) => {
                tracing::warn!("SMTP notifications not available: {e}");
                None
            }
        },
    };

    let analytics: Vec<Arc<dyn AnalyticsSink>> = vec![Arc::new(LogSink)];

    let submission_limiter = SubmissionRateLimiter::new(
        config.rate_limit,
        Duration::from_secs(config.rate_limit_window_secs),
    );

    Ok(Arc::new(AppState {
        config,
        primary,
        notifier,
        analytics,
        submission_limiter,
    }))
}

pub fn build_app(state: SharedState) -> Router {
    let max_body_size = state.config.max_body_size;

    Router::new()
        .merge(routes::page_routes())
        .route("/health", axum::routing::get(health))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
