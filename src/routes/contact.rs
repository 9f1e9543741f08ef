use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

use crate::error::AppError;
use crate::flow::{FormSubmissionFlow, Location, MemorySurface, Outcome};
use crate::form::ContactForm;
use crate::state::SharedState;
use crate::submission::{ClientContext, honeypot, metadata, parser};
use crate::views::contact::{self as view, CONFIRMATION_ANCHOR, REFERRER_FIELD};

const PAGE_PATH: &str = "/contact";

fn page_location(state: &SharedState, query: Option<&str>) -> Location {
    let base = state.config.base_url.trim_end_matches('/');
    let href = match query {
        Some(q) if !q.is_empty() => format!("{base}{PAGE_PATH}?{q}"),
        _ => format!("{base}{PAGE_PATH}"),
    };
    Location::parse(&href)
}

/// Form target relative to the serving host, keeping any prefill query.
fn page_action(location: &Location) -> String {
    Location {
        base: PAGE_PATH.to_string(),
        query: location.query.clone(),
        fragment: None,
    }
    .href()
}

fn new_flow(
    state: &SharedState,
    location: Location,
    client: ClientContext,
) -> FormSubmissionFlow<MemorySurface> {
    let mut flow = FormSubmissionFlow::new(
        ContactForm::standard(),
        MemorySurface::new(),
        state.primary.clone(),
    )
    .with_location(location)
    .with_client(client)
    .with_settings(state.flow_settings());

    if let Some(notifier) = &state.notifier {
        flow = flow.with_notifier(notifier.clone());
    }
    for sink in &state.analytics {
        flow = flow.with_analytics(sink.clone());
    }
    flow
}

/// Relative, so the browser stays on whatever host served the page.
fn confirmation_redirect() -> Response {
    let target = Location::parse(PAGE_PATH).with_fragment(CONFIRMATION_ANCHOR);
    Redirect::to(&target.href()).into_response()
}

/// The referrer of the visit that loaded the page, carried through the form.
/// The POST's own `Referer` is the contact page itself.
fn posted_client(headers: &HeaderMap, pairs: &[(String, String)]) -> ClientContext {
    let mut client = ClientContext::from_headers(headers);
    client.referrer = pairs
        .iter()
        .find(|(k, _)| k == REFERRER_FIELD)
        .map(|(_, v)| v.clone())
        .unwrap_or_default();
    client
}

pub async fn show(
    State(state): State<SharedState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let location = page_location(&state, query.as_deref());
    let mut flow = new_flow(&state, location, ClientContext::from_headers(&headers));

    let filled = flow.prefill_from_location();
    if filled > 0 {
        tracing::debug!("Prefilled {filled} contact field(s) from query");
    }

    view::render(
        &flow,
        &page_action(flow.location()),
        state.config.honeypot_field.as_deref(),
        StatusCode::OK,
    )
}

pub async fn submit(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok());
    let pairs = parser::parse_body(content_type, &body).map_err(AppError::BadRequest)?;

    let honeypot_field = state.config.honeypot_field.as_deref();
    let location = page_location(&state, query.as_deref());
    let mut flow = new_flow(&state, location, posted_client(&headers, &pairs));
    let action = page_action(flow.location());
    flow.form_mut()
        .fill(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    let ip = metadata::client_ip(&headers, Some(addr.ip()), &state.config.trusted_proxies);
    if let Err(retry_after) = state.submission_limiter.check(ip) {
        tracing::warn!("Contact form rate limited for {ip}");
        flow.on_error(&format!(
            "Too many submissions. Please try again in {retry_after}s."
        ));
        return view::render(&flow, &action, honeypot_field, StatusCode::TOO_MANY_REQUESTS);
    }

    if honeypot::is_spam(
        pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        honeypot_field,
    ) {
        // Looks like a success to the sender; nothing is relayed.
        tracing::info!("Honeypot filled by {ip}, dropping submission");
        return Ok(confirmation_redirect());
    }

    match flow.submit().await {
        Outcome::Success(receipt) => {
            tracing::info!(
                submission = %receipt.submission_id,
                notified = receipt.notified,
                "Contact form delivered"
            );
            Ok(confirmation_redirect())
        }
        Outcome::Invalid(_) => view::render(&flow, &action, honeypot_field, StatusCode::UNPROCESSABLE_ENTITY),
        Outcome::Failed(_) => view::render(&flow, &action, honeypot_field, StatusCode::BAD_GATEWAY),
        Outcome::Ignored => view::render(&flow, &action, honeypot_field, StatusCode::OK),
    }
}
