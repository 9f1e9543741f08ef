use std::time::Instant;

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::error::AppError;
use crate::flow::{FormSubmissionFlow, MemorySurface};
use crate::form::{Field, FieldKind};

/// Fragment that reveals the confirmation panel via `:target`.
pub const CONFIRMATION_ANCHOR: &str = "message-sent";
pub const FORM_ANCHOR: &str = "contact-form";
/// Hidden input carrying the referrer of the visit that loaded the page.
pub const REFERRER_FIELD: &str = "_referrer";

pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

pub struct FieldView {
    pub name: String,
    pub label: String,
    pub input_type: &'static str,
    pub is_select: bool,
    pub is_textarea: bool,
    pub required: bool,
    pub value: String,
    pub options: Vec<OptionView>,
    pub error: Option<String>,
}

impl FieldView {
    fn new(field: &Field, error: Option<&str>) -> Self {
        Self {
            name: field.name.clone(),
            label: field.label.clone(),
            input_type: field.kind.input_type(),
            is_select: field.kind == FieldKind::Select,
            is_textarea: field.kind == FieldKind::TextArea,
            required: field.required,
            value: field.value.clone(),
            options: field
                .options
                .iter()
                .map(|o| OptionView {
                    value: o.value.clone(),
                    label: o.label.clone(),
                    selected: o.value == field.value,
                })
                .collect(),
            error: error.map(|e| e.to_string()),
        }
    }
}

pub struct NoticeView {
    pub id: String,
    pub message: String,
    pub ttl_secs: u64,
}

#[derive(Template)]
#[template(path = "contact.html")]
struct ContactTemplate {
    action: String,
    fields: Vec<FieldView>,
    notices: Vec<NoticeView>,
    honeypot_field: Option<String>,
    referrer_field: &'static str,
    referrer: String,
    form_anchor: &'static str,
    confirmation_anchor: &'static str,
}

/// Render the page as the flow left it.
pub fn render(
    flow: &FormSubmissionFlow<MemorySurface>,
    action: &str,
    honeypot_field: Option<&str>,
    status: StatusCode,
) -> Result<Response, AppError> {
    let surface = flow.surface();

    let fields = flow
        .form()
        .fields()
        .iter()
        .map(|f| FieldView::new(f, surface.field_error(&f.name)))
        .collect();

    let notices = surface
        .active_notices(Instant::now())
        .into_iter()
        .map(|n| NoticeView {
            id: n.id.to_string(),
            message: n.message.clone(),
            ttl_secs: n.ttl.as_secs(),
        })
        .collect();

    let template = ContactTemplate {
        action: action.to_string(),
        fields,
        notices,
        honeypot_field: honeypot_field.map(|s| s.to_string()),
        referrer_field: REFERRER_FIELD,
        referrer: flow.client().referrer.clone(),
        form_anchor: FORM_ANCHOR,
        confirmation_anchor: CONFIRMATION_ANCHOR,
    };

    Ok((status, Html(template.render()?)).into_response())
}
