use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use uuid::Uuid;

use super::location::Location;

/// Which of the two mutually exclusive panels is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Form,
    Confirmation,
}

/// A dismissible message that disappears on its own after `ttl`.
#[derive(Debug, Clone)]
pub struct Notice {
    pub id: Uuid,
    pub message: String,
    pub raised_at: Instant,
    pub ttl: Duration,
}

impl Notice {
    pub fn new(message: &str, ttl: Duration) -> Self {
        Self {
            id: Uuid::now_v7(),
            message: message.to_string(),
            raised_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.duration_since(self.raised_at) >= self.ttl
    }
}

/// The page elements a submission flow mutates.
pub trait FormSurface {
    fn show_field_error(&mut self, field: &str, message: &str);
    fn clear_field_error(&mut self, field: &str);
    fn set_loading(&mut self, loading: bool);
    fn show_view(&mut self, view: View);
    fn scroll_into_view(&mut self, view: View);
    fn show_notice(&mut self, notice: Notice);
    fn replace_location(&mut self, location: &Location);
}

/// A surface that keeps everything in memory. The hosted page renders from
/// it after the flow has run; tests inspect it directly.
#[derive(Debug)]
pub struct MemorySurface {
    errors: BTreeMap<String, String>,
    loading: bool,
    loading_changes: Vec<bool>,
    view: View,
    scrolls: Vec<View>,
    notices: Vec<Notice>,
    location: Option<Location>,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySurface {
    pub fn new() -> Self {
        Self {
            errors: BTreeMap::new(),
            loading: false,
            loading_changes: Vec::new(),
            view: View::Form,
            scrolls: Vec::new(),
            notices: Vec::new(),
            location: None,
        }
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(|s| s.as_str())
    }

    pub fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Every loading transition in order, e.g. `[true, false]` for one submit.
    pub fn loading_changes(&self) -> &[bool] {
        &self.loading_changes
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn scrolls(&self) -> &[View] {
        &self.scrolls
    }

    /// The location written by the flow, if it replaced one.
    pub fn replaced_location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Notices still showing at `now`: not dismissed and not expired.
    pub fn active_notices(&self, now: Instant) -> Vec<&Notice> {
        self.notices.iter().filter(|n| !n.is_expired_at(now)).collect()
    }

    /// Dismiss a notice. Returns false if it was already gone.
    pub fn dismiss_notice(&mut self, id: Uuid) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        self.notices.len() != before
    }

    pub fn expire_notices(&mut self, now: Instant) {
        self.notices.retain(|n| !n.is_expired_at(now));
    }
}

impl FormSurface for MemorySurface {
    fn show_field_error(&mut self, field: &str, message: &str) {
        self.errors.insert(field.to_string(), message.to_string());
    }

    fn clear_field_error(&mut self, field: &str) {
        self.errors.remove(field);
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
        self.loading_changes.push(loading);
    }

    fn show_view(&mut self, view: View) {
        self.view = view;
    }

    fn scroll_into_view(&mut self, view: View) {
        self.scrolls.push(view);
    }

    fn show_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    fn replace_location(&mut self, location: &Location) {
        self.location = Some(location.clone());
    }
}
