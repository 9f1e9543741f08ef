use std::sync::Arc;

use crate::analytics::AnalyticsSink;
use crate::config::Config;
use crate::delivery::Channel;
use crate::flow::FlowSettings;
use crate::rate_limit::SubmissionRateLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub primary: Arc<dyn Channel>,
    pub notifier: Option<Arc<dyn Channel>>,
    pub analytics: Vec<Arc<dyn AnalyticsSink>>,
    pub submission_limiter: SubmissionRateLimiter,
}

impl AppState {
    pub fn flow_settings(&self) -> FlowSettings {
        FlowSettings {
            source: self.config.source.clone(),
            delivery_timeout: self.config.delivery_timeout,
            notice_ttl: self.config.notice_ttl,
            conversion: self.config.conversion.clone(),
            ..FlowSettings::default()
        }
    }
}
