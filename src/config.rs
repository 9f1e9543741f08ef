use std::net::IpAddr;
use std::time::Duration;

use ipnet::IpNet;

use crate::analytics::ConversionSettings;
use crate::delivery::emailjs::{self, EmailJsConfig};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub script_url: String,
    pub source: String,
    pub delivery_timeout: Duration,
    pub notice_ttl: Duration,
    pub notifier: NotifierConfig,
    pub conversion: Option<ConversionSettings>,
    pub honeypot_field: Option<String>,
    pub rate_limit: u32,
    pub rate_limit_window_secs: u64,
    pub max_body_size: usize,
    pub trusted_proxies: Vec<IpNet>,
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
    pub to: String,
}

/// Which secondary channel receives a copy of each submission.
#[derive(Debug, Clone)]
pub enum NotifierConfig {
    None,
    EmailJs(EmailJsConfig),
    Smtp(SmtpConfig),
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let script_url = env_required("CONTACTFLOW_SCRIPT_URL")?;

        let host: IpAddr = env_or("CONTACTFLOW_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid CONTACTFLOW_HOST: {e}"))?;

        let port: u16 = env_or("CONTACTFLOW_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid CONTACTFLOW_PORT: {e}"))?;

        let base_url = env_or("CONTACTFLOW_BASE_URL", &format!("http://{host}:{port}"));
        let source = env_or("CONTACTFLOW_SOURCE", "Website");

        let delivery_timeout = Duration::from_secs(
            env_or("CONTACTFLOW_DELIVERY_TIMEOUT_SECS", "15")
                .parse()
                .map_err(|e| format!("Invalid CONTACTFLOW_DELIVERY_TIMEOUT_SECS: {e}"))?,
        );

        let notice_ttl = Duration::from_secs(
            env_or("CONTACTFLOW_NOTICE_SECS", "5")
                .parse()
                .map_err(|e| format!("Invalid CONTACTFLOW_NOTICE_SECS: {e}"))?,
        );

        let notifier = notifier_from_env()?;

        let conversion = std::env::var("CONTACTFLOW_CONVERSION_SEND_TO")
            .ok()
            .filter(|s| !s.is_empty())
            .map(|send_to| ConversionSettings {
                send_to,
                currency: env_or("CONTACTFLOW_CONVERSION_CURRENCY", "INR"),
            });

        let honeypot_field = std::env::var("CONTACTFLOW_HONEYPOT_FIELD")
            .ok()
            .filter(|s| !s.is_empty());

        let rate_limit: u32 = env_or("CONTACTFLOW_RATE_LIMIT", "5")
            .parse()
            .map_err(|e| format!("Invalid CONTACTFLOW_RATE_LIMIT: {e}"))?;

        let rate_limit_window_secs: u64 = env_or("CONTACTFLOW_RATE_LIMIT_WINDOW_SECS", "60")
            .parse()
            .map_err(|e| format!("Invalid CONTACTFLOW_RATE_LIMIT_WINDOW_SECS: {e}"))?;

        let max_body_size: usize = env_or("CONTACTFLOW_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid CONTACTFLOW_MAX_BODY_SIZE: {e}"))?;

        let trusted_proxies: Vec<IpNet> = env_or("CONTACTFLOW_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid CONTACTFLOW_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let log_level = env_or("CONTACTFLOW_LOG_LEVEL", "info");

        Ok(Config {
            host,
            port,
            base_url,
            script_url,
            source,
            delivery_timeout,
            notice_ttl,
            notifier,
            conversion,
            honeypot_field,
            rate_limit,
            rate_limit_window_secs,
            max_body_size,
            trusted_proxies,
            log_level,
        })
    }
}

/// EmailJS wins when both it and SMTP are configured.
fn notifier_from_env() -> Result<NotifierConfig, String> {
    if let (Some(service_id), Some(template_id), Some(user_id)) = (
        std::env::var("CONTACTFLOW_EMAILJS_SERVICE_ID").ok(),
        std::env::var("CONTACTFLOW_EMAILJS_TEMPLATE_ID").ok(),
        std::env::var("CONTACTFLOW_EMAILJS_USER_ID").ok(),
    ) {
        return Ok(NotifierConfig::EmailJs(EmailJsConfig {
            url: env_or("CONTACTFLOW_EMAILJS_URL", emailjs::DEFAULT_URL),
            service_id,
            template_id,
            user_id,
        }));
    }

    let smtp = match (
        std::env::var("CONTACTFLOW_SMTP_HOST").ok(),
        std::env::var("CONTACTFLOW_SMTP_PORT").ok(),
        std::env::var("CONTACTFLOW_SMTP_USER").ok(),
        std::env::var("CONTACTFLOW_SMTP_PASS").ok(),
        std::env::var("CONTACTFLOW_SMTP_FROM").ok(),
        std::env::var("CONTACTFLOW_SMTP_TO").ok(),
    ) {
        (Some(host), Some(port), Some(user), Some(pass), Some(from), Some(to)) => {
            NotifierConfig::Smtp(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid CONTACTFLOW_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
                to,
            })
        }
        _ => NotifierConfig::None,
    };

    Ok(smtp)
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
