use std::{path::PathBuf, time::Duration};

use chrono_tz::Tz;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mail: MailConfig,
    pub watch: WatchConfig,
    pub web: WebContentConfig,
    pub state: StateConfig,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub username: String,
    pub password: String,
    pub recipient: String,
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub class_name: String,
    pub threshold: f64,
    pub max_reported: usize,
    /// `None` means the host's local time zone.
    pub timezone: Option<Tz>,
}

#[derive(Debug, Clone)]
pub struct WebContentConfig {
    pub url: Url,
    pub fetch_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct StateConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub logs_dir: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
