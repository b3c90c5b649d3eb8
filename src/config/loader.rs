use std::{env, path::PathBuf, str::FromStr, time::Duration};

use chrono_tz::Tz;
use url::Url;

use super::env::{
    AppConfig, ConfigError, LoggingConfig, MailConfig, StateConfig, WatchConfig,
    WebContentConfig,
};

pub const DEFAULT_CLASS_NAME: &str = "SWD-6.3A";
pub const DEFAULT_TARGET_URL: &str = "https://iict.mcast.edu.mt/cancelled-lectures/";
pub const DEFAULT_STATE_FILE: &str = "/tmp/mcast_last_notified.txt";
pub const DEFAULT_THRESHOLD: f64 = 0.8;

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, so callers can
    /// supply values without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let username = get("EMAIL_USER").ok_or(ConfigError::Missing("EMAIL_USER"))?;
        let password = get("EMAIL_PASS").ok_or(ConfigError::Missing("EMAIL_PASS"))?;

        let mail = MailConfig {
            recipient: get("TO_EMAIL").unwrap_or_else(|| username.clone()),
            host: get("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
            port: parse_or("SMTP_PORT", get("SMTP_PORT"), 587)?,
            timeout: Duration::from_millis(parse_or(
                "SMTP_TIMEOUT_MS",
                get("SMTP_TIMEOUT_MS"),
                30_000,
            )?),
            username,
            password,
        };

        let threshold = parse_or("FUZZY_THRESHOLD", get("FUZZY_THRESHOLD"), DEFAULT_THRESHOLD)?;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::Invalid {
                key: "FUZZY_THRESHOLD",
                reason: format!("{threshold} is outside (0, 1]"),
            });
        }

        let max_reported = parse_or("MAX_REPORTED_MATCHES", get("MAX_REPORTED_MATCHES"), 10usize)?;
        if max_reported == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_REPORTED_MATCHES",
                reason: "must be at least 1".to_string(),
            });
        }

        let timezone = get("CHECK_TIMEZONE")
            .map(|name| {
                name.trim().parse::<Tz>().map_err(|err| ConfigError::Invalid {
                    key: "CHECK_TIMEZONE",
                    reason: err.to_string(),
                })
            })
            .transpose()?;

        let watch = WatchConfig {
            class_name: lookup("CLASS_NAME").unwrap_or_else(|| DEFAULT_CLASS_NAME.to_string()),
            threshold,
            max_reported,
            timezone,
        };

        let web = WebContentConfig {
            url: parse_url(get("TARGET_URL").as_deref().unwrap_or(DEFAULT_TARGET_URL))?,
            fetch_timeout: Duration::from_millis(parse_or(
                "FETCH_TIMEOUT_MS",
                get("FETCH_TIMEOUT_MS"),
                15_000,
            )?),
        };

        let state = StateConfig {
            path: PathBuf::from(get("STATE_FILE").unwrap_or_else(|| DEFAULT_STATE_FILE.to_string())),
        };

        Ok(Self {
            mail,
            watch,
            web,
            state,
        })
    }
}

impl LoggingConfig {
    /// Logging settings never fail to load, so tracing can be up before the
    /// rest of the configuration is validated.
    pub fn from_env() -> Self {
        Self {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            logs_dir: env::var("LOGS_DIR").ok().filter(|v| !v.is_empty()),
        }
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse::<T>().map_err(|err| ConfigError::Invalid {
            key,
            reason: format!("{value:?}: {err}"),
        }),
    }
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
        Ok(url) => Err(ConfigError::Invalid {
            key: "TARGET_URL",
            reason: format!("unsupported scheme {}", url.scheme()),
        }),
        Err(err) => Err(ConfigError::Invalid {
            key: "TARGET_URL",
            reason: err.to_string(),
        }),
    }
}
