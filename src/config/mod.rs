pub mod env;
mod loader;

pub use env::{AppConfig, ConfigError, LoggingConfig, MailConfig, WatchConfig, WebContentConfig};
pub use loader::load_config;
