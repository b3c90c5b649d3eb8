mod app;
mod config;
mod domain;
mod infrastructure;
mod matcher;
mod state;
mod web_content;

use std::process::ExitCode;

use app::RunError;
use config::LoggingConfig;
use infrastructure::{directories, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let logging_config = LoggingConfig::from_env();
    let paths = directories::ensure_directories(&logging_config).unwrap_or_else(|err| {
        eprintln!("log directory unavailable, logging to console only: {err:#}");
        directories::ResolvedPaths::default()
    });
    if let Err(err) = logging::init_tracing(&logging_config, &paths) {
        eprintln!("failed to initialize tracing: {err:#}");
    }

    let result = match config::load_config() {
        Ok(config) => app::execute(config).await,
        Err(err) => Err(RunError::from(err)),
    };

    match result {
        Ok(outcome) => {
            tracing::info!(target: "app", ?outcome, "run finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            let code = err.exit_code();
            tracing::error!(target: "app", error = %err, code, "run failed");
            ExitCode::from(code)
        }
    }
}
