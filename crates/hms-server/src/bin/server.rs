//! HMS Server Binary

use anyhow::{bail, Result};
use hms_common_log::{LogConfig, LogFormat, LogLevel};
use hms_server::config::{load_config, validate_config, LoggingConfig};
use hms_server::Server;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = load_config()?;
    hms_common_log::init(log_config(&config.logging))?;

    if let Err(errors) = validate_config(&config) {
        for err in &errors {
            error!(error = %err, "Invalid configuration");
        }
        bail!("configuration has {} error(s)", errors.len());
    }

    info!("Starting HMS Server v{}", env!("CARGO_PKG_VERSION"));

    let server = Server::new(config).await?;
    server.run().await?;

    info!("Server shutdown complete");
    Ok(())
}

fn log_config(logging: &LoggingConfig) -> LogConfig {
    LogConfig {
        level: LogLevel::parse(&logging.level).unwrap_or_default(),
        format: LogFormat::parse(&logging.format).unwrap_or_default(),
        file_path: logging.file.as_ref().map(Into::into),
        ..LogConfig::default()
    }
}
