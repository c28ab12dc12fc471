//! Layered configuration loading
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults (logging defaults follow the environment)
//! 2. `config/{environment}.{toml,yaml,json}` under the config directory, if present
//! 3. `PV_` environment variables, `__` separating sections
//!    (`PV_OTP__SERVER_SECRET`, `PV_RATE_LIMIT__PER_HOUR`)
//!
//! A `.env` file in the working directory is loaded into the process
//! environment first.

use std::collections::HashMap;
use std::path::Path;

use config::{Config, File};
use tracing::{debug, info, warn};

use pv_shared::config::{AppConfig, Environment, LogFormat, LoggingConfig};

use crate::InfrastructureError;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PV";

/// Load configuration for the environment named by `PV_ENVIRONMENT`
pub fn load_config() -> Result<AppConfig, InfrastructureError> {
    dotenvy::dotenv().ok(); // Load .env file if present

    let environment = Environment::from_env();
    load_config_from(environment, Path::new("."))
}

/// Load configuration for `environment`, reading files relative to `base_dir`
pub fn load_config_from(
    environment: Environment,
    base_dir: &Path,
) -> Result<AppConfig, InfrastructureError> {
    build(environment, base_dir, None)
}

/// Shared by `load_config_from` and tests, which pass the variables
/// explicitly instead of mutating the process environment
pub(crate) fn build(
    environment: Environment,
    base_dir: &Path,
    vars: Option<HashMap<String, String>>,
) -> Result<AppConfig, InfrastructureError> {
    let file = base_dir.join(environment.config_file());
    debug!(environment = %environment, file = %file.display(), "Loading configuration");

    let logging = LoggingConfig::for_environment(environment);
    let settings = Config::builder()
        .set_default("environment", environment.to_string())?
        .set_default("logging.level", logging.level.clone())?
        .set_default("logging.format", log_format_name(logging.format))?
        .set_default("logging.colored", logging.colored)?
        .set_default("logging.source_location", logging.source_location)?
        .add_source(File::with_name(&file.to_string_lossy()).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .source(vars),
        )
        .build()?;

    let app: AppConfig = settings.try_deserialize()?;
    app.validate()?;

    if app.environment.is_production() && app.otp.dry_run {
        warn!(
            environment = %app.environment,
            "Dry-run mode is enabled in production; no SMS will be delivered"
        );
    }

    info!(
        environment = %app.environment,
        sms_provider = ?app.sms.provider,
        dry_run = app.otp.dry_run,
        "Configuration loaded"
    );
    Ok(app)
}

fn log_format_name(format: LogFormat) -> &'static str {
    match format {
        LogFormat::Json => "json",
        LogFormat::Pretty => "pretty",
        LogFormat::Compact => "compact",
    }
}
