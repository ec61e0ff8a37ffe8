//! Installing the global `tracing` subscriber

use crate::settings::{LoggingSettings, SettingsError};
use tracing_subscriber::EnvFilter;

/// Build the filter for `settings`; `RUST_LOG` takes precedence when set
pub fn env_filter(settings: &LoggingSettings) -> Result<EnvFilter, SettingsError> {
	if let Ok(filter) = EnvFilter::try_from_default_env() {
		return Ok(filter);
	}
	EnvFilter::try_new(&settings.level).map_err(|e| SettingsError::LoggingError(e.to_string()))
}

/// Install a global subscriber writing to stderr.
///
/// Fails if a subscriber has already been installed.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), SettingsError> {
	let filter = env_filter(settings)?;
	let builder = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(true);

	let result = match settings.format.as_str() {
		"json" => builder.json().try_init(),
		"text" => builder.try_init(),
		other => return Err(SettingsError::UnsupportedFormat(other.to_string())),
	};
	result.map_err(|e| SettingsError::LoggingError(e.to_string()))?;

	tracing::debug!(level = %settings.level, format = %settings.format, "logging initialized");
	Ok(())
}
