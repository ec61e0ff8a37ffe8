//! Typed settings
//!
//! [`Settings::load`] layers the built-in defaults, an optional TOML file and
//! `HOMESITE_*` environment variables, then validates the result.

use crate::builder::SettingsBuilder;
use crate::sources::{DefaultSource, EnvSource, TomlFileSource};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default settings file name
pub const DEFAULT_CONFIG_FILE: &str = "homesite.toml";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["text", "json"];

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
	/// Minimum level, or any `tracing_subscriber::EnvFilter` directive
	pub level: String,
	/// `text` or `json`
	pub format: String,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: "text".to_string(),
		}
	}
}

/// Settings of the content service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Name shown in the admin
	pub site_name: String,

	/// Debug mode
	pub debug: bool,

	/// JSON snapshot holding pages and images
	pub data_file: PathBuf,

	/// Directory image files are exported to
	pub media_root: PathBuf,

	/// URL prefix of image files
	pub media_url: String,

	/// Language of the content
	pub language_code: String,

	/// Logging configuration
	pub logging: LoggingSettings,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			site_name: "Homesite".to_string(),
			debug: false,
			data_file: PathBuf::from("data/site.json"),
			media_root: PathBuf::from("media"),
			media_url: "/media/".to_string(),
			language_code: "en-us".to_string(),
			logging: LoggingSettings::default(),
		}
	}
}

impl Settings {
	/// Defaults as a configuration source
	pub fn defaults_source() -> Result<DefaultSource, SettingsError> {
		let value = serde_json::to_value(Self::default())
			.map_err(|e| SettingsError::SerializationError(e.to_string()))?;
		let serde_json::Value::Object(map) = value else {
			return Err(SettingsError::SerializationError(
				"settings did not serialize to a table".to_string(),
			));
		};
		Ok(map
			.into_iter()
			.fold(DefaultSource::new(), |source, (k, v)| source.with_value(k, v)))
	}

	/// Load settings from defaults, `config_file` (if it exists) and the
	/// environment, in increasing priority
	pub fn load(config_file: Option<&Path>) -> Result<Self, SettingsError> {
		let builder = SettingsBuilder::new()
			.add_source(Self::defaults_source()?)
			.add_source(EnvSource::new());
		let builder = match config_file {
			Some(path) => builder.add_source(TomlFileSource::new(path)),
			None => builder.add_source(TomlFileSource::new(DEFAULT_CONFIG_FILE)),
		};

		let settings: Self = builder.build()?.into_typed()?;
		settings.validate()?;
		Ok(settings)
	}

	/// Check values the type system cannot
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.site_name.trim().is_empty() {
			return Err(SettingsError::ValidationError(
				"site_name must not be empty".to_string(),
			));
		}
		if self.language_code.trim().is_empty() {
			return Err(SettingsError::ValidationError(
				"language_code must not be empty".to_string(),
			));
		}
		if !self.media_url.ends_with('/') {
			return Err(SettingsError::ValidationError(format!(
				"media_url must end with '/': {}",
				self.media_url
			)));
		}
		if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
			return Err(SettingsError::UnsupportedFormat(self.logging.format.clone()));
		}
		if !self.logging.level.contains('=')
			&& !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str())
		{
			return Err(SettingsError::ValidationError(format!(
				"unknown log level: {}",
				self.logging.level
			)));
		}
		Ok(())
	}
}

/// Settings error
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	/// A source could not be read
	#[error("File error: {0}")]
	FileError(String),

	/// Merged values do not fit the settings structure
	#[error("Parse error: {0}")]
	ParseError(String),

	/// A value is out of range
	#[error("Validation error: {0}")]
	ValidationError(String),

	/// Unknown log format
	#[error("Unsupported format: {0}")]
	UnsupportedFormat(String),

	/// Settings could not be serialized
	#[error("Serialization error: {0}")]
	SerializationError(String),

	/// The global subscriber could not be installed
	#[error("Logging error: {0}")]
	LoggingError(String),
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_default_settings() {
		let settings = Settings::default();

		assert!(!settings.debug);
		assert_eq!(settings.data_file, PathBuf::from("data/site.json"));
		assert_eq!(settings.logging.format, "text");
		assert!(settings.validate().is_ok());
	}

	#[rstest]
	#[case("verbose", "text")]
	#[case("info", "yaml")]
	fn test_invalid_logging_rejected(#[case] level: &str, #[case] format: &str) {
		let settings = Settings {
			logging: LoggingSettings {
				level: level.to_string(),
				format: format.to_string(),
			},
			..Settings::default()
		};

		assert!(settings.validate().is_err());
	}

	#[rstest]
	fn test_filter_directives_are_accepted() {
		let settings = Settings {
			logging: LoggingSettings {
				level: "homesite_cms=debug,info".to_string(),
				format: "json".to_string(),
			},
			..Settings::default()
		};

		assert!(settings.validate().is_ok());
	}
}
