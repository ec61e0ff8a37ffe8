//! Tests for layered settings loading

use homesite_conf::{Settings, SettingsError};
use rstest::{fixture, rstest};
use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const OVERRIDES: &[&str] = &[
	"HOMESITE_SITE_NAME",
	"HOMESITE_DEBUG",
	"HOMESITE_LOGGING__LEVEL",
	"HOMESITE_LOGGING__FORMAT",
	"HOMESITE_MEDIA_URL",
	"HOMESITE_LANGUAGE_CODE",
];

fn clear_overrides() {
	for key in OVERRIDES {
		// SAFETY: every test in this file runs under #[serial]
		unsafe { env::remove_var(key) };
	}
}

#[fixture]
fn config_dir() -> TempDir {
	clear_overrides();
	TempDir::new().unwrap()
}

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
	let path = dir.path().join("homesite.toml");
	fs::write(&path, content).unwrap();
	path
}

#[rstest]
#[serial]
fn test_defaults_without_file(config_dir: TempDir) {
	// Act
	let settings = Settings::load(Some(&config_dir.path().join("missing.toml"))).unwrap();

	// Assert
	assert_eq!(settings, Settings::default());
}

#[rstest]
#[serial]
fn test_file_overrides_defaults(config_dir: TempDir) {
	// Arrange
	let path = write_config(
		&config_dir,
		r#"
site_name = "Docs"
data_file = "var/site.json"

[logging]
format = "json"
"#,
	);

	// Act
	let settings = Settings::load(Some(&path)).unwrap();

	// Assert
	assert_eq!(settings.site_name, "Docs");
	assert_eq!(settings.data_file, PathBuf::from("var/site.json"));
	assert_eq!(settings.logging.format, "json");
	assert_eq!(settings.logging.level, "info");
	assert_eq!(settings.media_url, "/media/");
}

#[rstest]
#[serial]
fn test_env_overrides_file(config_dir: TempDir) {
	// Arrange
	let path = write_config(
		&config_dir,
		r#"
site_name = "Docs"
debug = false

[logging]
level = "warn"
"#,
	);
	// SAFETY: every test in this file runs under #[serial]
	unsafe {
		env::set_var("HOMESITE_SITE_NAME", "Staging");
		env::set_var("HOMESITE_DEBUG", "1");
		env::set_var("HOMESITE_LOGGING__LEVEL", "debug");
	}

	// Act
	let result = Settings::load(Some(&path));
	clear_overrides();

	// Assert
	let settings = result.unwrap();
	assert_eq!(settings.site_name, "Staging");
	assert!(settings.debug);
	assert_eq!(settings.logging.level, "debug");
	assert_eq!(settings.logging.format, "text");
}

#[rstest]
#[serial]
fn test_env_strings_are_not_coerced(config_dir: TempDir) {
	// Arrange
	// SAFETY: every test in this file runs under #[serial]
	unsafe {
		env::set_var("HOMESITE_SITE_NAME", "2024");
		env::set_var("HOMESITE_LANGUAGE_CODE", "no");
		env::set_var("HOMESITE_DEBUG", "off");
	}

	// Act
	let result = Settings::load(Some(&config_dir.path().join("missing.toml")));
	clear_overrides();

	// Assert
	let settings = result.unwrap();
	assert_eq!(settings.site_name, "2024");
	assert_eq!(settings.language_code, "no");
	assert!(!settings.debug);
}

#[rstest]
#[serial]
fn test_invalid_file_value_is_rejected(config_dir: TempDir) {
	// Arrange
	let path = write_config(&config_dir, "debug = \"sometimes\"\n");

	// Act
	let result = Settings::load(Some(&path));

	// Assert
	assert!(matches!(result, Err(SettingsError::ParseError(_))));
}

#[rstest]
#[serial]
fn test_invalid_media_url_is_rejected(config_dir: TempDir) {
	// Arrange
	// SAFETY: every test in this file runs under #[serial]
	unsafe { env::set_var("HOMESITE_MEDIA_URL", "/media") };

	// Act
	let result = Settings::load(Some(&config_dir.path().join("missing.toml")));
	clear_overrides();

	// Assert
	assert!(matches!(result, Err(SettingsError::ValidationError(_))));
}

#[rstest]
#[serial]
fn test_malformed_toml_is_a_file_error(config_dir: TempDir) {
	// Arrange
	let path = write_config(&config_dir, "site_name = \n");

	// Act
	let result = Settings::load(Some(&path));

	// Assert
	assert!(matches!(result, Err(SettingsError::FileError(_))));
}
