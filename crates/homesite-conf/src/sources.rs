//! Configuration sources for layered settings
//!
//! Sources are merged in priority order: environment variables over config
//! files over defaults.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;

/// Prefix of the environment variables read by default
pub const ENV_PREFIX: &str = "HOMESITE_";

/// Separator for nested keys in environment variable names
pub const ENV_NESTING_SEPARATOR: &str = "__";

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync {
	/// Load configuration from this source
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError>;

	/// Get the priority of this source (higher = more important)
	fn priority(&self) -> u8;

	/// Get a description of this source
	fn description(&self) -> String;
}

/// Error type for configuration sources
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	/// Reading the source failed
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// The source content has an unexpected shape
	#[error("Parse error: {0}")]
	Parse(String),

	/// Invalid TOML
	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	/// JSON conversion failed
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

/// Environment variable configuration source.
///
/// `HOMESITE_SITE_NAME=Docs` sets `site_name`; a double underscore nests,
/// so `HOMESITE_LOGGING__LEVEL=debug` sets `logging.level`.
///
/// Values are strings. Only keys registered as boolean (`debug` by default)
/// are read as booleans, accepting `true/false`, `yes/no`, `on/off` and
/// `1/0`.
pub struct EnvSource {
	prefix: String,
	vars: Option<Vec<(String, String)>>,
	bool_keys: Vec<String>,
}

impl EnvSource {
	/// Source reading variables with the [`ENV_PREFIX`] prefix
	///
	/// # Examples
	///
	/// ```
	/// use homesite_conf::sources::{ConfigSource, EnvSource};
	///
	/// let source = EnvSource::new();
	/// assert_eq!(source.priority(), 100);
	/// ```
	pub fn new() -> Self {
		Self {
			prefix: ENV_PREFIX.to_string(),
			vars: None,
			bool_keys: vec!["debug".to_string()],
		}
	}

	/// Read the dotted key `key` (e.g. `logging.color`) as a boolean
	pub fn with_bool_key(mut self, key: impl Into<String>) -> Self {
		self.bool_keys.push(key.into());
		self
	}

	/// Set the prefix filter for environment variables
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = prefix.into();
		self
	}

	/// Read from the given pairs instead of the process environment
	pub fn with_vars<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		self.vars = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
		self
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		let vars = match &self.vars {
			Some(vars) => vars.clone(),
			None => std::env::vars().collect(),
		};

		let mut config = IndexMap::new();
		for (key, value) in vars {
			let Some(clean_key) = key.strip_prefix(&self.prefix) else {
				continue;
			};
			if clean_key.is_empty() {
				continue;
			}

			let path: Vec<String> = clean_key
				.split(ENV_NESTING_SEPARATOR)
				.map(str::to_lowercase)
				.collect();
			let is_bool = self.bool_keys.contains(&path.join("."));
			let parsed = parse_env_value(&value, is_bool);
			insert_nested(&mut config, &path, parsed);
		}

		Ok(config)
	}

	fn priority(&self) -> u8 {
		100 // Highest priority
	}

	fn description(&self) -> String {
		format!("Environment variables (prefix: {})", self.prefix)
	}
}

fn parse_env_value(value: &str, is_bool: bool) -> Value {
	if is_bool {
		match value.trim().to_lowercase().as_str() {
			"true" | "yes" | "on" | "1" => return Value::Bool(true),
			"false" | "no" | "off" | "0" => return Value::Bool(false),
			_ => {}
		}
	}
	Value::String(value.to_string())
}

fn insert_nested(config: &mut IndexMap<String, Value>, path: &[String], value: Value) {
	let Some((first, rest)) = path.split_first() else {
		return;
	};
	let entry = config.entry(first.clone()).or_insert(Value::Null);
	set_path(entry, rest, value);
}

fn set_path(target: &mut Value, path: &[String], value: Value) {
	let Some((first, rest)) = path.split_first() else {
		*target = value;
		return;
	};
	if !target.is_object() {
		*target = Value::Object(Map::new());
	}
	if let Value::Object(map) = target {
		set_path(map.entry(first.clone()).or_insert(Value::Null), rest, value);
	}
}

/// TOML file configuration source; a missing file contributes nothing
pub struct TomlFileSource {
	path: PathBuf,
}

impl TomlFileSource {
	/// Create a new TOML file configuration source
	///
	/// # Examples
	///
	/// ```
	/// use homesite_conf::sources::TomlFileSource;
	///
	/// let source = TomlFileSource::new("homesite.toml");
	/// ```
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		if !self.path.exists() {
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		let toml_value: toml::Value = toml::from_str(&content)?;
		let json_value = serde_json::to_value(toml_value)?;

		let map = json_value
			.as_object()
			.ok_or_else(|| SourceError::Parse("Expected table at root".to_string()))?;

		Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
	}

	fn priority(&self) -> u8 {
		50 // Medium priority
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// Default values configuration source
pub struct DefaultSource {
	values: IndexMap<String, Value>,
}

impl DefaultSource {
	/// Create an empty default values source
	pub fn new() -> Self {
		Self {
			values: IndexMap::new(),
		}
	}

	/// Add a default value for a configuration key
	///
	/// # Examples
	///
	/// ```
	/// use homesite_conf::sources::DefaultSource;
	/// use serde_json::Value;
	///
	/// let source = DefaultSource::new()
	///     .with_value("debug", Value::Bool(false));
	/// ```
	pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
		self.values.insert(key.into(), value);
		self
	}
}

impl Default for DefaultSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for DefaultSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(self.values.clone())
	}

	fn priority(&self) -> u8 {
		0 // Lowest priority
	}

	fn description(&self) -> String {
		"Default values".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use std::io::Write;

	#[rstest]
	fn test_env_source_strips_prefix_and_nests() {
		let source = EnvSource::new().with_vars([
			("HOMESITE_SITE_NAME", "Docs"),
			("HOMESITE_DEBUG", "1"),
			("HOMESITE_LOGGING__LEVEL", "debug"),
			("OTHER_SITE_NAME", "ignored"),
		]);

		let config = source.load().unwrap();

		assert_eq!(config.get("site_name"), Some(&json!("Docs")));
		assert_eq!(config.get("debug"), Some(&json!(true)));
		assert_eq!(config.get("logging"), Some(&json!({"level": "debug"})));
		assert_eq!(config.len(), 3);
	}

	#[rstest]
	#[case("true", true, json!(true))]
	#[case("0", true, json!(false))]
	#[case("Off", true, json!(false))]
	#[case("sometimes", true, json!("sometimes"))]
	#[case("Yes", false, json!("Yes"))]
	#[case("2024", false, json!("2024"))]
	#[case("en-us", false, json!("en-us"))]
	fn test_env_value_parsing(#[case] raw: &str, #[case] is_bool: bool, #[case] expected: Value) {
		assert_eq!(parse_env_value(raw, is_bool), expected);
	}

	#[rstest]
	fn test_env_source_only_coerces_bool_keys() {
		let source = EnvSource::new().with_bool_key("logging.color").with_vars([
			("HOMESITE_SITE_NAME", "Yes"),
			("HOMESITE_LANGUAGE_CODE", "0"),
			("HOMESITE_DEBUG", "yes"),
			("HOMESITE_LOGGING__COLOR", "off"),
		]);

		let config = source.load().unwrap();

		assert_eq!(config.get("site_name"), Some(&json!("Yes")));
		assert_eq!(config.get("language_code"), Some(&json!("0")));
		assert_eq!(config.get("debug"), Some(&json!(true)));
		assert_eq!(config.get("logging"), Some(&json!({"color": false})));
	}

	#[rstest]
	fn test_toml_source() {
		let temp_dir = tempfile::TempDir::new().unwrap();
		let config_path = temp_dir.path().join("homesite.toml");
		let mut file = fs::File::create(&config_path).unwrap();
		writeln!(
			file,
			r#"
site_name = "Docs"

[logging]
format = "json"
"#
		)
		.unwrap();

		let config = TomlFileSource::new(&config_path).load().unwrap();

		assert_eq!(config.get("site_name"), Some(&json!("Docs")));
		assert_eq!(config.get("logging"), Some(&json!({"format": "json"})));
	}

	#[rstest]
	fn test_missing_toml_file_is_empty() {
		let config = TomlFileSource::new("/nonexistent/homesite.toml").load().unwrap();
		assert!(config.is_empty());
	}

	#[rstest]
	fn test_source_priority() {
		assert_eq!(EnvSource::new().priority(), 100);
		assert_eq!(TomlFileSource::new("a.toml").priority(), 50);
		assert_eq!(DefaultSource::new().priority(), 0);
	}
}
