//! Merging configuration sources
//!
//! Sources are loaded lowest priority first; a later (higher-priority) value
//! replaces an earlier one, except that tables are merged key by key.

use crate::settings::SettingsError;
use crate::sources::ConfigSource;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Builder collecting configuration sources
#[derive(Default)]
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	/// Create a builder with no sources
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a source
	pub fn add_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Load and merge every source
	pub fn build(mut self) -> Result<MergedSettings, SettingsError> {
		// Stable: sources with equal priority keep insertion order.
		self.sources.sort_by_key(|s| s.priority());

		let mut values = IndexMap::new();
		for source in &self.sources {
			let loaded = source.load().map_err(|e| {
				SettingsError::FileError(format!("{}: {e}", source.description()))
			})?;
			tracing::debug!(source = %source.description(), keys = loaded.len(), "configuration source loaded");
			for (key, value) in loaded {
				deep_merge(values.entry(key).or_insert(Value::Null), value);
			}
		}
		Ok(MergedSettings { values })
	}
}

fn deep_merge(target: &mut Value, incoming: Value) {
	match (target, incoming) {
		(Value::Object(existing), Value::Object(incoming)) => {
			for (key, value) in incoming {
				deep_merge(existing.entry(key).or_insert(Value::Null), value);
			}
		}
		(target, incoming) => *target = incoming,
	}
}

/// The merged key/value view of all sources
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedSettings {
	values: IndexMap<String, Value>,
}

impl MergedSettings {
	/// Value of a top-level key
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.values.get(key)
	}

	/// Number of top-level keys
	pub fn len(&self) -> usize {
		self.values.len()
	}

	/// True when no source contributed a value
	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Deserialize into a typed settings struct
	pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, SettingsError> {
		let object: serde_json::Map<String, Value> = self.values.into_iter().collect();
		serde_json::from_value(Value::Object(object))
			.map_err(|e| SettingsError::ParseError(e.to_string()))
	}
}
