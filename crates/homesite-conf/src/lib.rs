//! # Homesite Conf
//!
//! Layered settings for the homesite content service.
//!
//! Values come from three sources, highest priority first:
//!
//! 1. `HOMESITE_*` environment variables (`HOMESITE_LOGGING__LEVEL=debug`)
//! 2. A TOML file, `homesite.toml` unless another path is given
//! 3. Built-in defaults
//!
//! ## Example
//!
//! ```no_run
//! use homesite_conf::{Settings, init_logging};
//!
//! let settings = Settings::load(None)?;
//! init_logging(&settings.logging)?;
//! # Ok::<(), homesite_conf::SettingsError>(())
//! ```

pub mod builder;
pub mod logging;
pub mod settings;
pub mod sources;

pub use builder::{MergedSettings, SettingsBuilder};
pub use logging::init_logging;
pub use settings::{DEFAULT_CONFIG_FILE, LoggingSettings, Settings, SettingsError};
pub use sources::{ConfigSource, DefaultSource, EnvSource, SourceError, TomlFileSource};
