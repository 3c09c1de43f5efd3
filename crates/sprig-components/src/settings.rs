//! Runtime settings.
//!
//! Settings load from TOML (a string or a file) and can then be overridden from
//! the environment:
//!
//! ```
//! use sprig_components::RuntimeSettings;
//!
//! let settings = RuntimeSettings::from_toml_str("max_dispatch_depth = 8").unwrap();
//! assert_eq!(settings.max_dispatch_depth, 8);
//! assert!(settings.incremental_updates);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors raised while loading settings.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("Environment error: {key}={value:?} is not a valid {expected}")]
	Env {
		key: String,
		value: String,
		expected: &'static str,
	},
}

/// Behavior switches for an [`App`](crate::App).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
	/// Skip instances whose inputs did not change during an update pass.
	pub incremental_updates: bool,
	/// Maximum nesting of method dispatch through `emit`.
	pub max_dispatch_depth: usize,
	/// Largest integer a loop may range over (`i in n`).
	pub max_loop_range: usize,
	/// Render failed instances as an HTML comment instead of nothing.
	pub render_error_comments: bool,
	/// Record a diagnostic when a parent passes an undeclared prop.
	pub warn_unknown_props: bool,
}

impl Default for RuntimeSettings {
	fn default() -> Self {
		Self {
			incremental_updates: true,
			max_dispatch_depth: 64,
			max_loop_range: 10_000,
			render_error_comments: true,
			warn_unknown_props: true,
		}
	}
}

impl RuntimeSettings {
	pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
		Ok(toml::from_str(source)?)
	}

	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
		let contents = std::fs::read_to_string(path)?;
		Self::from_toml_str(&contents)
	}

	/// Applies `PREFIX_<FIELD>` environment variables, e.g.
	/// `SPRIG_INCREMENTAL_UPDATES=off` with prefix `SPRIG_`.
	pub fn with_env_overrides(self, prefix: &str) -> Result<Self, SettingsError> {
		self.with_overrides(prefix, std::env::vars())
	}

	/// Applies overrides from `vars`, keeping only keys that start with `prefix`.
	pub fn with_overrides<I, K, V>(mut self, prefix: &str, vars: I) -> Result<Self, SettingsError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		for (key, value) in vars {
			let (key, value) = (key.as_ref(), value.as_ref());
			let Some(field) = key.strip_prefix(prefix) else {
				continue;
			};

			match field.to_lowercase().as_str() {
				"incremental_updates" => self.incremental_updates = parse_bool(key, value)?,
				"render_error_comments" => self.render_error_comments = parse_bool(key, value)?,
				"warn_unknown_props" => self.warn_unknown_props = parse_bool(key, value)?,
				"max_dispatch_depth" => {
					self.max_dispatch_depth =
						value.trim().parse().map_err(|_| env_error(key, value, "integer"))?;
				}
				"max_loop_range" => {
					self.max_loop_range =
						value.trim().parse().map_err(|_| env_error(key, value, "integer"))?;
				}
				_ => {}
			}
		}
		Ok(self)
	}
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
	match value.trim().to_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Ok(true),
		"false" | "0" | "no" | "off" => Ok(false),
		_ => Err(env_error(key, value, "boolean")),
	}
}

fn env_error(key: &str, value: &str, expected: &'static str) -> SettingsError {
	SettingsError::Env {
		key: key.to_string(),
		value: value.to_string(),
		expected,
	}
}
