//! Configuration module for the trading desk.
//!
//! Configuration is read from TOML. Environment variables are substituted
//! before parsing and the result is validated before it is handed out.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

mod loader;

pub use loader::ConfigLoader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the desk.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity and process-level settings.
	pub desk: DeskConfig,
	/// Price sources and caching.
	pub price: PriceConfig,
	/// Scenario run by the `desk` binary.
	#[serde(default)]
	pub demo: DemoConfig,
}

/// Identity and process-level settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeskConfig {
	/// Unique identifier for this desk instance.
	pub id: String,
	/// Events buffered per event bus subscriber before it starts lagging.
	#[serde(default = "default_event_capacity")]
	pub event_capacity: usize,
}

fn default_event_capacity() -> usize {
	1000
}

/// Upper bound on `desk.event_capacity`. The event bus allocates every slot
/// up front.
pub const MAX_EVENT_CAPACITY: usize = 1_000_000;

/// Upper bound on `demo.advances_per_order`.
pub const MAX_ADVANCES_PER_ORDER: u32 = 1_000;

/// Configuration for price sources.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PriceConfig {
	/// Which implementation to use for lookups.
	pub primary: String,
	/// Whether to memoize lookups through the primary. The cache is never
	/// evicted, so leave this off for an unbounded symbol universe.
	#[serde(default = "default_cache")]
	pub cache: bool,
	/// Map of price source implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

fn default_cache() -> bool {
	true
}

/// Scenario run by the `desk` binary.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DemoConfig {
	/// One order is created per symbol listed here.
	#[serde(default)]
	pub orders: Vec<String>,
	/// How many times each order is advanced.
	#[serde(default = "default_advances")]
	pub advances_per_order: u32,
	/// Symbols looked up in sequence through the price service.
	#[serde(default)]
	pub lookups: Vec<String>,
	/// Symbols looked up all at once, concurrently.
	#[serde(default)]
	pub concurrent_lookups: Vec<String>,
}

fn default_advances() -> u32 {
	2
}

static ENV_VAR_PATTERN: LazyLock<Result<Regex, regex::Error>> =
	LazyLock::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}"));

/// Resolves environment variables in a string.
///
/// Replaces `${VAR_NAME}` with the value of the environment variable
/// `VAR_NAME`. Supports default values with `${VAR_NAME:-default_value}`.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = ENV_VAR_PATTERN
		.as_ref()
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}
	result.push_str(&input[last_end..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	///
	/// Each top-level section must be unique across all configuration files.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
		let file_name = path.file_name().ok_or_else(|| {
			ConfigError::Validation(format!("Invalid path: {}", path.display()))
		})?;

		let mut loader = ConfigLoader::new(base_dir);
		loader.load_config(file_name).await
	}

	/// Deserializes and validates TOML whose environment variables have
	/// already been resolved.
	pub(crate) fn parse_resolved(resolved: &str) -> Result<Self, ConfigError> {
		let config: Config = toml::from_str(resolved)?;
		config.validate()?;
		Ok(config)
	}

	/// Validates the configuration.
	///
	/// - Desk ID is not empty
	/// - Event capacity is between 1 and [`MAX_EVENT_CAPACITY`]
	/// - At least one price implementation is configured
	/// - The primary price implementation is one of them
	/// - Demo symbols are not empty
	/// - Advances per order is at most [`MAX_ADVANCES_PER_ORDER`]
	fn validate(&self) -> Result<(), ConfigError> {
		if self.desk.id.trim().is_empty() {
			return Err(ConfigError::Validation("Desk ID cannot be empty".into()));
		}
		if self.desk.event_capacity == 0 {
			return Err(ConfigError::Validation(
				"Event capacity must be greater than zero".into(),
			));
		}
		if self.desk.event_capacity > MAX_EVENT_CAPACITY {
			return Err(ConfigError::Validation(format!(
				"Event capacity {} exceeds maximum {}",
				self.desk.event_capacity, MAX_EVENT_CAPACITY
			)));
		}

		if self.price.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one price implementation must be configured".into(),
			));
		}
		if self.price.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Price primary implementation cannot be empty".into(),
			));
		}
		if !self
			.price
			.implementations
			.contains_key(&self.price.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary price implementation '{}' is not configured in [price.implementations]",
				self.price.primary
			)));
		}

		let demo_symbols = self
			.demo
			.orders
			.iter()
			.chain(&self.demo.lookups)
			.chain(&self.demo.concurrent_lookups);
		for symbol in demo_symbols {
			if symbol.trim().is_empty() {
				return Err(ConfigError::Validation(
					"Demo symbols cannot be empty".into(),
				));
			}
		}
		if self.demo.advances_per_order > MAX_ADVANCES_PER_ORDER {
			return Err(ConfigError::Validation(format!(
				"Advances per order {} exceeds maximum {}",
				self.demo.advances_per_order, MAX_ADVANCES_PER_ORDER
			)));
		}

		Ok(())
	}
}

/// Parses a configuration from a TOML string.
///
/// Environment variables are resolved and the configuration is validated
/// after parsing. `include` directives are not followed; use
/// [`Config::from_file`] for that.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		Config::parse_resolved(&resolved)
	}
}
