//! Price lookup module for the trading desk.
//!
//! This module defines the interface every price source implements, a mock
//! source driven by configuration, and [`CachingPriceProxy`], a read-through
//! memoizing wrapper that implements the same interface as the source it
//! wraps.

use async_trait::async_trait;
use desk_types::{ConfigSchema, EventBus, ImplementationRegistry};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub mod proxy;

pub use proxy::CachingPriceProxy;

/// Re-export implementations
pub mod implementations {
	pub mod mock;
}

/// Errors that can occur during price lookups.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PriceError {
	/// Error that occurs when a symbol is not known to the price source.
	#[error("Symbol not supported: {0}")]
	SymbolNotSupported(String),
	/// Internal error that occurs during price operations.
	#[error("Internal error: {0}")]
	Internal(String),
	/// Error that occurs when configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for price sources.
///
/// A lookup may suspend (network, simulated latency) and may fail. Callers
/// must not assume a source is cheap; wrap it in a [`CachingPriceProxy`] when
/// repeated lookups of the same symbol are expected.
#[async_trait]
pub trait PriceSourceInterface: Send + Sync {
	/// Returns the configuration schema for this price source.
	///
	/// The schema is used to validate the TOML section of this implementation
	/// before the source is constructed.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Looks up the current price of `symbol`.
	async fn lookup(&self, symbol: &str) -> Result<Decimal, PriceError>;
}

/// Type alias for price source factory functions.
pub type PriceSourceFactory =
	fn(&toml::Value) -> Result<Box<dyn PriceSourceInterface>, PriceError>;

/// Registry trait for price source implementations.
pub trait PriceSourceRegistry: ImplementationRegistry<Factory = PriceSourceFactory> {}

/// Get all registered price source implementations.
///
/// Returns (name, factory) pairs for every available price source.
pub fn get_all_implementations() -> Vec<(&'static str, PriceSourceFactory)> {
	use implementations::mock;

	vec![(mock::Registry::NAME, mock::Registry::factory())]
}

/// Service that manages price sources with multiple implementations.
///
/// Lookups go to the primary implementation. When caching is enabled the
/// primary is wrapped in a [`CachingPriceProxy`] at construction time, so
/// every lookup through the service shares one cache.
pub struct PriceService {
	/// Map of implementation names to their sources.
	implementations: HashMap<String, Arc<dyn PriceSourceInterface>>,
	/// The name of the implementation used for lookups.
	primary_implementation: String,
	/// Cache wrapping the primary, when enabled.
	cache: Option<Arc<CachingPriceProxy>>,
}

impl PriceService {
	/// Creates a new PriceService.
	///
	/// # Arguments
	///
	/// * `implementations` - Map of implementation names to their sources
	/// * `primary_implementation` - The name of the implementation to use for lookups
	/// * `cache` - Whether to memoize lookups made through the primary
	/// * `event_bus` - Bus the cache reports hits and fetches on, if any
	pub fn new(
		mut implementations: HashMap<String, Arc<dyn PriceSourceInterface>>,
		primary_implementation: String,
		cache: bool,
		event_bus: Option<EventBus>,
	) -> Result<Self, PriceError> {
		let primary = implementations
			.get(&primary_implementation)
			.cloned()
			.ok_or_else(|| {
				PriceError::Configuration(format!(
					"Primary implementation '{}' not found in available implementations",
					primary_implementation
				))
			})?;

		let cache = if cache {
			let mut proxy = CachingPriceProxy::new(primary);
			if let Some(bus) = event_bus {
				proxy = proxy.with_event_bus(bus);
			}
			let proxy = Arc::new(proxy);
			implementations.insert(primary_implementation.clone(), proxy.clone());
			Some(proxy)
		} else {
			None
		};

		Ok(Self {
			implementations,
			primary_implementation,
			cache,
		})
	}

	/// Gets the price of `symbol` from the primary implementation.
	pub async fn get_price(&self, symbol: &str) -> Result<Decimal, PriceError> {
		let implementation = self
			.implementations
			.get(&self.primary_implementation)
			.ok_or_else(|| {
				PriceError::Internal(format!(
					"Primary implementation '{}' not available",
					self.primary_implementation
				))
			})?;

		implementation.lookup(symbol).await
	}

	/// Returns the name of the primary implementation.
	pub fn primary_implementation(&self) -> &str {
		&self.primary_implementation
	}

	/// Returns the cache wrapping the primary, if caching is enabled.
	pub fn cache(&self) -> Option<&Arc<CachingPriceProxy>> {
		self.cache.as_ref()
	}
}
