//! Builder for constructing desk engines.
//!
//! Composes a [`DeskEngine`] from configuration and a map of price source
//! factories keyed by the name they are configured under.

use crate::engine::DeskEngine;
use desk_config::Config;
use desk_order::OrderService;
use desk_price::{PriceError, PriceService, PriceSourceInterface};
use desk_types::EventBus;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions needed to build a [`DeskEngine`].
pub struct DeskFactories<PF> {
	pub price_factories: HashMap<String, PF>,
}

/// Builder for constructing a [`DeskEngine`] with pluggable price sources.
pub struct DeskBuilder {
	config: Config,
}

impl DeskBuilder {
	/// Creates a new DeskBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the engine.
	///
	/// Every configured price implementation with a matching factory is
	/// created and its section validated against its schema. Sections with no
	/// matching factory are skipped with a warning. The primary must load.
	pub fn build<PF>(self, factories: DeskFactories<PF>) -> Result<DeskEngine, BuilderError>
	where
		PF: Fn(&toml::Value) -> Result<Box<dyn PriceSourceInterface>, PriceError>,
	{
		let event_bus = EventBus::new(self.config.desk.event_capacity);

		let mut price_impls: HashMap<String, Arc<dyn PriceSourceInterface>> = HashMap::new();
		for (name, config) in &self.config.price.implementations {
			let Some(factory) = factories.price_factories.get(name) else {
				tracing::warn!(
					component = "price",
					implementation = %name,
					"No factory registered, skipping"
				);
				continue;
			};

			let implementation = factory(config).map_err(|e| {
				tracing::error!(
					component = "price",
					implementation = %name,
					error = %e,
					"Failed to create price implementation"
				);
				BuilderError::Config(format!(
					"Failed to create price implementation '{}': {}",
					name, e
				))
			})?;

			implementation
				.config_schema()
				.validate(config)
				.map_err(|e| {
					BuilderError::Config(format!(
						"Invalid configuration for price implementation '{}': {}",
						name, e
					))
				})?;

			let is_primary = &self.config.price.primary == name;
			tracing::info!(component = "price", implementation = %name, primary = %is_primary, "Loaded");
			price_impls.insert(name.clone(), Arc::from(implementation));
		}

		if price_impls.is_empty() {
			return Err(BuilderError::MissingComponent(
				"No valid price implementations available".into(),
			));
		}

		let primary = self.config.price.primary.clone();
		if !price_impls.contains_key(&primary) {
			return Err(BuilderError::Config(format!(
				"Primary price implementation '{}' failed to load",
				primary
			)));
		}

		let prices = PriceService::new(
			price_impls,
			primary,
			self.config.price.cache,
			Some(event_bus.clone()),
		)
		.map_err(|e| BuilderError::Config(e.to_string()))?;

		if self.config.price.cache {
			tracing::info!(component = "price", "Price cache enabled, entries are never evicted");
		}

		let orders = OrderService::new(event_bus.clone());

		Ok(DeskEngine::new(
			self.config,
			Arc::new(orders),
			Arc::new(prices),
			event_bus,
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use desk_price::implementations::mock::create_price_source;
	use desk_types::{ConfigSchema, Schema, ValidationError};
	use mockall::mock;
	use rust_decimal::Decimal;

	mock! {
		pub Source {}

		#[async_trait]
		impl PriceSourceInterface for Source {
			fn config_schema(&self) -> Box<dyn ConfigSchema>;
			async fn lookup(&self, symbol: &str) -> Result<Decimal, PriceError>;
		}
	}

	struct AnySchema;

	impl ConfigSchema for AnySchema {
		fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
			Schema::new(vec![], vec![]).validate(config)
		}
	}

	type Factory = fn(&toml::Value) -> Result<Box<dyn PriceSourceInterface>, PriceError>;

	fn config(toml_str: &str) -> Config {
		toml_str.parse().unwrap()
	}

	fn factories(entries: &[(&str, Factory)]) -> DeskFactories<Factory> {
		DeskFactories {
			price_factories: entries
				.iter()
				.map(|(name, factory)| (name.to_string(), *factory))
				.collect(),
		}
	}

	fn counting_mock(_config: &toml::Value) -> Result<Box<dyn PriceSourceInterface>, PriceError> {
		let mut source = MockSource::new();
		source
			.expect_config_schema()
			.times(1)
			.returning(|| Box::new(AnySchema) as Box<dyn ConfigSchema>);
		source
			.expect_lookup()
			.times(1)
			.returning(|_| Ok(Decimal::from(100)));
		Ok(Box::new(source))
	}

	#[tokio::test]
	async fn test_cached_primary_hits_source_once() {
		let config = config(
			r#"
[desk]
id = "test-desk"

[price]
primary = "scripted"
[price.implementations.scripted]
"#,
		);

		let engine = DeskBuilder::new(config)
			.build(factories(&[("scripted", counting_mock as Factory)]))
			.unwrap();

		assert_eq!(engine.prices().get_price("BTCUSDT").await.unwrap(), Decimal::from(100));
		assert_eq!(engine.prices().get_price("BTCUSDT").await.unwrap(), Decimal::from(100));
		assert_eq!(engine.prices().cache().unwrap().lookups_issued(), 1);
	}

	#[test]
	fn test_missing_primary_factory() {
		let config = config(
			r#"
[desk]
id = "test-desk"

[price]
primary = "coingecko"
[price.implementations.coingecko]
[price.implementations.mock]
"#,
		);

		let result = DeskBuilder::new(config).build(factories(&[("mock", create_price_source as Factory)]));
		assert!(matches!(result, Err(BuilderError::Config(ref msg)) if msg.contains("coingecko")));
	}

	#[test]
	fn test_no_factories_at_all() {
		let config = config(
			r#"
[desk]
id = "test-desk"

[price]
primary = "mock"
[price.implementations.mock]
"#,
		);

		let result = DeskBuilder::new(config).build(factories(&[]));
		assert!(matches!(result, Err(BuilderError::MissingComponent(_))));
	}

	#[test]
	fn test_invalid_implementation_config() {
		let config = config(
			r#"
[desk]
id = "test-desk"

[price]
primary = "mock"
[price.implementations.mock]
latency_ms = "fast"
"#,
		);

		let result = DeskBuilder::new(config).build(factories(&[("mock", create_price_source as Factory)]));
		assert!(matches!(result, Err(BuilderError::Config(ref msg)) if msg.contains("'mock'")));
	}

	#[test]
	fn test_cache_disabled() {
		let config = config(
			r#"
[desk]
id = "test-desk"

[price]
primary = "mock"
cache = false
[price.implementations.mock]
"#,
		);

		let engine = DeskBuilder::new(config)
			.build(factories(&[("mock", create_price_source as Factory)]))
			.unwrap();
		assert!(engine.prices().cache().is_none());
	}
}
