//! Mock price source for development and testing.
//!
//! Serves prices from a static table in the configuration, optionally with a
//! fallback price for unknown symbols and a simulated lookup latency so the
//! caching behavior is visible in logs.

use crate::{PriceError, PriceSourceFactory, PriceSourceInterface, PriceSourceRegistry};
use async_trait::async_trait;
use desk_types::{
	parse_price, ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Configuration for the mock price source.
#[derive(Debug, Clone, Default)]
pub struct MockPriceSourceConfig {
	/// Prices by upper-cased symbol.
	pub prices: HashMap<String, Decimal>,
	/// Price returned for symbols missing from `prices`. Unknown symbols
	/// fail when unset.
	pub fallback_price: Option<Decimal>,
	/// Simulated delay before every lookup completes.
	pub latency: Duration,
}

impl MockPriceSourceConfig {
	/// Builds the configuration from its TOML section.
	///
	/// ```toml
	/// latency_ms = 5
	/// fallback_price = "1.0"
	/// [prices]
	/// BTCUSDT = "100"
	/// ```
	pub fn from_toml(config: &toml::Value) -> Result<Self, PriceError> {
		MockPriceSourceSchema
			.validate(config)
			.map_err(|e| PriceError::Configuration(format!("Invalid mock config: {}", e)))?;

		let mut prices = HashMap::new();
		if let Some(table) = config.get("prices").and_then(|v| v.as_table()) {
			for (symbol, value) in table {
				let price = parse_price(value).map_err(|e| {
					PriceError::Configuration(format!("Invalid price for {}: {}", symbol, e))
				})?;
				prices.insert(symbol.to_ascii_uppercase(), price);
			}
		}

		let fallback_price = config
			.get("fallback_price")
			.map(parse_price)
			.transpose()
			.map_err(|e| PriceError::Configuration(format!("Invalid fallback_price: {}", e)))?;

		let latency_ms = config
			.get("latency_ms")
			.and_then(|v| v.as_integer())
			.unwrap_or(0);

		Ok(Self {
			prices,
			fallback_price,
			latency: Duration::from_millis(latency_ms as u64),
		})
	}
}

/// Configuration schema for the mock price source.
pub struct MockPriceSourceSchema;

impl ConfigSchema for MockPriceSourceSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			// Required fields
			vec![],
			// Optional fields
			vec![
				Field::new("prices", FieldType::Map(Box::new(FieldType::Price))),
				Field::new("fallback_price", FieldType::Price),
				Field::new(
					"latency_ms",
					FieldType::Integer {
						min: Some(0),
						max: Some(60_000),
					},
				),
			],
		);

		schema.validate(config)
	}
}

/// Price source backed by a static table.
pub struct MockPriceSource {
	config: MockPriceSourceConfig,
	lookups: AtomicU64,
}

impl MockPriceSource {
	/// Creates a new mock price source. Symbols in `config.prices` are
	/// matched case-insensitively.
	pub fn new(mut config: MockPriceSourceConfig) -> Self {
		config.prices = config
			.prices
			.into_iter()
			.map(|(symbol, price)| (symbol.to_ascii_uppercase(), price))
			.collect();

		Self {
			config,
			lookups: AtomicU64::new(0),
		}
	}

	/// Number of lookups served so far, failed ones included.
	pub fn lookup_count(&self) -> u64 {
		self.lookups.load(Ordering::Relaxed)
	}
}

#[async_trait]
impl PriceSourceInterface for MockPriceSource {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MockPriceSourceSchema)
	}

	async fn lookup(&self, symbol: &str) -> Result<Decimal, PriceError> {
		self.lookups.fetch_add(1, Ordering::Relaxed);

		if !self.config.latency.is_zero() {
			tokio::time::sleep(self.config.latency).await;
		}

		if symbol.is_empty() {
			return Err(PriceError::SymbolNotSupported(String::new()));
		}

		self.config
			.prices
			.get(&symbol.to_ascii_uppercase())
			.or(self.config.fallback_price.as_ref())
			.copied()
			.ok_or_else(|| PriceError::SymbolNotSupported(symbol.to_string()))
	}
}

/// Factory function to create a mock price source from configuration.
pub fn create_price_source(
	config: &toml::Value,
) -> Result<Box<dyn PriceSourceInterface>, PriceError> {
	let config = MockPriceSourceConfig::from_toml(config)?;
	tracing::debug!(
		symbols = config.prices.len(),
		latency_ms = config.latency.as_millis() as u64,
		"Creating mock price source"
	);
	Ok(Box::new(MockPriceSource::new(config)))
}

/// Registry for the mock price source implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "mock";
	type Factory = PriceSourceFactory;

	fn factory() -> Self::Factory {
		create_price_source
	}
}

impl PriceSourceRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	fn parse(s: &str) -> toml::Value {
		toml::from_str(s).unwrap()
	}

	#[tokio::test]
	async fn test_configured_prices() {
		let source = create_price_source(&parse(
			r#"
[prices]
BTCUSDT = "100"
ethusdt = 3000.5
"#,
		))
		.unwrap();

		assert_eq!(source.lookup("BTCUSDT").await.unwrap(), Decimal::from(100));
		assert_eq!(
			source.lookup("ETHUSDT").await.unwrap(),
			Decimal::from_str("3000.5").unwrap()
		);
		assert_eq!(source.lookup("btcusdt").await.unwrap(), Decimal::from(100));
	}

	#[tokio::test]
	async fn test_unknown_symbol_without_fallback() {
		let source = MockPriceSource::new(MockPriceSourceConfig::default());

		let err = source.lookup("DOGEUSDT").await.unwrap_err();
		assert_eq!(err, PriceError::SymbolNotSupported("DOGEUSDT".into()));
		assert!(source.lookup("").await.is_err());
		assert_eq!(source.lookup_count(), 2);
	}

	#[tokio::test]
	async fn test_unknown_symbol_fallback() {
		let source = create_price_source(&parse(r#"fallback_price = "1.0""#)).unwrap();
		assert_eq!(
			source.lookup("UNKNOWN").await.unwrap(),
			Decimal::from_str("1.0").unwrap()
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_simulated_latency() {
		let source = create_price_source(&parse(
			r#"
latency_ms = 250
[prices]
BTCUSDT = 100
"#,
		))
		.unwrap();

		let start = tokio::time::Instant::now();
		assert_eq!(source.lookup("BTCUSDT").await.unwrap(), Decimal::from(100));
		assert!(start.elapsed() >= Duration::from_millis(250));
	}

	#[test]
	fn test_invalid_config_rejected() {
		let result = create_price_source(&parse(
			r#"
[prices]
BTCUSDT = "-3"
"#,
		));
		assert!(matches!(result, Err(PriceError::Configuration(_))));

		let result = create_price_source(&parse("latency_ms = \"slow\""));
		assert!(matches!(result, Err(PriceError::Configuration(_))));
	}

	#[test]
	fn test_registry_name() {
		assert_eq!(Registry::NAME, "mock");
		let names: Vec<_> = crate::get_all_implementations()
			.into_iter()
			.map(|(name, _)| name)
			.collect();
		assert_eq!(names, vec!["mock"]);
	}
}
