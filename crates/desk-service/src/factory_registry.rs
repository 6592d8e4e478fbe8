//! Factory registry for desk implementations.
//!
//! The registry is an ordinary value: `main` constructs it once and hands its
//! factories to the builder. Nothing is registered globally.

use desk_core::DeskFactories;
use desk_price::{PriceError, PriceSourceInterface};
use std::collections::HashMap;

pub type PriceFactory = fn(&toml::Value) -> Result<Box<dyn PriceSourceInterface>, PriceError>;

/// Registry of all implementation factories, keyed by configuration name.
#[derive(Default)]
pub struct FactoryRegistry {
	pub price: HashMap<String, PriceFactory>,
}

impl FactoryRegistry {
	/// Create a new empty registry
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a registry holding every implementation shipped with the desk.
	pub fn with_all_implementations() -> Self {
		let mut registry = Self::new();

		for (name, factory) in desk_price::get_all_implementations() {
			tracing::debug!("Registering price implementation: {}", name);
			registry.register_price(name, factory);
		}

		registry
	}

	/// Register a price source implementation
	pub fn register_price(&mut self, name: impl Into<String>, factory: PriceFactory) {
		self.price.insert(name.into(), factory);
	}

	/// Factories in the shape the builder expects.
	pub fn desk_factories(&self) -> DeskFactories<PriceFactory> {
		DeskFactories {
			price_factories: self.price.clone(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn failing_factory(_config: &toml::Value) -> Result<Box<dyn PriceSourceInterface>, PriceError> {
		Err(PriceError::Configuration("always fails".into()))
	}

	#[test]
	fn test_default_implementations_registered() {
		let registry = FactoryRegistry::with_all_implementations();
		assert!(registry.price.contains_key("mock"));
		assert!(registry.desk_factories().price_factories.contains_key("mock"));
	}

	#[test]
	fn test_register_overrides_by_name() {
		let mut registry = FactoryRegistry::with_all_implementations();
		registry.register_price("mock", failing_factory);

		let factory = registry.price["mock"];
		let empty = toml::Value::Table(Default::default());
		assert!(factory(&empty).is_err());
	}

	#[test]
	fn test_registries_are_independent() {
		let mut first = FactoryRegistry::new();
		let second = FactoryRegistry::with_all_implementations();
		first.register_price("failing", failing_factory);

		assert!(!first.price.contains_key("mock"));
		assert!(!second.price.contains_key("failing"));
	}
}
