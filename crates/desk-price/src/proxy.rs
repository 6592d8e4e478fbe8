//! Read-through memoizing proxy for price sources.
//!
//! [`CachingPriceProxy`] implements [`PriceSourceInterface`] itself, so it can
//! stand in wherever the wrapped source is expected. The first successful
//! lookup of a symbol is stored and served for the lifetime of the proxy.
//!
//! # Caveats
//!
//! - Entries are never evicted or expired. A proxy fed an unbounded set of
//!   symbols grows without limit.
//! - There is no single-flight deduplication. The cache lock is not held
//!   across the awaited lookup, so concurrent misses on the same symbol each
//!   reach the source. When they complete, the first value stored wins and
//!   every caller gets that value back.
//! - Failed lookups are returned to the caller unchanged and are not cached;
//!   the next call for that symbol reaches the source again.
//! - The cache key is the symbol exactly as given. A source that matches
//!   symbols case-insensitively still sees one lookup per spelling.

use crate::{PriceError, PriceSourceInterface};
use async_trait::async_trait;
use desk_types::{ConfigSchema, DeskEvent, EventBus, PriceEvent};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Memoizing wrapper around a shared price source.
pub struct CachingPriceProxy {
	/// The wrapped source. Shared, never mutated.
	source: Arc<dyn PriceSourceInterface>,
	/// Symbol to first stored price.
	cache: RwLock<HashMap<String, Decimal>>,
	/// Number of lookups forwarded to the source, failed ones included.
	lookups_issued: AtomicUsize,
	event_bus: Option<EventBus>,
}

impl CachingPriceProxy {
	/// Creates a proxy with an empty cache around `source`.
	pub fn new(source: Arc<dyn PriceSourceInterface>) -> Self {
		Self {
			source,
			cache: RwLock::new(HashMap::new()),
			lookups_issued: AtomicUsize::new(0),
			event_bus: None,
		}
	}

	/// Reports cache hits, fetches and failed lookups on `event_bus`.
	pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
		self.event_bus = Some(event_bus);
		self
	}

	/// Returns the price of `symbol`, consulting the source only on a miss.
	///
	/// # Errors
	///
	/// Returns whatever error the source returned. Nothing is cached in that
	/// case.
	pub async fn get_price(&self, symbol: &str) -> Result<Decimal, PriceError> {
		let cached = self.cache.read().await.get(symbol).copied();
		if let Some(price) = cached {
			tracing::debug!(symbol, %price, "Price cache hit");
			self.emit(PriceEvent::CacheHit {
				symbol: symbol.to_string(),
				price,
			});
			return Ok(price);
		}

		tracing::debug!(symbol, "Fetching price");
		self.lookups_issued.fetch_add(1, Ordering::Relaxed);
		let price = match self.source.lookup(symbol).await {
			Ok(price) => price,
			Err(e) => {
				tracing::warn!(symbol, error = %e, "Price lookup failed");
				self.emit(PriceEvent::LookupFailed {
					symbol: symbol.to_string(),
					error: e.to_string(),
				});
				return Err(e);
			},
		};

		let stored = *self
			.cache
			.write()
			.await
			.entry(symbol.to_string())
			.or_insert(price);

		tracing::info!(symbol, price = %stored, "Fetched price");
		self.emit(PriceEvent::Fetched {
			symbol: symbol.to_string(),
			price: stored,
		});
		Ok(stored)
	}

	/// Returns the cached price of `symbol` without consulting the source.
	pub async fn cached(&self, symbol: &str) -> Option<Decimal> {
		self.cache.read().await.get(symbol).copied()
	}

	/// Returns the cached symbols, sorted.
	pub async fn cached_symbols(&self) -> Vec<String> {
		let mut symbols: Vec<String> = self.cache.read().await.keys().cloned().collect();
		symbols.sort();
		symbols
	}

	/// Returns a copy of the cache contents.
	pub async fn snapshot(&self) -> HashMap<String, Decimal> {
		self.cache.read().await.clone()
	}

	pub async fn len(&self) -> usize {
		self.cache.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.cache.read().await.is_empty()
	}

	/// Number of lookups forwarded to the wrapped source so far.
	pub fn lookups_issued(&self) -> usize {
		self.lookups_issued.load(Ordering::Relaxed)
	}

	fn emit(&self, event: PriceEvent) {
		if let Some(bus) = &self.event_bus {
			bus.publish(DeskEvent::Price(event));
		}
	}
}

#[async_trait]
impl PriceSourceInterface for CachingPriceProxy {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		self.source.config_schema()
	}

	async fn lookup(&self, symbol: &str) -> Result<Decimal, PriceError> {
		self.get_price(symbol).await
	}
}
