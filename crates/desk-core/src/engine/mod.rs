//! Desk engine.
//!
//! Holds the order and price services built from configuration and runs the
//! demo scenario: create and advance orders, then look up prices both in
//! sequence and concurrently. The report it returns records what happened,
//! including failed lookups, which are reported rather than retried.

use crate::DeskError;
use desk_config::Config;
use desk_order::{OrderService, OrderSnapshot};
use desk_price::PriceService;
use desk_types::{DeskEvent, EventBus, OrderEvent, PriceEvent, Transition};
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Outcome of the orders part of the demo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
	pub order: OrderSnapshot,
	/// Result of each `advance` call, in order.
	pub transitions: Vec<Transition>,
}

/// Outcome of a single price lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupRecord {
	pub symbol: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub price: Option<Decimal>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

/// Cache contents after the demo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheReport {
	pub entries: BTreeMap<String, Decimal>,
	/// Lookups that reached the underlying source.
	pub lookups_issued: usize,
}

/// Everything the demo did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoReport {
	pub desk_id: String,
	pub orders: Vec<OrderRecord>,
	pub lookups: Vec<LookupRecord>,
	pub concurrent_lookups: Vec<LookupRecord>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub cache: Option<CacheReport>,
}

/// Main desk engine.
pub struct DeskEngine {
	config: Config,
	orders: Arc<OrderService>,
	prices: Arc<PriceService>,
	event_bus: EventBus,
}

impl DeskEngine {
	/// Creates an engine from already built services.
	pub fn new(
		config: Config,
		orders: Arc<OrderService>,
		prices: Arc<PriceService>,
		event_bus: EventBus,
	) -> Self {
		Self {
			config,
			orders,
			prices,
			event_bus,
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn orders(&self) -> &Arc<OrderService> {
		&self.orders
	}

	pub fn prices(&self) -> &Arc<PriceService> {
		&self.prices
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	/// Spawns a task that logs every event published on the bus.
	///
	/// The task runs until aborted or until every bus handle is dropped.
	pub fn spawn_event_logger(&self) -> JoinHandle<()> {
		let mut receiver = self.event_bus.subscribe();
		tokio::spawn(async move {
			loop {
				match receiver.recv().await {
					Ok(event) => log_event(&event),
					Err(RecvError::Lagged(skipped)) => {
						tracing::warn!(skipped, "Event logger lagged behind");
					},
					Err(RecvError::Closed) => break,
				}
			}
		})
	}

	/// Runs the demo scenario from the `[demo]` configuration section.
	pub async fn run_demo(&self) -> Result<DemoReport, DeskError> {
		let demo = &self.config.demo;
		tracing::info!(
			desk_id = %self.config.desk.id,
			orders = demo.orders.len(),
			lookups = demo.lookups.len(),
			concurrent_lookups = demo.concurrent_lookups.len(),
			"Running demo"
		);

		let mut orders = Vec::with_capacity(demo.orders.len());
		for symbol in &demo.orders {
			let order = self
				.orders
				.create_order(symbol)
				.await
				.map_err(|e| DeskError::Service(e.to_string()))?;

			let mut transitions = Vec::new();
			for _ in 0..demo.advances_per_order {
				let transition = self
					.orders
					.advance_order(&order.id)
					.await
					.map_err(|e| DeskError::Service(e.to_string()))?;
				transitions.push(transition);
			}

			let order = self
				.orders
				.get_order(&order.id)
				.await
				.map_err(|e| DeskError::Service(e.to_string()))?;
			orders.push(OrderRecord { order, transitions });
		}

		let mut lookups = Vec::with_capacity(demo.lookups.len());
		for symbol in &demo.lookups {
			lookups.push(self.lookup(symbol).await);
		}

		let concurrent_lookups =
			join_all(demo.concurrent_lookups.iter().map(|symbol| self.lookup(symbol))).await;

		let cache = match self.prices.cache() {
			Some(cache) => Some(CacheReport {
				entries: cache.snapshot().await.into_iter().collect(),
				lookups_issued: cache.lookups_issued(),
			}),
			None => None,
		};

		Ok(DemoReport {
			desk_id: self.config.desk.id.clone(),
			orders,
			lookups,
			concurrent_lookups,
			cache,
		})
	}

	async fn lookup(&self, symbol: &str) -> LookupRecord {
		match self.prices.get_price(symbol).await {
			Ok(price) => LookupRecord {
				symbol: symbol.to_string(),
				price: Some(price),
				error: None,
			},
			Err(e) => LookupRecord {
				symbol: symbol.to_string(),
				price: None,
				error: Some(e.to_string()),
			},
		}
	}
}

fn log_event(event: &DeskEvent) {
	match event {
		DeskEvent::Order(OrderEvent::Created { order_id, symbol }) => {
			tracing::debug!(event = "order_created", %order_id, %symbol);
		},
		DeskEvent::Order(OrderEvent::Filled { order_id }) => {
			tracing::debug!(event = "order_filled", %order_id);
		},
		DeskEvent::Order(OrderEvent::NoTransition { order_id, status }) => {
			tracing::debug!(event = "order_no_transition", %order_id, %status);
		},
		DeskEvent::Price(PriceEvent::CacheHit { symbol, price }) => {
			tracing::debug!(event = "price_cache_hit", %symbol, %price);
		},
		DeskEvent::Price(PriceEvent::Fetched { symbol, price }) => {
			tracing::debug!(event = "price_fetched", %symbol, %price);
		},
		DeskEvent::Price(PriceEvent::LookupFailed { symbol, error }) => {
			tracing::debug!(event = "price_lookup_failed", %symbol, %error);
		},
	}
}
