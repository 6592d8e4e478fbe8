//! Order lifecycle module for the trading desk.
//!
//! Orders are created `Pending` and filled exactly once. The behavior of each
//! lifecycle state lives in its own [`OrderState`] implementation, and the
//! order forwards every `advance` to whichever state it currently holds.
//! [`OrderService`] keeps the desk's orders and advances them by id.

use desk_types::{truncate_id, DeskEvent, EventBus, OrderEvent, Transition};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

pub mod order;
pub mod state;

pub use order::{Order, OrderSnapshot};
pub use state::{Advance, Filled, OrderState, Pending};

/// Errors that can occur during order management.
#[derive(Debug, Error, PartialEq)]
pub enum OrderError {
	/// Error that occurs when an order id is unknown.
	#[error("Order not found: {0}")]
	OrderNotFound(String),
	/// Error that occurs when order parameters are invalid.
	#[error("Invalid order: {0}")]
	InvalidOrder(String),
}

/// In-memory registry of the desk's orders.
pub struct OrderService {
	orders: RwLock<HashMap<String, Order>>,
	event_bus: EventBus,
}

impl OrderService {
	/// Creates an empty service publishing order events on `event_bus`.
	pub fn new(event_bus: EventBus) -> Self {
		Self {
			orders: RwLock::new(HashMap::new()),
			event_bus,
		}
	}

	/// Creates a new pending order for `symbol`.
	pub async fn create_order(&self, symbol: &str) -> Result<OrderSnapshot, OrderError> {
		if symbol.trim().is_empty() {
			return Err(OrderError::InvalidOrder("symbol cannot be empty".into()));
		}

		let order = Order::new(symbol);
		let snapshot = order.snapshot();
		self.orders
			.write()
			.await
			.insert(snapshot.id.clone(), order);

		tracing::info!(order_id = %truncate_id(&snapshot.id), symbol, "Order created");
		self.event_bus.publish(DeskEvent::Order(OrderEvent::Created {
			order_id: snapshot.id.clone(),
			symbol: snapshot.symbol.clone(),
		}));
		Ok(snapshot)
	}

	/// Advances the order with the given id by one step.
	pub async fn advance_order(&self, order_id: &str) -> Result<Transition, OrderError> {
		let mut orders = self.orders.write().await;
		let order = orders
			.get_mut(order_id)
			.ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;

		Ok(order.advance(&self.event_bus))
	}

	/// Gets a snapshot of the order with the given id.
	pub async fn get_order(&self, order_id: &str) -> Result<OrderSnapshot, OrderError> {
		self.orders
			.read()
			.await
			.get(order_id)
			.map(Order::snapshot)
			.ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))
	}

	/// Lists snapshots of all orders, oldest first.
	pub async fn list_orders(&self) -> Vec<OrderSnapshot> {
		let mut snapshots: Vec<OrderSnapshot> = self
			.orders
			.read()
			.await
			.values()
			.map(Order::snapshot)
			.collect();
		snapshots.sort_by(|a, b| {
			a.created_at
				.cmp(&b.created_at)
				.then_with(|| a.id.cmp(&b.id))
		});
		snapshots
	}
}
