//! Event types for observing the desk components.
//!
//! Order transitions and price lookups are reported as events on the event
//! bus. Consumers subscribe to the bus and filter on the variants they care
//! about; nothing in the desk depends on an event being received.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::OrderStatus;

/// Main event type encompassing all desk events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeskEvent {
	/// Events from the order lifecycle.
	Order(OrderEvent),
	/// Events from price lookups.
	Price(PriceEvent),
}

/// Events related to the order lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderEvent {
	/// A new order has been created in the `Pending` state.
	Created { order_id: String, symbol: String },
	/// The order moved from `Pending` to `Filled`.
	Filled { order_id: String },
	/// The order was advanced while already terminal.
	NoTransition {
		order_id: String,
		status: OrderStatus,
	},
}

/// Events related to cached price lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PriceEvent {
	/// The price was served from the cache without touching the source.
	CacheHit { symbol: String, price: Decimal },
	/// The price was fetched from the underlying source and cached.
	Fetched { symbol: String, price: Decimal },
	/// The underlying source failed; nothing was cached.
	LookupFailed { symbol: String, error: String },
}
