//! The order entity.

use crate::state::{OrderState, Pending};
use desk_types::{current_timestamp, EventBus, OrderStatus, Transition};
use serde::{Deserialize, Serialize};

/// An order whose lifecycle behavior is delegated to its current state.
///
/// The order exclusively owns its state; there is always exactly one.
#[derive(Debug)]
pub struct Order {
	id: String,
	symbol: String,
	created_at: u64,
	updated_at: u64,
	state: Box<dyn OrderState>,
}

/// Serializable point-in-time view of an [`Order`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
	/// Unique identifier for this order.
	pub id: String,
	/// Traded symbol, e.g. "BTCUSDT".
	pub symbol: String,
	/// Current status.
	pub status: OrderStatus,
	/// Timestamp when this order was created.
	pub created_at: u64,
	/// Timestamp when this order last changed status.
	pub updated_at: u64,
}

impl Order {
	/// Creates a new order in the `Pending` state with a random id.
	pub fn new(symbol: impl Into<String>) -> Self {
		Self::with_id(uuid::Uuid::new_v4().to_string(), symbol)
	}

	/// Creates a new order in the `Pending` state with the given id.
	pub fn with_id(id: impl Into<String>, symbol: impl Into<String>) -> Self {
		let now = current_timestamp();
		Self {
			id: id.into(),
			symbol: symbol.into(),
			created_at: now,
			updated_at: now,
			state: Box::new(Pending),
		}
	}

	/// Advances the order by one step.
	///
	/// A pending order becomes filled. A filled order stays filled and the
	/// call reports [`Transition::NoTransition`]. Either way the outcome is
	/// published on `events`.
	pub fn advance(&mut self, events: &EventBus) -> Transition {
		let advance = self.state.advance(&self.id, events);
		if let Some(next) = advance.next {
			self.state = next;
			self.updated_at = current_timestamp();
		}
		advance.transition
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn symbol(&self) -> &str {
		&self.symbol
	}

	/// Current lifecycle status.
	pub fn status(&self) -> OrderStatus {
		self.state.status()
	}

	pub fn snapshot(&self) -> OrderSnapshot {
		OrderSnapshot {
			id: self.id.clone(),
			symbol: self.symbol.clone(),
			status: self.status(),
			created_at: self.created_at,
			updated_at: self.updated_at,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use desk_types::{DeskEvent, OrderEvent};

	#[test]
	fn test_new_order_is_pending() {
		let order = Order::new("BTCUSDT");
		assert_eq!(order.status(), OrderStatus::Pending);
		assert_eq!(order.symbol(), "BTCUSDT");
		assert_eq!(order.id().len(), 36);
	}

	#[test]
	fn test_advance_fills_then_reports_no_transition() {
		let bus = EventBus::new(8);
		let mut events = bus.subscribe();
		let mut order = Order::with_id("order-1", "BTCUSDT");

		assert_eq!(order.advance(&bus), Transition::Filled);
		assert_eq!(order.status(), OrderStatus::Filled);
		assert_eq!(
			events.try_recv().unwrap(),
			DeskEvent::Order(OrderEvent::Filled {
				order_id: "order-1".into()
			})
		);

		assert_eq!(order.advance(&bus), Transition::NoTransition);
		assert_eq!(order.status(), OrderStatus::Filled);
		assert_eq!(
			events.try_recv().unwrap(),
			DeskEvent::Order(OrderEvent::NoTransition {
				order_id: "order-1".into(),
				status: OrderStatus::Filled,
			})
		);
	}

	#[test]
	fn test_filled_is_stable_under_repeated_advance() {
		let bus = EventBus::default();
		let mut order = Order::new("ETHUSDT");

		order.advance(&bus);
		for _ in 0..20 {
			assert_eq!(order.advance(&bus), Transition::NoTransition);
			assert_eq!(order.status(), OrderStatus::Filled);
		}
	}

	#[test]
	fn test_snapshot_serializes() {
		let bus = EventBus::default();
		let mut order = Order::with_id("order-7", "SOLUSDT");
		order.advance(&bus);

		let json = serde_json::to_value(order.snapshot()).unwrap();
		assert_eq!(json["id"], "order-7");
		assert_eq!(json["symbol"], "SOLUSDT");
		assert_eq!(json["status"], "Filled");
	}
}
