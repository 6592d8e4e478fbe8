//! Order lifecycle states.
//!
//! Each state is a value implementing [`OrderState`]. An [`Order`] holds its
//! current state as a trait object and delegates `advance` to it; the state
//! decides what happens and which state, if any, replaces it.
//!
//! ```text
//! Pending --advance--> Filled --advance--> Filled (no transition)
//! ```
//!
//! [`Order`]: crate::Order

use desk_types::{truncate_id, DeskEvent, EventBus, OrderEvent, OrderStatus, Transition};
use std::fmt;

/// Result of advancing an order in some state.
pub struct Advance {
	/// What happened, as reported to the caller.
	pub transition: Transition,
	/// State that replaces the current one, or `None` to stay.
	pub next: Option<Box<dyn OrderState>>,
}

/// Behavior of an order in one lifecycle state.
pub trait OrderState: Send + Sync + fmt::Debug {
	/// The status this state represents.
	fn status(&self) -> OrderStatus;

	/// Advances the order identified by `order_id`, publishing the outcome
	/// on `events`. Cannot fail.
	fn advance(&self, order_id: &str, events: &EventBus) -> Advance;
}

/// Initial state. Advancing fills the order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pending;

impl OrderState for Pending {
	fn status(&self) -> OrderStatus {
		OrderStatus::Pending
	}

	fn advance(&self, order_id: &str, events: &EventBus) -> Advance {
		tracing::info!(order_id = %truncate_id(order_id), "Order filled");
		events.publish(DeskEvent::Order(OrderEvent::Filled {
			order_id: order_id.to_string(),
		}));

		Advance {
			transition: Transition::Filled,
			next: Some(Box::new(Filled)),
		}
	}
}

/// Terminal state. Advancing reports that no transition is possible.
#[derive(Debug, Clone, Copy, Default)]
pub struct Filled;

impl OrderState for Filled {
	fn status(&self) -> OrderStatus {
		OrderStatus::Filled
	}

	fn advance(&self, order_id: &str, events: &EventBus) -> Advance {
		tracing::info!(
			order_id = %truncate_id(order_id),
			status = %self.status(),
			"Order already filled, no further transition"
		);
		events.publish(DeskEvent::Order(OrderEvent::NoTransition {
			order_id: order_id.to_string(),
			status: self.status(),
		}));

		Advance {
			transition: Transition::NoTransition,
			next: None,
		}
	}
}
