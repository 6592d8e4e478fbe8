//! Order lifecycle types.
//!
//! An order starts `Pending` and moves to `Filled` exactly once. These types
//! describe that lifecycle without carrying any behavior; the state objects
//! that implement it live in the order crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of an order in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
	/// Order has been created and is waiting to be filled.
	Pending,
	/// Order has been filled. Terminal.
	Filled,
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OrderStatus::Pending => write!(f, "Pending"),
			OrderStatus::Filled => write!(f, "Filled"),
		}
	}
}

/// Outcome of advancing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
	/// The order moved from `Pending` to `Filled`.
	Filled,
	/// The order was already terminal; nothing changed.
	NoTransition,
}
