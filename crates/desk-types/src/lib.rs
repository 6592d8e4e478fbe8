//! Common types module for the trading desk.
//!
//! This module defines the data types shared by the order lifecycle and the
//! price lookup components: order statuses, events, the event bus, the
//! configuration validation framework and implementation registries.

/// Event bus for broadcasting desk events to observers.
pub mod event_bus;
/// Event types emitted by the order and price components.
pub mod events;
/// Order lifecycle status types.
pub mod order;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Utility functions for timestamps and display formatting.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export all types for convenient access
pub use event_bus::EventBus;
pub use events::*;
pub use order::*;
pub use registry::ImplementationRegistry;
pub use utils::{current_timestamp, truncate_id};
pub use validation::*;
