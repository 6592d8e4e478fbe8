//! Core engine for the trading desk.
//!
//! Wires the order and price services together from configuration and
//! factory functions, and runs the demo scenario described by the `[demo]`
//! section of the configuration.

use thiserror::Error;

pub mod builder;
pub mod engine;

pub use builder::{BuilderError, DeskBuilder, DeskFactories};
pub use engine::{CacheReport, DemoReport, DeskEngine, LookupRecord, OrderRecord};

/// Errors that can occur while running the desk.
#[derive(Debug, Error)]
pub enum DeskError {
	/// Error from one of the desk services.
	#[error("Service error: {0}")]
	Service(String),
}
