//! Registry trait for self-registering implementations.
//!
//! Every pluggable implementation (price sources today) declares the name it
//! is configured under and the factory that builds it.

/// Base trait for implementation registries.
///
/// Each implementation module must provide a `Registry` struct that
/// implements this trait, tying its configuration name to a factory function.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	///
	/// This must match the key under `[price.implementations]`, for example
	/// `"mock"` for `price.implementations.mock`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
