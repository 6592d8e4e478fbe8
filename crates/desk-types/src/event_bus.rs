//! Event bus for broadcasting desk events.
//!
//! Wraps a tokio broadcast channel. Publishing never blocks and succeeds even
//! when nobody is subscribed, so emitters do not need to care whether an
//! observer is attached.

use crate::DeskEvent;
use tokio::sync::broadcast;

/// Default number of events buffered per subscriber before lagging.
const DEFAULT_CAPACITY: usize = 1000;

/// Broadcast bus for [`DeskEvent`]s.
///
/// Cloning the bus yields another handle onto the same channel.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<DeskEvent>,
}

impl EventBus {
	/// Creates a new event bus buffering up to `capacity` events per subscriber.
	///
	/// All `capacity` slots are allocated up front.
	///
	/// # Panics
	///
	/// Panics if `capacity` is zero or greater than `usize::MAX / 2`, and
	/// aborts if the slots cannot be allocated. Callers taking the capacity
	/// from configuration must bound it first.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Subscribes to all events published after this call.
	pub fn subscribe(&self) -> broadcast::Receiver<DeskEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event to all current subscribers.
	///
	/// Returns the number of subscribers that received the event.
	pub fn publish(&self, event: DeskEvent) -> usize {
		match self.sender.send(event) {
			Ok(receivers) => receivers,
			Err(_) => {
				tracing::trace!("No subscribers for desk event");
				0
			},
		}
	}

	/// Returns the number of active subscribers.
	pub fn subscriber_count(&self) -> usize {
		self.sender.receiver_count()
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(DEFAULT_CAPACITY)
	}
}
