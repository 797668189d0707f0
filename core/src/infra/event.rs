//! Event bus for decoupled communication
//!
//! Fire-and-forget broadcast: emitters never wait on, or fail because of,
//! subscribers. Lagging receivers drop the oldest events.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 256;

/// Everything the core announces to observers
#[derive(Debug, Clone, Serialize, Deserialize, strum::AsRefStr)]
#[serde(rename_all_fields = "snake_case")]
pub enum Event {
	/// A health sweep finished and the cache was republished
	DeviceHealthRefreshed { online: usize, offline: usize },

	/// A device's segments were pushed to hardware
	DeviceSynced {
		device_id: Uuid,
		synced_segments: usize,
		duration_ms: u64,
	},

	/// A staged import batch was committed
	ImportCommitted { batch_id: Uuid, created: usize },

	/// A locate session began for a product
	LocateStarted { product_id: Uuid },

	/// A locate session ended (explicitly or via teardown)
	LocateStopped { product_id: Uuid },

	/// The core is shutting down
	CoreShutdown,
}

/// Broadcast bus carrying [`Event`]s to any number of subscribers
#[derive(Debug)]
pub struct EventBus {
	sender: broadcast::Sender<Event>,
}

impl EventBus {
	/// Create a new event bus with the specified capacity
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Emit an event to all current subscribers
	///
	/// A send error only means nobody is listening, which is fine.
	pub fn emit(&self, event: Event) {
		let _ = self.sender.send(event);
	}

	/// Subscribe to all events
	pub fn subscribe(&self) -> broadcast::Receiver<Event> {
		self.sender.subscribe()
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(DEFAULT_CAPACITY)
	}
}
