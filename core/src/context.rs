//! Shared context providing access to core components

use crate::config::CoreConfig;
use crate::domain::StockProvider;
use crate::infra::{DeviceTransport, EventBus, FleetRegistry};
use std::sync::Arc;

/// Shared context providing access to core components
#[derive(Clone)]
pub struct CoreContext {
	pub config: CoreConfig,
	pub events: Arc<EventBus>,
	pub registry: Arc<FleetRegistry>,
	pub stock: Arc<dyn StockProvider>,
	pub transport: Arc<dyn DeviceTransport>,
}

impl CoreContext {
	/// Create a new context with the given components
	pub fn new(
		config: CoreConfig,
		events: Arc<EventBus>,
		registry: Arc<FleetRegistry>,
		stock: Arc<dyn StockProvider>,
		transport: Arc<dyn DeviceTransport>,
	) -> Self {
		Self {
			config,
			events,
			registry,
			stock,
			transport,
		}
	}
}
