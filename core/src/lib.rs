//! Picklight core - warehouse pick-to-light fleet control
//!
//! Drives a network of addressable-LED controllers that display per-product
//! status on shelf segments. The [`Core`] object wires together:
//!
//! - the pure [`render`] resolver (configuration + stock -> per-LED frames)
//! - the [`service::DeviceHealthMonitor`] reachability cache
//! - the [`service::SyncCoordinator`] hardware push
//! - the [`ops::BatchImportPipeline`] two-phase CSV provisioning
//! - the [`service::LocatePulseController`] highlight loop
//!
//! Persistence, the inventory database and the controllers' wire protocol
//! all live behind traits ([`domain::StockProvider`],
//! [`infra::DeviceTransport`]); embedders supply their own implementations
//! or use the bundled HTTP transport.

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub mod config;
pub mod context;
pub mod domain;
pub mod infra;
pub mod ops;
pub mod render;
pub mod service;

pub use config::CoreConfig;
pub use context::CoreContext;

use domain::StockProvider;
use infra::{DeviceTransport, Event, EventBus, FleetRegistry, HttpDeviceTransport, TransportError};
use ops::BatchImportPipeline;
use service::{DeviceHealthMonitor, LocatePulseController, SyncCoordinator};

/// The assembled pick-to-light core
pub struct Core {
	pub ctx: CoreContext,
	pub health: Arc<DeviceHealthMonitor>,
	pub sync: Arc<SyncCoordinator>,
	pub locate: Arc<LocatePulseController>,
	pub import: Arc<BatchImportPipeline>,
}

impl Core {
	/// Wire up the core against the given external boundaries
	pub fn new(
		config: CoreConfig,
		stock: Arc<dyn StockProvider>,
		transport: Arc<dyn DeviceTransport>,
	) -> Arc<Self> {
		let events = Arc::new(EventBus::new(config.event_capacity));
		let registry = Arc::new(FleetRegistry::new());

		let health = Arc::new(DeviceHealthMonitor::new(
			&config.monitor,
			Arc::clone(&registry),
			Arc::clone(&transport),
			Arc::clone(&events),
		));
		let locate = Arc::new(LocatePulseController::new(
			&config.locate,
			Arc::clone(&registry),
			Arc::clone(&transport),
			Arc::clone(&stock),
			Arc::clone(&events),
		));
		let sync = Arc::new(SyncCoordinator::new(
			Arc::clone(&registry),
			Arc::clone(&transport),
			Arc::clone(&stock),
			Arc::clone(&health),
			locate.flags(),
			Arc::clone(&events),
		));
		let import = Arc::new(BatchImportPipeline::new(
			&config.import,
			Arc::clone(&registry),
			Arc::clone(&stock),
			Arc::clone(&health),
			Arc::clone(&sync),
			Arc::clone(&events),
		));

		let ctx = CoreContext::new(config, events, registry, stock, transport);

		Arc::new(Self {
			ctx,
			health,
			sync,
			locate,
			import,
		})
	}

	/// Wire up the core with the bundled HTTP controller transport
	pub fn with_http_transport(
		config: CoreConfig,
		stock: Arc<dyn StockProvider>,
	) -> Result<Arc<Self>, TransportError> {
		let transport = Arc::new(HttpDeviceTransport::new(config.transport.request_timeout())?);
		Ok(Self::new(config, stock, transport))
	}

	/// Start background work (the health sweep loop)
	pub fn start(&self) {
		Arc::clone(&self.health).start();
	}

	/// Stop background work and every live locate session
	pub async fn shutdown(&self) {
		info!("Picklight core shutting down...");
		self.locate.shutdown().await;
		self.health.shutdown();
		self.ctx.events.emit(Event::CoreShutdown);
		info!("Shutdown complete.");
	}
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` overrides the default filter. Safe to call once per process;
/// later calls are no-ops.
pub fn init_logging() {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new("info,picklight_core=debug"));
	let _ = tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer())
		.try_init();
}
