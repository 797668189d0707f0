//! Device health monitoring
//!
//! Keeps a best-effort cache of per-device reachability, refreshed by probing
//! every device in parallel. A slow or unreachable controller never delays
//! the others, and probe failures are data (`online: false`), not faults.
//!
//! The whole sweep is collected before the cache is republished, so readers
//! never observe a partially-updated sweep. The `checking` marker lets
//! observers tell "refreshing" apart from "confirmed offline".

use crate::config::MonitorConfig;
use crate::domain::{Device, DeviceHealth};
use crate::infra::{DeviceTransport, Event, EventBus, FleetRegistry};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};
use tokio::time::timeout;
use tracing::{debug, info};
use uuid::Uuid;

/// Aggregate result of one connectivity sweep
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthSummary {
	pub online_count: usize,
	pub offline_count: usize,
}

/// Owns the cached health state and the background sweep loop
pub struct DeviceHealthMonitor {
	registry: Arc<FleetRegistry>,
	transport: Arc<dyn DeviceTransport>,
	events: Arc<EventBus>,
	probe_interval: Duration,
	probe_timeout: Duration,
	cache: RwLock<HashMap<Uuid, DeviceHealth>>,
	checking: RwLock<HashSet<Uuid>>,
	shutdown: Notify,
}

impl DeviceHealthMonitor {
	pub fn new(
		config: &MonitorConfig,
		registry: Arc<FleetRegistry>,
		transport: Arc<dyn DeviceTransport>,
		events: Arc<EventBus>,
	) -> Self {
		Self {
			registry,
			transport,
			events,
			probe_interval: config.probe_interval(),
			probe_timeout: config.probe_timeout(),
			cache: RwLock::new(HashMap::new()),
			checking: RwLock::new(HashSet::new()),
			shutdown: Notify::new(),
		}
	}

	/// Start the automatic background refresh loop
	pub fn start(self: Arc<Self>) {
		info!(
			interval_secs = self.probe_interval.as_secs(),
			"Device health monitor started"
		);
		tokio::spawn(async move {
			loop {
				tokio::select! {
					_ = self.shutdown.notified() => {
						debug!("Device health monitor stopped");
						break;
					}
					_ = tokio::time::sleep(self.probe_interval) => {
						let summary = self.refresh_all().await;
						debug!(
							online = summary.online_count,
							offline = summary.offline_count,
							"Background health sweep complete"
						);
					}
				}
			}
		});
	}

	/// Cancel the background loop; required for clean test teardown
	pub fn shutdown(&self) {
		self.shutdown.notify_waiters();
	}

	/// Probe every registered device now, in parallel, and republish the cache
	///
	/// This is both the manual "check connectivity" operation and the body of
	/// the background loop.
	pub async fn refresh_all(&self) -> HealthSummary {
		let devices = self.registry.devices();

		{
			let mut checking = self.checking.write().await;
			checking.clear();
			checking.extend(devices.iter().map(|d| d.id));
		}

		// Prior sightings survive an offline probe, so "last seen" stays
		// meaningful across outages.
		let previous = self.cache.read().await.clone();

		let probes = devices.iter().map(|device| {
			let prior_seen = previous.get(&device.id).and_then(|h| h.last_seen);
			async move { (device.id, self.probe_device(device, prior_seen).await) }
		});
		let results = join_all(probes).await;

		let mut summary = HealthSummary::default();
		{
			// One write for the whole sweep: no partially-updated state
			let mut cache = self.cache.write().await;
			for (device_id, health) in results {
				if health.online {
					summary.online_count += 1;
				} else {
					summary.offline_count += 1;
				}
				cache.insert(device_id, health);
			}
		}
		self.checking.write().await.clear();

		self.events.emit(Event::DeviceHealthRefreshed {
			online: summary.online_count,
			offline: summary.offline_count,
		});

		summary
	}

	async fn probe_device(
		&self,
		device: &Device,
		prior_seen: Option<chrono::DateTime<chrono::Utc>>,
	) -> DeviceHealth {
		match timeout(self.probe_timeout, self.transport.probe(&device.address)).await {
			Ok(Ok(report)) if report.online => DeviceHealth::online(report.rssi),
			Ok(Ok(_)) => {
				debug!(device = %device.name, "Controller self-reported offline");
				DeviceHealth::offline(prior_seen)
			}
			Ok(Err(e)) => {
				debug!(device = %device.name, error = %e, "Probe failed");
				DeviceHealth::offline(prior_seen)
			}
			Err(_) => {
				debug!(
					device = %device.name,
					timeout_secs = self.probe_timeout.as_secs(),
					"Probe timed out"
				);
				DeviceHealth::offline(prior_seen)
			}
		}
	}

	/// Cached health for one device; possibly stale between sweeps
	pub async fn health(&self, device_id: Uuid) -> Option<DeviceHealth> {
		self.cache.read().await.get(&device_id).cloned()
	}

	/// Whether a sweep currently has this device in flight
	pub async fn is_checking(&self, device_id: Uuid) -> bool {
		self.checking.read().await.contains(&device_id)
	}

	/// `Some(false)` means confirmed offline; `None` means never probed
	pub async fn is_online(&self, device_id: Uuid) -> Option<bool> {
		self.cache
			.read()
			.await
			.get(&device_id)
			.map(|health| health.online)
	}

	/// Snapshot of the whole cache
	pub async fn all(&self) -> HashMap<Uuid, DeviceHealth> {
		self.cache.read().await.clone()
	}
}
