//! Segment synchronization to physical controllers
//!
//! Pushes resolved segment frames to the device that owns them. Bulk sync is
//! partial-success: a single segment's failure is logged and skipped, never
//! aborting the batch. Only an unknown or known-offline device fails the
//! operation as a whole.

use super::health::DeviceHealthMonitor;
use super::locate::LocateFlags;
use crate::domain::{Device, Segment, StockError, StockProvider};
use crate::infra::{DeviceTransport, Event, EventBus, FleetRegistry, SegmentFrame, TransportError};
use crate::render::resolve;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum SyncError {
	#[error("device {0} not found")]
	DeviceNotFound(Uuid),

	#[error("segment {0} not found")]
	SegmentNotFound(Uuid),

	#[error("device {0} is offline, skipping sync")]
	DeviceOffline(Uuid),

	#[error(transparent)]
	Transport(#[from] TransportError),

	#[error(transparent)]
	Stock(#[from] StockError),
}

/// Outcome of a bulk device sync
#[derive(Debug, Clone, Copy)]
pub struct SyncReport {
	pub synced_segments: usize,
	pub duration_ms: u64,
}

impl SyncReport {
	/// Throughput, derived from the stored counts rather than kept separately
	pub fn segments_per_sec(&self) -> f64 {
		let secs = self.duration_ms.max(1) as f64 / 1000.0;
		self.synced_segments as f64 / secs
	}
}

/// Pushes segment definitions to their owning controllers
pub struct SyncCoordinator {
	registry: Arc<FleetRegistry>,
	transport: Arc<dyn DeviceTransport>,
	stock: Arc<dyn StockProvider>,
	health: Arc<DeviceHealthMonitor>,
	locate_flags: Arc<LocateFlags>,
	events: Arc<EventBus>,
}

impl SyncCoordinator {
	pub fn new(
		registry: Arc<FleetRegistry>,
		transport: Arc<dyn DeviceTransport>,
		stock: Arc<dyn StockProvider>,
		health: Arc<DeviceHealthMonitor>,
		locate_flags: Arc<LocateFlags>,
		events: Arc<EventBus>,
	) -> Self {
		Self {
			registry,
			transport,
			stock,
			health,
			locate_flags,
			events,
		}
	}

	/// Resolve and push every segment on one device
	///
	/// Skips the whole operation when the monitor knows the device is
	/// offline; otherwise pushes segment by segment, counting successes.
	pub async fn sync_all(&self, device_id: Uuid) -> Result<SyncReport, SyncError> {
		let device = self
			.registry
			.device(device_id)
			.ok_or(SyncError::DeviceNotFound(device_id))?;

		if self.health.is_online(device_id).await == Some(false) {
			return Err(SyncError::DeviceOffline(device_id));
		}

		let segments = self.registry.segments_for_device(device_id);
		let started = Instant::now();
		let mut synced_segments = 0;

		for segment in &segments {
			match self.push_segment(&device, segment).await {
				Ok(()) => synced_segments += 1,
				Err(e) => warn!(
					segment_id = %segment.id,
					device = %device.name,
					error = %e,
					"Segment sync failed, continuing"
				),
			}
		}

		let report = SyncReport {
			synced_segments,
			duration_ms: started.elapsed().as_millis() as u64,
		};

		info!(
			device = %device.name,
			synced = report.synced_segments,
			total = segments.len(),
			duration_ms = report.duration_ms,
			"Device sync complete"
		);
		self.events.emit(Event::DeviceSynced {
			device_id,
			synced_segments: report.synced_segments,
			duration_ms: report.duration_ms,
		});

		Ok(report)
	}

	/// Targeted re-sync after a single segment's configuration changed
	pub async fn sync_one(&self, segment_id: Uuid) -> Result<(), SyncError> {
		let segment = self
			.registry
			.segment(segment_id)
			.ok_or(SyncError::SegmentNotFound(segment_id))?;
		let device = self
			.registry
			.device(segment.device_id)
			.ok_or(SyncError::DeviceNotFound(segment.device_id))?;

		if self.health.is_online(device.id).await == Some(false) {
			return Err(SyncError::DeviceOffline(device.id));
		}

		self.push_segment(&device, &segment).await
	}

	/// Sync several devices, each independently - one device's failure never
	/// blocks another's. Used by import auto-sync.
	pub async fn sync_devices(
		&self,
		device_ids: Vec<Uuid>,
	) -> Vec<(Uuid, Result<SyncReport, SyncError>)> {
		let syncs = device_ids
			.into_iter()
			.map(|device_id| async move { (device_id, self.sync_all(device_id).await) });
		join_all(syncs).await
	}

	async fn push_segment(&self, device: &Device, segment: &Segment) -> Result<(), SyncError> {
		let snapshot = self.stock.stock(segment.product_id).await?;
		let locate_active = self.locate_flags.is_active(segment.product_id);

		let frame = SegmentFrame {
			start_led: segment.start_led,
			led_count: segment.led_count,
			leds: resolve(segment, snapshot, locate_active),
		};

		self.transport
			.send_segment_command(&device.address, &frame)
			.await?;
		Ok(())
	}
}
