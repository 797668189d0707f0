//! Locate pulse loop
//!
//! Controllers run the locate highlight as a finite animation, so an active
//! locate session must re-trigger it on the cadence the controller reports.
//! Each product gets at most one session (Idle/Active); the repeating task is
//! the only long-lived background work per session and must never outlive it.

use crate::config::LocateConfig;
use crate::domain::{StockProvider, StockSnapshot};
use crate::infra::{DeviceTransport, Event, EventBus, FleetRegistry, SegmentFrame};
use crate::render::resolve;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum LocateError {
	#[error("product {0} has no segments to locate")]
	NoSegments(Uuid),
}

/// Which products currently have an active locate session
///
/// Shared with every resolver call site (sync, preview) so frames pushed
/// during a session keep the override lit.
#[derive(Debug, Default)]
pub struct LocateFlags {
	active: RwLock<HashSet<Uuid>>,
}

impl LocateFlags {
	pub fn is_active(&self, product_id: Uuid) -> bool {
		self.active
			.read()
			.map(|set| set.contains(&product_id))
			.unwrap_or(false)
	}

	fn set(&self, product_id: Uuid) {
		if let Ok(mut set) = self.active.write() {
			set.insert(product_id);
		}
	}

	fn clear(&self, product_id: Uuid) {
		if let Ok(mut set) = self.active.write() {
			set.remove(&product_id);
		}
	}
}

struct LocateSession {
	duration_ms: u64,
	cancel: Arc<Notify>,
	task: JoinHandle<()>,
}

impl Drop for LocateSession {
	fn drop(&mut self) {
		// A leaked repeat task would keep re-triggering hardware forever
		self.task.abort();
	}
}

/// Per-product locate session registry and pulse loop
pub struct LocatePulseController {
	registry: Arc<FleetRegistry>,
	transport: Arc<dyn DeviceTransport>,
	stock: Arc<dyn StockProvider>,
	events: Arc<EventBus>,
	flags: Arc<LocateFlags>,
	default_pulse_ms: u64,
	sessions: Mutex<HashMap<Uuid, LocateSession>>,
}

impl LocatePulseController {
	pub fn new(
		config: &LocateConfig,
		registry: Arc<FleetRegistry>,
		transport: Arc<dyn DeviceTransport>,
		stock: Arc<dyn StockProvider>,
		events: Arc<EventBus>,
	) -> Self {
		Self {
			registry,
			transport,
			stock,
			events,
			flags: Arc::new(LocateFlags::default()),
			default_pulse_ms: config.default_pulse_ms,
			sessions: Mutex::new(HashMap::new()),
		}
	}

	/// Shared active-session flags for resolver call sites
	pub fn flags(&self) -> Arc<LocateFlags> {
		Arc::clone(&self.flags)
	}

	pub fn is_active(&self, product_id: Uuid) -> bool {
		self.flags.is_active(product_id)
	}

	/// Idle -> Active: light the locate override and establish the repeat loop
	///
	/// Returns the pulse cadence in milliseconds - controller-reported when
	/// available, the configured default otherwise (a failed initial send
	/// still establishes the loop). Calling start on an already-active
	/// product returns the running session's cadence.
	pub async fn start(&self, product_id: Uuid) -> Result<u64, LocateError> {
		{
			let sessions = self.sessions.lock().await;
			if let Some(existing) = sessions.get(&product_id) {
				return Ok(existing.duration_ms);
			}
		}

		let segments = self.registry.segments_for_product(product_id);
		if segments.is_empty() {
			return Err(LocateError::NoSegments(product_id));
		}

		self.flags.set(product_id);

		let reported = push_locate_frames(
			&self.registry,
			self.stock.as_ref(),
			self.transport.as_ref(),
			product_id,
			true,
		)
		.await;
		let duration_ms = reported.unwrap_or(self.default_pulse_ms);

		let mut sessions = self.sessions.lock().await;
		if let Some(existing) = sessions.get(&product_id) {
			// Lost a race against a concurrent start; the extra frames we
			// pushed were idempotent
			return Ok(existing.duration_ms);
		}

		let cancel = Arc::new(Notify::new());
		let task = tokio::spawn({
			let registry = Arc::clone(&self.registry);
			let stock = Arc::clone(&self.stock);
			let transport = Arc::clone(&self.transport);
			let flags = Arc::clone(&self.flags);
			let cancel = Arc::clone(&cancel);
			let pulse = Duration::from_millis(duration_ms);
			async move {
				loop {
					tokio::select! {
						_ = cancel.notified() => break,
						_ = tokio::time::sleep(pulse) => {
							if !flags.is_active(product_id) {
								break;
							}
							// Failed repeats are logged inside and skipped;
							// transient controller errors never end a session
							push_locate_frames(
								&registry,
								stock.as_ref(),
								transport.as_ref(),
								product_id,
								true,
							)
							.await;
						}
					}
				}
			}
		});

		sessions.insert(
			product_id,
			LocateSession {
				duration_ms,
				cancel,
				task,
			},
		);
		drop(sessions);

		info!(product_id = %product_id, duration_ms, "Locate session started");
		self.events.emit(Event::LocateStarted { product_id });
		Ok(duration_ms)
	}

	/// Active -> Idle: cancel the repeat loop and turn the override off
	///
	/// Idempotent - stopping an idle product is a no-op.
	pub async fn stop(&self, product_id: Uuid) {
		let session = self.sessions.lock().await.remove(&product_id);
		let Some(session) = session else {
			return;
		};

		session.cancel.notify_waiters();
		self.flags.clear(product_id);
		drop(session);

		// Explicit "end locate": repaint the segments without the override
		push_locate_frames(
			&self.registry,
			self.stock.as_ref(),
			self.transport.as_ref(),
			product_id,
			false,
		)
		.await;

		info!(product_id = %product_id, "Locate session stopped");
		self.events.emit(Event::LocateStopped { product_id });
	}

	/// Tear down every live session
	pub async fn shutdown(&self) {
		let product_ids: Vec<Uuid> = self.sessions.lock().await.keys().copied().collect();
		for product_id in product_ids {
			self.stop(product_id).await;
		}
	}
}

/// Push one frame per segment of the product, resolved with the given locate
/// state. Returns the first controller-reported animation duration, if any.
async fn push_locate_frames(
	registry: &FleetRegistry,
	stock: &dyn StockProvider,
	transport: &dyn DeviceTransport,
	product_id: Uuid,
	locate_active: bool,
) -> Option<u64> {
	let mut reported = None;

	for segment in registry.segments_for_product(product_id) {
		let Some(device) = registry.device(segment.device_id) else {
			warn!(segment_id = %segment.id, "Segment's device is gone, skipping");
			continue;
		};

		// The locate override does not depend on stock, so a stock outage
		// degrades to defaults instead of blocking the highlight
		let snapshot = match stock.stock(segment.product_id).await {
			Ok(snapshot) => snapshot,
			Err(e) => {
				debug!(product_id = %product_id, error = %e, "Stock lookup failed during locate");
				StockSnapshot::default()
			}
		};

		let frame = SegmentFrame {
			start_led: segment.start_led,
			led_count: segment.led_count,
			leds: resolve(&segment, snapshot, locate_active),
		};

		match transport.send_segment_command(&device.address, &frame).await {
			Ok(ack) => {
				if reported.is_none() {
					reported = ack.animation_duration_ms;
				}
			}
			Err(e) => {
				warn!(
					segment_id = %segment.id,
					device = %device.name,
					error = %e,
					"Locate frame failed, skipping"
				);
			}
		}
	}

	reported
}
