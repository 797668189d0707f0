//! Two-phase CSV batch import
//!
//! Phase 1 (`validate`) stages an [`ImportBatch`] without side effects; phase
//! 2 (`commit`) consumes the staged batch and materializes its committable
//! rows. Commit never re-validates against live state beyond what insertion
//! itself enforces - the staleness window between the phases is accepted,
//! and rows that no longer apply are skipped with a warning.

pub mod parser;

use crate::config::ImportConfig;
use crate::domain::{
	fits_strip, ranges_overlap, CommitOptions, CommitOutcome, Device, ImportBatch, ImportOptions,
	ImportRow, RowReport, RowStatus, Segment, StockProvider, ZoneConfig, ZoneMode,
	ZONE_LED_COUNT,
};
use crate::infra::{Event, EventBus, FleetRegistry};
use crate::service::{DeviceHealthMonitor, SyncCoordinator};
use parser::ParsedRow;
use std::collections::{BTreeSet, HashMap};
use std::ops::Range;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ImportError {
	#[error("upload contains no data rows")]
	EmptyInput,

	#[error("upload is missing required columns: {0}")]
	MissingColumns(String),

	#[error("csv error: {0}")]
	Parse(#[from] csv::Error),

	#[error("batch {0} not found (never validated, already committed, or discarded)")]
	BatchNotFound(Uuid),
}

/// Validates and commits bulk segment uploads
pub struct BatchImportPipeline {
	registry: Arc<FleetRegistry>,
	stock: Arc<dyn StockProvider>,
	health: Arc<DeviceHealthMonitor>,
	sync: Arc<SyncCoordinator>,
	events: Arc<EventBus>,
	auto_create_total_leds: u16,
	staged: Mutex<HashMap<Uuid, ImportBatch>>,
}

impl BatchImportPipeline {
	pub fn new(
		config: &ImportConfig,
		registry: Arc<FleetRegistry>,
		stock: Arc<dyn StockProvider>,
		health: Arc<DeviceHealthMonitor>,
		sync: Arc<SyncCoordinator>,
		events: Arc<EventBus>,
	) -> Self {
		Self {
			registry,
			stock,
			health,
			sync,
			events,
			auto_create_total_leds: config.auto_create_total_leds,
			staged: Mutex::new(HashMap::new()),
		}
	}

	/// Phase 1: classify every row, stage the batch, touch nothing
	pub async fn validate(
		&self,
		csv_text: &str,
		options: ImportOptions,
	) -> Result<ImportBatch, ImportError> {
		let parsed = parser::parse_rows(csv_text)?;

		let mut reports: Vec<RowReport> = Vec::with_capacity(parsed.len());
		// Ranges already claimed by earlier rows of this upload, per device
		// name - catches two rows colliding before either exists
		let mut claimed: HashMap<String, Vec<ClaimedRange>> = HashMap::new();

		for ParsedRow { line, result } in parsed {
			let row = match result {
				Ok(row) => row,
				Err(message) => {
					reports.push(RowReport {
						line,
						status: RowStatus::Invalid,
						messages: vec![message],
						row: None,
					});
					continue;
				}
			};

			let mut status = RowStatus::Valid;
			let mut messages = Vec::new();

			if !self.stock.product_exists(row.product_id).await {
				degrade(&mut status, RowStatus::Invalid);
				messages.push(format!("unknown product {}", row.product_id));
			}

			let device = self.registry.device_by_name(&row.device);
			let capacity = match &device {
				Some(device) => Some(device.total_leds),
				None if options.auto_create_devices => {
					degrade(&mut status, RowStatus::Warning);
					messages.push(format!("device {:?} will be created", row.device));
					Some(row.device_total_leds.unwrap_or(self.auto_create_total_leds))
				}
				None => {
					degrade(&mut status, RowStatus::Invalid);
					messages.push(format!("unknown device {:?}", row.device));
					None
				}
			};

			if let Some(total_leds) = capacity {
				if !fits_strip(row.start_led, row.led_count, total_leds) {
					degrade(&mut status, RowStatus::Invalid);
					messages.push(format!(
						"LED range [{}, {}+{}) exceeds device capacity of {} LEDs",
						row.start_led, row.start_led, row.led_count, total_leds
					));
				}
			}

			if let Some(device) = &device {
				for existing in self.registry.segments_for_device(device.id) {
					if ranges_overlap(row_range(&row), existing.led_range()) {
						degrade(&mut status, RowStatus::Invalid);
						messages.push(format!(
							"LED range overlaps existing segment {}",
							existing.id
						));
						break;
					}
				}

				if self.health.is_online(device.id).await == Some(false) {
					degrade(&mut status, RowStatus::Warning);
					messages.push(format!("device {:?} is currently offline", row.device));
				}
			}

			// In-batch collisions flag BOTH rows, including the earlier one
			// that looked fine when it was validated
			for earlier in claimed.get(&row.device).into_iter().flatten() {
				if ranges_overlap(row_range(&row), earlier.range.clone()) {
					degrade(&mut status, RowStatus::Invalid);
					messages.push(format!(
						"LED range overlaps row at line {} in this upload",
						earlier.line
					));
					let prior = &mut reports[earlier.report_index];
					degrade(&mut prior.status, RowStatus::Invalid);
					prior.messages.push(format!(
						"LED range overlaps row at line {} in this upload",
						line
					));
				}
			}
			claimed.entry(row.device.clone()).or_default().push(ClaimedRange {
				report_index: reports.len(),
				line,
				range: row_range(&row),
			});

			reports.push(RowReport {
				line,
				status,
				messages,
				row: Some(row),
			});
		}

		// Statuses may have changed retroactively; tally last
		let batch = ImportBatch::new(reports, options);
		info!(
			batch_id = %batch.id,
			total = batch.counts.total_rows,
			valid = batch.counts.valid,
			warning = batch.counts.warning,
			invalid = batch.counts.invalid,
			"Validated import batch"
		);

		self.staged.lock().await.insert(batch.id, batch.clone());
		Ok(batch)
	}

	/// Phase 2: materialize the staged batch's committable rows
	///
	/// Consumes the staged batch - committing the same handle twice fails
	/// with [`ImportError::BatchNotFound`] rather than double-creating
	/// segments.
	pub async fn commit(
		&self,
		batch_id: Uuid,
		options: CommitOptions,
	) -> Result<CommitOutcome, ImportError> {
		let batch = self
			.staged
			.lock()
			.await
			.remove(&batch_id)
			.ok_or(ImportError::BatchNotFound(batch_id))?;

		let mut outcome = CommitOutcome::default();
		let mut touched: BTreeSet<Uuid> = BTreeSet::new();

		for report in batch.rows.iter().filter(|r| r.commits()) {
			let Some(row) = &report.row else { continue };

			let (device, just_created) = match self.resolve_device(row, &batch.options) {
				Some(pair) => pair,
				None => {
					warn!(line = report.line, device = %row.device, "Device unavailable at commit, skipping row");
					continue;
				}
			};
			if just_created {
				outcome.devices_created += 1;
			}

			match self.registry.insert_segment(segment_from_row(device.id, row)) {
				Ok(_) => {
					outcome.created += 1;
					touched.insert(device.id);
				}
				// The accepted staleness window: state moved between phases
				Err(e) => warn!(
					line = report.line,
					device = %device.name,
					error = %e,
					"Row no longer applies at commit, skipping"
				),
			}
		}

		info!(
			batch_id = %batch_id,
			created = outcome.created,
			devices_created = outcome.devices_created,
			"Committed import batch"
		);
		self.events.emit(Event::ImportCommitted {
			batch_id,
			created: outcome.created,
		});

		if options.auto_sync {
			let results = self.sync.sync_devices(touched.into_iter().collect()).await;
			for (device_id, result) in results {
				match result {
					Ok(report) => {
						outcome.devices_synced.push(device_id);
						info!(
							device_id = %device_id,
							synced = report.synced_segments,
							"Auto-sync after import complete"
						);
					}
					Err(e) => warn!(device_id = %device_id, error = %e, "Auto-sync after import failed"),
				}
			}
		}

		Ok(outcome)
	}

	/// Drop a staged batch that will never be committed
	pub async fn discard(&self, batch_id: Uuid) -> bool {
		self.staged.lock().await.remove(&batch_id).is_some()
	}

	/// Read access to a staged batch between the phases
	pub async fn staged_batch(&self, batch_id: Uuid) -> Option<ImportBatch> {
		self.staged.lock().await.get(&batch_id).cloned()
	}

	/// Find the row's device, auto-creating it when the batch was validated
	/// with that option. Returns the device and whether it was just created.
	fn resolve_device(&self, row: &ImportRow, options: &ImportOptions) -> Option<(Device, bool)> {
		if let Some(device) = self.registry.device_by_name(&row.device) {
			return Some((device, false));
		}
		if !options.auto_create_devices {
			return None;
		}

		let address = row
			.device_address
			.clone()
			.unwrap_or_else(|| row.device.clone());
		let total_leds = row.device_total_leds.unwrap_or(self.auto_create_total_leds);
		match self
			.registry
			.create_device(row.device.clone(), address, total_leds)
		{
			Ok(device) => {
				info!(device = %device.name, total_leds, "Auto-created device during import");
				Some((device, true))
			}
			Err(e) => {
				warn!(device = %row.device, error = %e, "Failed to auto-create device");
				None
			}
		}
	}
}

struct ClaimedRange {
	report_index: usize,
	line: usize,
	range: Range<u16>,
}

fn row_range(row: &ImportRow) -> Range<u16> {
	row.start_led..row.start_led.saturating_add(row.led_count)
}

/// Keep the worst of the two statuses
fn degrade(status: &mut RowStatus, to: RowStatus) {
	let rank = |s: RowStatus| match s {
		RowStatus::Valid => 0,
		RowStatus::Warning => 1,
		RowStatus::Invalid => 2,
	};
	if rank(to) > rank(*status) {
		*status = to;
	}
}

/// Build the segment a committable row describes
fn segment_from_row(device_id: Uuid, row: &ImportRow) -> Segment {
	let mut segment = Segment::new(device_id, row.product_id, row.start_led, row.led_count);

	if let Some(color) = row.location_color {
		segment.location = ZoneConfig {
			mode: ZoneMode::Manual,
			behavior: segment.location.behavior,
			colors: [Some(color); ZONE_LED_COUNT as usize],
		};
	}
	if let Some(behavior) = row.location_behavior {
		segment.location.behavior = behavior;
	}
	if let Some(mode) = row.stock_mode {
		segment.stock.mode = mode;
	}
	if let Some(behavior) = row.stock_behavior {
		segment.stock.behavior = behavior;
	}
	if let Some(mode) = row.alert_mode {
		segment.alert.mode = mode;
	}
	if let Some(behavior) = row.alert_behavior {
		segment.alert.behavior = behavior;
	}
	segment.behavior_override = row.behavior_override;

	segment
}
