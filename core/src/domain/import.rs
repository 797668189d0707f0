//! Import batch staging model
//!
//! An [`ImportBatch`] is the value object produced by validation and consumed
//! by commit. It only exists between the two phases - nothing here is ever
//! persisted.

use crate::domain::segment::{LedBehavior, ZoneMode};
use crate::render::Color;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// One parsed CSV row describing a segment to provision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRow {
	/// Product the segment will display
	pub product_id: Uuid,

	/// Device name the segment lands on
	pub device: String,

	/// Network address, used when the device is auto-created
	#[serde(default)]
	pub device_address: Option<String>,

	/// Strip capacity for an auto-created device; config default when unset
	#[serde(default)]
	pub device_total_leds: Option<u16>,

	pub start_led: u16,
	pub led_count: u16,

	#[serde(default)]
	pub location_color: Option<Color>,
	#[serde(default)]
	pub location_behavior: Option<LedBehavior>,
	#[serde(default)]
	pub stock_mode: Option<ZoneMode>,
	#[serde(default)]
	pub stock_behavior: Option<LedBehavior>,
	#[serde(default)]
	pub alert_mode: Option<ZoneMode>,
	#[serde(default)]
	pub alert_behavior: Option<LedBehavior>,

	/// Segment-level behavior override; the `none` sentinel maps to unset
	#[serde(default, deserialize_with = "behavior_override_or_none")]
	pub behavior_override: Option<LedBehavior>,
}

/// Treat an empty cell or the literal `none` as "no override"
fn behavior_override_or_none<'de, D>(deserializer: D) -> Result<Option<LedBehavior>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = Option::<String>::deserialize(deserializer)?;
	match raw.as_deref() {
		None | Some("") | Some("none") => Ok(None),
		Some(token) => token
			.parse::<LedBehavior>()
			.map(Some)
			.map_err(serde::de::Error::custom),
	}
}

/// Classification of one validated row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RowStatus {
	/// Commits as-is
	Valid,
	/// Commits, but flagged (offline device, auto-created device, ...)
	Warning,
	/// Blocked from commit
	Invalid,
}

/// Per-row validation outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowReport {
	/// 1-based CSV line (header is line 1)
	pub line: usize,
	pub status: RowStatus,
	/// Human-readable error/warning detail, in the order found
	pub messages: Vec<String>,
	/// Parsed payload; absent when the row never deserialized
	pub row: Option<ImportRow>,
}

impl RowReport {
	/// Whether commit should materialize this row
	pub fn commits(&self) -> bool {
		matches!(self.status, RowStatus::Valid | RowStatus::Warning)
	}
}

/// Aggregate counts over a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
	pub total_rows: usize,
	pub valid: usize,
	pub warning: usize,
	pub invalid: usize,
}

impl BatchCounts {
	pub fn tally(rows: &[RowReport]) -> Self {
		let mut counts = Self {
			total_rows: rows.len(),
			..Self::default()
		};
		for report in rows {
			match report.status {
				RowStatus::Valid => counts.valid += 1,
				RowStatus::Warning => counts.warning += 1,
				RowStatus::Invalid => counts.invalid += 1,
			}
		}
		counts
	}
}

/// Options captured at validate time
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ImportOptions {
	/// Flag unknown devices as Warning and create them during commit,
	/// instead of rejecting their rows
	pub auto_create_devices: bool,
}

/// Options for the commit phase
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitOptions {
	/// Push every touched device's segments to hardware after commit
	pub auto_sync: bool,
}

/// Staged outcome of the validate phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
	pub id: Uuid,
	pub rows: Vec<RowReport>,
	pub counts: BatchCounts,
	pub options: ImportOptions,
	pub created_at: DateTime<Utc>,
}

impl ImportBatch {
	pub fn new(rows: Vec<RowReport>, options: ImportOptions) -> Self {
		let counts = BatchCounts::tally(&rows);
		Self {
			id: Uuid::new_v4(),
			rows,
			counts,
			options,
			created_at: Utc::now(),
		}
	}
}

/// Result of committing a batch
#[derive(Debug, Clone, Default)]
pub struct CommitOutcome {
	/// Segments created
	pub created: usize,
	/// Devices auto-created for Warning rows
	pub devices_created: usize,
	/// Devices whose auto-sync succeeded
	pub devices_synced: Vec<Uuid>,
}
