//! Core domain models for the pick-to-light fleet
//!
//! - Device: one physical LED controller
//! - Segment: a contiguous LED range on a device, bound to one product
//! - StockSnapshot: read-only inventory input to resolution
//! - ImportBatch: ephemeral staging between import validate and commit

pub mod device;
pub mod import;
pub mod segment;
pub mod stock;

// Re-export commonly used types
pub use device::{Device, DeviceHealth, DeviceStatus};
pub use import::{
	BatchCounts, CommitOptions, CommitOutcome, ImportBatch, ImportOptions, ImportRow, RowReport,
	RowStatus,
};
pub use segment::{
	fits_strip, ranges_overlap, LedBehavior, Segment, ZoneConfig, ZoneKind, ZoneMode,
	FULL_SEGMENT_LEDS, ZONE_LED_COUNT,
};
pub use stock::{StockError, StockProvider, StockSnapshot};
