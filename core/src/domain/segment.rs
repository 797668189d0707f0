//! Segment model - a contiguous LED range on one device, bound to one product
//!
//! A full-size segment is 12 LEDs split into three fixed zones in index
//! order: Location (4), Stock (4), Alert (4). Shorter segments populate only
//! the zones that fit. Zone behavior resolution lives in [`crate::render`];
//! this module only models configuration.

use crate::render::Color;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use uuid::Uuid;

/// LEDs per zone in a well-formed segment
pub const ZONE_LED_COUNT: u16 = 4;

/// LEDs in a full segment (Location + Stock + Alert)
pub const FULL_SEGMENT_LEDS: u16 = 3 * ZONE_LED_COUNT;

/// Animation behavior a zone (or override) can request from the controller
#[derive(
	Debug,
	Clone,
	Copy,
	PartialEq,
	Eq,
	Serialize,
	Deserialize,
	strum::Display,
	strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LedBehavior {
	Solid,
	Flash,
	ChaserLoop,
	FlashSolid,
	ChaserTwice,
	Off,
}

impl LedBehavior {
	/// Chaser variants are the only behaviors that honor a phase delay
	pub fn is_chaser(self) -> bool {
		matches!(self, Self::ChaserLoop | Self::ChaserTwice)
	}
}

/// How a zone picks its colors
#[derive(
	Debug,
	Clone,
	Copy,
	PartialEq,
	Eq,
	Serialize,
	Deserialize,
	strum::Display,
	strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ZoneMode {
	/// Fixed palette colors chosen by stock state
	Auto,
	/// Operator-picked per-LED colors
	Manual,
}

/// The three fixed zones of a segment, in index order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ZoneKind {
	Location,
	Stock,
	Alert,
}

impl ZoneKind {
	/// Classify a segment-relative LED index into its zone
	///
	/// Indices past the Alert zone have no zone and fall back to the neutral
	/// render default.
	pub fn classify(relative_index: u16) -> Option<ZoneKind> {
		match relative_index / ZONE_LED_COUNT {
			0 => Some(ZoneKind::Location),
			1 => Some(ZoneKind::Stock),
			2 => Some(ZoneKind::Alert),
			_ => None,
		}
	}

	/// First segment-relative LED index of this zone
	pub fn start_index(self) -> u16 {
		match self {
			ZoneKind::Location => 0,
			ZoneKind::Stock => ZONE_LED_COUNT,
			ZoneKind::Alert => 2 * ZONE_LED_COUNT,
		}
	}
}

/// Configuration of one zone within a segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
	pub mode: ZoneMode,
	pub behavior: LedBehavior,
	/// Explicit per-LED colors, used in Manual mode; unset LEDs fall back to
	/// the zone's default palette color
	#[serde(default)]
	pub colors: [Option<Color>; ZONE_LED_COUNT as usize],
}

impl ZoneConfig {
	pub fn auto(behavior: LedBehavior) -> Self {
		Self {
			mode: ZoneMode::Auto,
			behavior,
			colors: [None; ZONE_LED_COUNT as usize],
		}
	}
}

impl Default for ZoneConfig {
	fn default() -> Self {
		Self::auto(LedBehavior::Solid)
	}
}

/// A contiguous LED range on one device, displaying one product's status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
	pub id: Uuid,
	pub device_id: Uuid,
	pub product_id: Uuid,

	/// First LED index on the device strip
	pub start_led: u16,
	/// Number of LEDs occupied, from `start_led`
	pub led_count: u16,

	/// "Here is the item" zone - color never altered by stock state
	pub location: ZoneConfig,
	/// Stock-level zone - forced to the warning color on low stock
	pub stock: ZoneConfig,
	/// Alert zone - forced to the critical color when stock runs out
	pub alert: ZoneConfig,

	/// When set, replaces the Stock and Alert zone behaviors (never Location)
	#[serde(default)]
	pub behavior_override: Option<LedBehavior>,

	/// Whether the locate override may claim this segment's LEDs
	#[serde(default)]
	pub locate_override_enabled: bool,
	/// Color painted over every LED while a locate is active
	#[serde(default)]
	pub locate_color: Option<Color>,
	/// Behavior during a locate; Flash when unset
	#[serde(default)]
	pub locate_behavior: Option<LedBehavior>,

	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Segment {
	/// Create a segment with default zone configuration
	pub fn new(device_id: Uuid, product_id: Uuid, start_led: u16, led_count: u16) -> Self {
		let now = Utc::now();
		Self {
			id: Uuid::new_v4(),
			device_id,
			product_id,
			start_led,
			led_count,
			location: ZoneConfig::auto(LedBehavior::Solid),
			stock: ZoneConfig::default(),
			alert: ZoneConfig::default(),
			behavior_override: None,
			locate_override_enabled: true,
			locate_color: None,
			locate_behavior: None,
			created_at: now,
			updated_at: now,
		}
	}

	/// Absolute LED index range `[start_led, start_led + led_count)`
	pub fn led_range(&self) -> Range<u16> {
		self.start_led..self.start_led.saturating_add(self.led_count)
	}

	/// Whether two segments on the same strip would claim a common LED
	pub fn overlaps(&self, other: &Segment) -> bool {
		ranges_overlap(self.led_range(), other.led_range())
	}

	/// Whether the range fits on a strip of `total_leds`
	pub fn fits_device(&self, total_leds: u16) -> bool {
		fits_strip(self.start_led, self.led_count, total_leds)
	}
}

/// Range-fits-strip check shared with import validation
pub fn fits_strip(start_led: u16, led_count: u16, total_leds: u16) -> bool {
	led_count > 0 && (start_led as u32 + led_count as u32) <= total_leds as u32
}

/// Half-open range overlap shared with import validation
pub fn ranges_overlap(a: Range<u16>, b: Range<u16>) -> bool {
	a.start < b.end && b.start < a.end
}
