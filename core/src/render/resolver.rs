//! Segment behavior resolution
//!
//! Turns a segment's configuration plus a live stock snapshot into one render
//! instruction per LED. Pure and deterministic - no I/O - so the same call
//! serves live preview rendering and the hardware command payload.
//!
//! Priority is an ordered short-circuit chain, first `Some` wins per LED:
//! locate override, out-of-zone fallback, then the three zones with their
//! dynamic stock overrides.

use super::color::{
	Color, ALERT_QUIET, LOCATION_DEFAULT, LOW_STOCK_WARNING, NEUTRAL, OUT_OF_STOCK_CRITICAL,
	STOCK_OK,
};
use crate::domain::{LedBehavior, Segment, StockSnapshot, ZoneConfig, ZoneKind, ZoneMode};
use serde::{Deserialize, Serialize};

/// Animation start offset between neighboring LEDs of a chaser zone,
/// producing the left-to-right chase illusion
pub const PHASE_DELAY_STEP: f32 = 0.5;

/// Render instruction for a single LED
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedRender {
	/// Absolute LED index on the device strip
	pub led_index: u16,
	pub color: Color,
	pub behavior: LedBehavior,
	/// Animation start offset; meaningful only for chaser behaviors
	pub phase_delay: f32,
}

struct ResolveCtx<'a> {
	segment: &'a Segment,
	stock: StockSnapshot,
	locate_active: bool,
}

type ResolveStep = for<'a> fn(&ResolveCtx<'a>, u16) -> Option<LedRender>;

/// Priority order; first step to return `Some` wins the LED
const CHAIN: &[ResolveStep] = &[
	locate_override,
	out_of_zone,
	location_zone,
	stock_zone,
	alert_zone,
];

/// Resolve every LED of `segment` against `stock`
///
/// Returns one [`LedRender`] per LED index in
/// `[start_led, start_led + led_count)`, in index order.
pub fn resolve(segment: &Segment, stock: StockSnapshot, locate_active: bool) -> Vec<LedRender> {
	debug_assert!(segment.led_count > 0, "segment without LEDs");

	let ctx = ResolveCtx {
		segment,
		stock,
		locate_active,
	};

	segment
		.led_range()
		.map(|led_index| {
			CHAIN
				.iter()
				.find_map(|step| step(&ctx, led_index))
				.unwrap_or_else(|| neutral(led_index))
		})
		.collect()
}

/// Defensive default: never expected for well-formed segments
fn neutral(led_index: u16) -> LedRender {
	LedRender {
		led_index,
		color: NEUTRAL,
		behavior: LedBehavior::Off,
		phase_delay: 0.0,
	}
}

fn relative(ctx: &ResolveCtx<'_>, led_index: u16) -> u16 {
	led_index - ctx.segment.start_led
}

/// Step 1: an active locate claims every LED of the segment
fn locate_override(ctx: &ResolveCtx<'_>, led_index: u16) -> Option<LedRender> {
	if !ctx.locate_active || !ctx.segment.locate_override_enabled {
		return None;
	}
	let color = ctx.segment.locate_color?;
	let behavior = ctx.segment.locate_behavior.unwrap_or(LedBehavior::Flash);
	Some(LedRender {
		led_index,
		color,
		behavior,
		phase_delay: phase_delay(behavior, relative(ctx, led_index)),
	})
}

/// Step 2: indices past the Alert zone fall back to the neutral default
fn out_of_zone(ctx: &ResolveCtx<'_>, led_index: u16) -> Option<LedRender> {
	match ZoneKind::classify(relative(ctx, led_index)) {
		Some(_) => None,
		None => Some(neutral(led_index)),
	}
}

/// Step 3: Location color is never altered by stock; it only animates
/// while a locate is active
fn location_zone(ctx: &ResolveCtx<'_>, led_index: u16) -> Option<LedRender> {
	let rel = relative(ctx, led_index);
	if ZoneKind::classify(rel) != Some(ZoneKind::Location) {
		return None;
	}
	let zone = &ctx.segment.location;
	let behavior = if ctx.locate_active {
		zone.behavior
	} else {
		LedBehavior::Off
	};
	Some(LedRender {
		led_index,
		color: zone_color(zone, rel, ZoneKind::Location, LOCATION_DEFAULT),
		behavior,
		phase_delay: phase_delay(behavior, rel),
	})
}

/// Step 4: Stock zone, with the low-stock dynamic override
fn stock_zone(ctx: &ResolveCtx<'_>, led_index: u16) -> Option<LedRender> {
	let rel = relative(ctx, led_index);
	if ZoneKind::classify(rel) != Some(ZoneKind::Stock) {
		return None;
	}
	let zone = &ctx.segment.stock;
	let color = if ctx.stock.is_low() {
		LOW_STOCK_WARNING
	} else {
		zone_color(zone, rel, ZoneKind::Stock, STOCK_OK)
	};
	let behavior = overridable_behavior(ctx.segment, zone);
	Some(LedRender {
		led_index,
		color,
		behavior,
		phase_delay: phase_delay(behavior, rel),
	})
}

/// Step 5: Alert zone, with the out-of-stock dynamic override
fn alert_zone(ctx: &ResolveCtx<'_>, led_index: u16) -> Option<LedRender> {
	let rel = relative(ctx, led_index);
	if ZoneKind::classify(rel) != Some(ZoneKind::Alert) {
		return None;
	}
	let zone = &ctx.segment.alert;
	let color = if ctx.stock.is_out() {
		OUT_OF_STOCK_CRITICAL
	} else {
		zone_color(zone, rel, ZoneKind::Alert, ALERT_QUIET)
	};
	let behavior = overridable_behavior(ctx.segment, zone);
	Some(LedRender {
		led_index,
		color,
		behavior,
		phase_delay: phase_delay(behavior, rel),
	})
}

/// Manual mode reads the per-LED color with the zone default as fallback;
/// Auto mode always uses the zone default
fn zone_color(zone: &ZoneConfig, rel: u16, kind: ZoneKind, default: Color) -> Color {
	match zone.mode {
		ZoneMode::Manual => {
			let slot = (rel - kind.start_index()) as usize;
			zone.colors.get(slot).copied().flatten().unwrap_or(default)
		}
		ZoneMode::Auto => default,
	}
}

/// Segment-level behavior override replaces Stock/Alert zone behavior
fn overridable_behavior(segment: &Segment, zone: &ZoneConfig) -> LedBehavior {
	segment.behavior_override.unwrap_or(zone.behavior)
}

/// Chaser variants stagger starts by position within the zone; everything
/// else ignores phase
fn phase_delay(behavior: LedBehavior, rel: u16) -> f32 {
	if !behavior.is_chaser() {
		return 0.0;
	}
	match ZoneKind::classify(rel) {
		Some(kind) => (rel - kind.start_index()) as f32 * PHASE_DELAY_STEP,
		None => 0.0,
	}
}
