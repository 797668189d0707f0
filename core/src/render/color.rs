//! RGB color type and the fixed render palette
//!
//! Colors travel to controllers and through configuration as `#RRGGBB`
//! strings; in memory they are plain 8-bit triples.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b }
	}
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
	#[error("color must be 6 hex digits, got {0:?}")]
	BadLength(String),

	#[error("invalid hex digit in color {0:?}")]
	BadDigit(String),
}

impl fmt::Display for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
	}
}

impl FromStr for Color {
	type Err = ColorParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let hex = s.strip_prefix('#').unwrap_or(s);
		if hex.len() != 6 {
			return Err(ColorParseError::BadLength(s.to_string()));
		}
		let parse_pair = |range: std::ops::Range<usize>| {
			u8::from_str_radix(&hex[range], 16).map_err(|_| ColorParseError::BadDigit(s.to_string()))
		};
		Ok(Self {
			r: parse_pair(0..2)?,
			g: parse_pair(2..4)?,
			b: parse_pair(4..6)?,
		})
	}
}

impl Serialize for Color {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for Color {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		raw.parse().map_err(serde::de::Error::custom)
	}
}

/// Default Location-zone color ("here is the item")
pub const LOCATION_DEFAULT: Color = Color::rgb(0x00, 0x60, 0xFF);

/// Default Stock-zone color when stock is healthy
pub const STOCK_OK: Color = Color::rgb(0x00, 0xAA, 0x55);

/// Forced Stock-zone color when quantity drops below the minimum level
pub const LOW_STOCK_WARNING: Color = Color::rgb(0xFF, 0x8C, 0x00);

/// Forced Alert-zone color when a product is out of stock
pub const OUT_OF_STOCK_CRITICAL: Color = Color::rgb(0xDD, 0x20, 0x20);

/// Default Alert-zone color when nothing is wrong
pub const ALERT_QUIET: Color = Color::rgb(0x00, 0x18, 0x30);

/// Defensive default for LED indices outside any zone
pub const NEUTRAL: Color = Color::rgb(0x12, 0x12, 0x12);

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hex_round_trip() {
		let color: Color = "#FF8C00".parse().expect("parse");
		assert_eq!(color, LOW_STOCK_WARNING);
		assert_eq!(color.to_string(), "#FF8C00");

		let bare: Color = "0060ff".parse().expect("parse without hash");
		assert_eq!(bare, LOCATION_DEFAULT);
	}

	#[test]
	fn rejects_malformed_input() {
		assert!(matches!(
			"#FFF".parse::<Color>(),
			Err(ColorParseError::BadLength(_))
		));
		assert!(matches!(
			"#GGGGGG".parse::<Color>(),
			Err(ColorParseError::BadDigit(_))
		));
	}

	#[test]
	fn serde_uses_hex_strings() {
		let json = serde_json::to_string(&STOCK_OK).expect("serialize");
		assert_eq!(json, "\"#00AA55\"");
		let back: Color = serde_json::from_str(&json).expect("deserialize");
		assert_eq!(back, STOCK_OK);
	}
}
