//! Device model - one physical LED controller per rack or storage location
//!
//! A Device owns a strip of addressable LEDs that segments are mapped onto.
//! Operators create, edit and delete devices; reachability lives in
//! [`DeviceHealth`], which is monitor-derived and never authoritative.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical pick-to-light controller on the warehouse network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
	/// Unique identifier for this controller
	pub id: Uuid,

	/// Human-readable name (e.g., "rack-a-04")
	pub name: String,

	/// Network address of the controller (`host` or `host:port`)
	pub address: String,

	/// Number of LEDs on the controller's strip
	pub total_leds: u16,

	/// Operator-declared lifecycle status
	pub status: DeviceStatus,

	/// When this controller was registered
	pub created_at: DateTime<Utc>,

	/// When this controller record was last edited
	pub updated_at: DateTime<Utc>,
}

/// Operator-declared status of a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceStatus {
	Active,
	Maintenance,
	Retired,
}

impl Device {
	/// Create a new device record
	pub fn new(name: String, address: String, total_leds: u16) -> Self {
		let now = Utc::now();
		Self {
			id: Uuid::new_v4(),
			name,
			address,
			total_leds,
			status: DeviceStatus::Active,
			created_at: now,
			updated_at: now,
		}
	}

	/// Update the editable fields, bumping `updated_at`
	pub fn edit(
		&mut self,
		name: Option<String>,
		address: Option<String>,
		status: Option<DeviceStatus>,
	) {
		if let Some(name) = name {
			self.name = name;
		}
		if let Some(address) = address {
			self.address = address;
		}
		if let Some(status) = status {
			self.status = status;
		}
		self.updated_at = Utc::now();
	}
}

/// Monitor-derived reachability state for a device
///
/// Always re-derived by the health monitor; a stale value between sweeps is
/// expected and acceptable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceHealth {
	/// Whether the last probe reached the controller
	pub online: bool,

	/// Reported signal strength in dBm, when the controller exposes it
	pub signal_strength: Option<i16>,

	/// Last time a probe succeeded
	pub last_seen: Option<DateTime<Utc>>,
}

impl DeviceHealth {
	/// Health state for a successful probe
	pub fn online(signal_strength: Option<i16>) -> Self {
		Self {
			online: true,
			signal_strength,
			last_seen: Some(Utc::now()),
		}
	}

	/// Health state for a failed probe, carrying forward the last sighting
	pub fn offline(last_seen: Option<DateTime<Utc>>) -> Self {
		Self {
			online: false,
			signal_strength: None,
			last_seen,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn edit_bumps_updated_at() {
		let mut device = Device::new("rack-a-04".into(), "10.0.8.14".into(), 60);
		let created = device.updated_at;
		device.edit(None, None, Some(DeviceStatus::Maintenance));
		assert_eq!(device.status, DeviceStatus::Maintenance);
		assert!(device.updated_at >= created);
		assert_eq!(device.name, "rack-a-04");
	}

	#[test]
	fn offline_health_keeps_last_seen() {
		let seen = Some(Utc::now());
		let health = DeviceHealth::offline(seen);
		assert!(!health.online);
		assert_eq!(health.last_seen, seen);
		assert!(health.signal_strength.is_none());
	}
}
