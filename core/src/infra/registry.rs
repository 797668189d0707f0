//! In-memory fleet registry
//!
//! Durable persistence of device/segment records is out of scope; this
//! registry is the boundary object that owns them for the process lifetime.
//! Devices and segments live behind one lock so the range invariants
//! (capacity, no overlap) are checked atomically with insertion.

use crate::domain::{Device, DeviceStatus, Segment};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum RegistryError {
	#[error("device {0} not found")]
	DeviceNotFound(Uuid),

	#[error("segment {0} not found")]
	SegmentNotFound(Uuid),

	#[error("device name {0:?} already registered")]
	DuplicateName(String),

	#[error(
		"segment [{start_led}, {start_led}+{led_count}) exceeds device capacity of {total_leds} LEDs"
	)]
	CapacityExceeded {
		start_led: u16,
		led_count: u16,
		total_leds: u16,
	},

	#[error("segment range overlaps existing segment {existing}")]
	RangeOverlap { existing: Uuid },

	#[error("registry lock poisoned")]
	LockPoisoned,
}

#[derive(Default)]
struct FleetState {
	devices: HashMap<Uuid, Device>,
	segments: HashMap<Uuid, Segment>,
}

/// Owns every device and segment record known to the core
#[derive(Default)]
pub struct FleetRegistry {
	state: RwLock<FleetState>,
}

impl FleetRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a new controller
	pub fn create_device(
		&self,
		name: String,
		address: String,
		total_leds: u16,
	) -> Result<Device, RegistryError> {
		let mut state = self.state.write().map_err(|_| RegistryError::LockPoisoned)?;
		if state.devices.values().any(|d| d.name == name) {
			return Err(RegistryError::DuplicateName(name));
		}
		let device = Device::new(name, address, total_leds);
		state.devices.insert(device.id, device.clone());
		Ok(device)
	}

	/// Edit an existing controller record
	pub fn update_device(
		&self,
		device_id: Uuid,
		name: Option<String>,
		address: Option<String>,
		status: Option<DeviceStatus>,
	) -> Result<Device, RegistryError> {
		let mut state = self.state.write().map_err(|_| RegistryError::LockPoisoned)?;
		let device = state
			.devices
			.get_mut(&device_id)
			.ok_or(RegistryError::DeviceNotFound(device_id))?;
		device.edit(name, address, status);
		Ok(device.clone())
	}

	/// Delete a controller and every segment mapped onto it
	///
	/// Returns the number of segments dropped with it.
	pub fn remove_device(&self, device_id: Uuid) -> Result<usize, RegistryError> {
		let mut state = self.state.write().map_err(|_| RegistryError::LockPoisoned)?;
		if state.devices.remove(&device_id).is_none() {
			return Err(RegistryError::DeviceNotFound(device_id));
		}
		let before = state.segments.len();
		state.segments.retain(|_, s| s.device_id != device_id);
		Ok(before - state.segments.len())
	}

	pub fn device(&self, device_id: Uuid) -> Option<Device> {
		self.state.read().ok()?.devices.get(&device_id).cloned()
	}

	pub fn device_by_name(&self, name: &str) -> Option<Device> {
		self.state
			.read()
			.ok()?
			.devices
			.values()
			.find(|d| d.name == name)
			.cloned()
	}

	pub fn devices(&self) -> Vec<Device> {
		self.state
			.read()
			.map(|state| state.devices.values().cloned().collect())
			.unwrap_or_default()
	}

	/// Insert a segment, enforcing the range invariants against the owning
	/// device's strip
	pub fn insert_segment(&self, segment: Segment) -> Result<Segment, RegistryError> {
		let mut state = self.state.write().map_err(|_| RegistryError::LockPoisoned)?;
		Self::check_segment(&state, &segment, None)?;
		state.segments.insert(segment.id, segment.clone());
		Ok(segment)
	}

	/// Replace a segment's configuration, re-checking the range invariants
	pub fn update_segment(&self, segment: Segment) -> Result<Segment, RegistryError> {
		let mut state = self.state.write().map_err(|_| RegistryError::LockPoisoned)?;
		if !state.segments.contains_key(&segment.id) {
			return Err(RegistryError::SegmentNotFound(segment.id));
		}
		Self::check_segment(&state, &segment, Some(segment.id))?;
		state.segments.insert(segment.id, segment.clone());
		Ok(segment)
	}

	pub fn remove_segment(&self, segment_id: Uuid) -> Result<(), RegistryError> {
		let mut state = self.state.write().map_err(|_| RegistryError::LockPoisoned)?;
		state
			.segments
			.remove(&segment_id)
			.map(|_| ())
			.ok_or(RegistryError::SegmentNotFound(segment_id))
	}

	pub fn segment(&self, segment_id: Uuid) -> Option<Segment> {
		self.state.read().ok()?.segments.get(&segment_id).cloned()
	}

	/// Segments on one device, in strip order
	pub fn segments_for_device(&self, device_id: Uuid) -> Vec<Segment> {
		let mut segments: Vec<Segment> = self
			.state
			.read()
			.map(|state| {
				state
					.segments
					.values()
					.filter(|s| s.device_id == device_id)
					.cloned()
					.collect()
			})
			.unwrap_or_default();
		segments.sort_by_key(|s| s.start_led);
		segments
	}

	/// Segments displaying one product, across all devices
	pub fn segments_for_product(&self, product_id: Uuid) -> Vec<Segment> {
		self.state
			.read()
			.map(|state| {
				state
					.segments
					.values()
					.filter(|s| s.product_id == product_id)
					.cloned()
					.collect()
			})
			.unwrap_or_default()
	}

	fn check_segment(
		state: &FleetState,
		segment: &Segment,
		ignore: Option<Uuid>,
	) -> Result<(), RegistryError> {
		let device = state
			.devices
			.get(&segment.device_id)
			.ok_or(RegistryError::DeviceNotFound(segment.device_id))?;

		if !segment.fits_device(device.total_leds) {
			return Err(RegistryError::CapacityExceeded {
				start_led: segment.start_led,
				led_count: segment.led_count,
				total_leds: device.total_leds,
			});
		}

		for existing in state.segments.values() {
			if existing.device_id != segment.device_id || Some(existing.id) == ignore {
				continue;
			}
			if existing.overlaps(segment) {
				return Err(RegistryError::RangeOverlap {
					existing: existing.id,
				});
			}
		}

		Ok(())
	}
}
