//! Application configuration management
//!
//! Operational knobs only - render palette and zone semantics are code, not
//! configuration. Stored as TOML in the platform data directory.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const CONFIG_FILE: &str = "picklight.toml";
const CONFIG_VERSION: u32 = 1;

/// Platform-specific data directory resolution
pub fn default_data_dir() -> Result<PathBuf> {
	#[cfg(target_os = "macos")]
	let dir = dirs::data_dir()
		.ok_or_else(|| anyhow!("Could not determine data directory"))?
		.join("picklight");

	#[cfg(target_os = "windows")]
	let dir = dirs::data_dir()
		.ok_or_else(|| anyhow!("Could not determine data directory"))?
		.join("Picklight");

	#[cfg(not(any(target_os = "macos", target_os = "windows")))]
	let dir = dirs::data_local_dir()
		.ok_or_else(|| anyhow!("Could not determine data directory"))?
		.join("picklight");

	fs::create_dir_all(&dir)?;

	Ok(dir)
}

/// Main core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
	/// Config schema version
	pub version: u32,

	/// Event bus channel capacity
	#[serde(default = "default_event_capacity")]
	pub event_capacity: usize,

	/// Health monitor settings
	#[serde(default)]
	pub monitor: MonitorConfig,

	/// Controller transport settings
	#[serde(default)]
	pub transport: TransportConfig,

	/// Locate pulse settings
	#[serde(default)]
	pub locate: LocateConfig,

	/// Batch import settings
	#[serde(default)]
	pub import: ImportConfig,
}

fn default_event_capacity() -> usize {
	256
}

/// Health monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
	/// Seconds between automatic background sweeps
	pub probe_interval_secs: u64,

	/// Per-device probe timeout in seconds
	pub probe_timeout_secs: u64,
}

impl Default for MonitorConfig {
	fn default() -> Self {
		Self {
			probe_interval_secs: 30 * 60,
			probe_timeout_secs: 10,
		}
	}
}

impl MonitorConfig {
	pub fn probe_interval(&self) -> Duration {
		Duration::from_secs(self.probe_interval_secs)
	}

	pub fn probe_timeout(&self) -> Duration {
		Duration::from_secs(self.probe_timeout_secs)
	}
}

/// Controller transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
	/// Per-request timeout in seconds
	pub request_timeout_secs: u64,
}

impl Default for TransportConfig {
	fn default() -> Self {
		Self {
			request_timeout_secs: 5,
		}
	}
}

impl TransportConfig {
	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_secs)
	}
}

/// Locate pulse configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocateConfig {
	/// Pulse cadence used when a controller does not report an animation
	/// duration (or the initial send fails)
	pub default_pulse_ms: u64,
}

impl Default for LocateConfig {
	fn default() -> Self {
		Self {
			default_pulse_ms: 12_000,
		}
	}
}

impl LocateConfig {
	pub fn default_pulse(&self) -> Duration {
		Duration::from_millis(self.default_pulse_ms)
	}
}

/// Batch import configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
	/// Strip capacity for devices auto-created during commit, when the CSV
	/// row does not carry one
	pub auto_create_total_leds: u16,
}

impl Default for ImportConfig {
	fn default() -> Self {
		Self {
			auto_create_total_leds: 60,
		}
	}
}

impl Default for CoreConfig {
	fn default() -> Self {
		Self {
			version: CONFIG_VERSION,
			event_capacity: default_event_capacity(),
			monitor: MonitorConfig::default(),
			transport: TransportConfig::default(),
			locate: LocateConfig::default(),
			import: ImportConfig::default(),
		}
	}
}

impl CoreConfig {
	/// Load configuration from `data_dir`, writing defaults on first run
	pub fn load_or_create(data_dir: &Path) -> Result<Self> {
		let path = data_dir.join(CONFIG_FILE);
		if path.exists() {
			Self::load(&path)
		} else {
			info!(path = %path.display(), "Writing default configuration");
			let config = Self::default();
			config.save(&path)?;
			Ok(config)
		}
	}

	/// Load configuration from an explicit file path
	pub fn load(path: &Path) -> Result<Self> {
		let raw = fs::read_to_string(path)
			.with_context(|| format!("reading config from {}", path.display()))?;
		let config: Self = toml::from_str(&raw)
			.with_context(|| format!("parsing config from {}", path.display()))?;
		Ok(config)
	}

	/// Save configuration to an explicit file path
	pub fn save(&self, path: &Path) -> Result<()> {
		let raw = toml::to_string_pretty(self).context("serializing config")?;
		fs::write(path, raw).with_context(|| format!("writing config to {}", path.display()))?;
		Ok(())
	}
}
