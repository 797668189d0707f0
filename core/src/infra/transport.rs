//! Controller transport boundary
//!
//! The exact wire protocol of the LED controllers is external; this core only
//! depends on [`DeviceTransport`]. [`HttpDeviceTransport`] is the production
//! implementation, speaking the controllers' plain HTTP+JSON endpoints.
//! Retries are the transport layer's problem, not ours - callers treat every
//! result as final.

use crate::render::LedRender;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// One per-segment hardware command: the full resolved LED range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentFrame {
	pub start_led: u16,
	pub led_count: u16,
	pub leds: Vec<LedRender>,
}

/// Controller reply to a segment command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandAck {
	/// How long the triggered animation runs, when the controller knows;
	/// drives the locate pulse cadence
	#[serde(default)]
	pub animation_duration_ms: Option<u64>,
}

/// Controller reply to a reachability probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeReport {
	/// Controllers may self-report degraded even when reachable
	#[serde(default = "default_online")]
	pub online: bool,
	/// WiFi signal strength in dBm
	#[serde(default)]
	pub rssi: Option<i16>,
	#[serde(default)]
	pub uptime_secs: Option<u64>,
}

fn default_online() -> bool {
	true
}

#[derive(Error, Debug)]
pub enum TransportError {
	#[error("request to {address} timed out")]
	Timeout { address: String },

	#[error("controller {address} rejected the request with status {status}")]
	Rejected { address: String, status: u16 },

	#[error("http error talking to {address}: {source}")]
	Http {
		address: String,
		source: reqwest::Error,
	},

	#[error("failed to build http client: {0}")]
	Client(reqwest::Error),
}

/// Request/response boundary to a physical controller
#[async_trait]
pub trait DeviceTransport: Send + Sync {
	/// Push one segment's resolved LED range to the controller
	async fn send_segment_command(
		&self,
		address: &str,
		frame: &SegmentFrame,
	) -> Result<CommandAck, TransportError>;

	/// Reachability probe; any error is mapped to "offline" by the caller
	async fn probe(&self, address: &str) -> Result<ProbeReport, TransportError>;
}

/// HTTP+JSON transport to the controllers' firmware endpoints
#[derive(Debug, Clone)]
pub struct HttpDeviceTransport {
	client: reqwest::Client,
}

impl HttpDeviceTransport {
	/// Build a transport with a per-request timeout
	pub fn new(request_timeout: Duration) -> Result<Self, TransportError> {
		let client = reqwest::Client::builder()
			.timeout(request_timeout)
			.build()
			.map_err(TransportError::Client)?;
		Ok(Self { client })
	}

	fn request_error(address: &str, source: reqwest::Error) -> TransportError {
		if source.is_timeout() {
			TransportError::Timeout {
				address: address.to_string(),
			}
		} else {
			TransportError::Http {
				address: address.to_string(),
				source,
			}
		}
	}
}

#[async_trait]
impl DeviceTransport for HttpDeviceTransport {
	async fn send_segment_command(
		&self,
		address: &str,
		frame: &SegmentFrame,
	) -> Result<CommandAck, TransportError> {
		let url = format!("http://{address}/api/segment");
		let response = self
			.client
			.post(url)
			.json(frame)
			.send()
			.await
			.map_err(|e| Self::request_error(address, e))?;

		if !response.status().is_success() {
			return Err(TransportError::Rejected {
				address: address.to_string(),
				status: response.status().as_u16(),
			});
		}

		// Older firmware replies with an empty body; treat that as a bare ack
		Ok(response.json::<CommandAck>().await.unwrap_or_default())
	}

	async fn probe(&self, address: &str) -> Result<ProbeReport, TransportError> {
		let url = format!("http://{address}/api/status");
		let response = self
			.client
			.get(url)
			.send()
			.await
			.map_err(|e| Self::request_error(address, e))?;

		if !response.status().is_success() {
			return Err(TransportError::Rejected {
				address: address.to_string(),
				status: response.status().as_u16(),
			});
		}

		response
			.json::<ProbeReport>()
			.await
			.map_err(|e| Self::request_error(address, e))
	}
}
