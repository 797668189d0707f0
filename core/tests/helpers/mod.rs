//! Shared helpers for integration tests: a scriptable controller transport
//! and an in-memory stock provider.

#![allow(dead_code)]

use async_trait::async_trait;
use picklight_core::domain::{StockError, StockProvider, StockSnapshot};
use picklight_core::infra::{
	CommandAck, DeviceTransport, ProbeReport, SegmentFrame, TransportError,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// How a mock controller answers probes
#[derive(Debug, Clone, Default)]
pub enum ProbeBehavior {
	/// Reachable, no signal report
	#[default]
	Online,
	/// Reachable, with a WiFi signal reading
	OnlineWithRssi(i16),
	/// Reachable but self-reporting offline
	SelfReportedOffline,
	/// Refuses the request
	Error,
	/// Never answers (simulated network black hole)
	Hang,
}

/// One captured segment command
#[derive(Debug, Clone)]
pub struct SentFrame {
	pub address: String,
	pub frame: SegmentFrame,
}

/// Scriptable [`DeviceTransport`] that records every command
#[derive(Default)]
pub struct MockTransport {
	probe_behavior: Mutex<HashMap<String, ProbeBehavior>>,
	failing_addresses: Mutex<HashSet<String>>,
	fail_next: Mutex<usize>,
	ack_duration: Mutex<Option<u64>>,
	sent: Mutex<Vec<SentFrame>>,
}

impl MockTransport {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn set_probe(&self, address: &str, behavior: ProbeBehavior) {
		self.probe_behavior
			.lock()
			.unwrap()
			.insert(address.to_string(), behavior);
	}

	/// Every send to `address` fails until cleared
	pub fn set_send_failure(&self, address: &str, failing: bool) {
		let mut failing_addresses = self.failing_addresses.lock().unwrap();
		if failing {
			failing_addresses.insert(address.to_string());
		} else {
			failing_addresses.remove(address);
		}
	}

	/// The next `n` sends fail, regardless of address
	pub fn fail_next_sends(&self, n: usize) {
		*self.fail_next.lock().unwrap() = n;
	}

	/// Duration controllers report in command acks
	pub fn set_ack_duration(&self, duration_ms: Option<u64>) {
		*self.ack_duration.lock().unwrap() = duration_ms;
	}

	pub fn sent(&self) -> Vec<SentFrame> {
		self.sent.lock().unwrap().clone()
	}

	pub fn sent_count(&self) -> usize {
		self.sent.lock().unwrap().len()
	}

	pub fn clear_sent(&self) {
		self.sent.lock().unwrap().clear();
	}
}

#[async_trait]
impl DeviceTransport for MockTransport {
	async fn send_segment_command(
		&self,
		address: &str,
		frame: &SegmentFrame,
	) -> Result<CommandAck, TransportError> {
		{
			let mut fail_next = self.fail_next.lock().unwrap();
			if *fail_next > 0 {
				*fail_next -= 1;
				return Err(TransportError::Timeout {
					address: address.to_string(),
				});
			}
		}
		if self.failing_addresses.lock().unwrap().contains(address) {
			return Err(TransportError::Timeout {
				address: address.to_string(),
			});
		}

		self.sent.lock().unwrap().push(SentFrame {
			address: address.to_string(),
			frame: frame.clone(),
		});
		Ok(CommandAck {
			animation_duration_ms: *self.ack_duration.lock().unwrap(),
		})
	}

	async fn probe(&self, address: &str) -> Result<ProbeReport, TransportError> {
		let behavior = self
			.probe_behavior
			.lock()
			.unwrap()
			.get(address)
			.cloned()
			.unwrap_or_default();

		match behavior {
			ProbeBehavior::Online => Ok(ProbeReport {
				online: true,
				rssi: None,
				uptime_secs: None,
			}),
			ProbeBehavior::OnlineWithRssi(rssi) => Ok(ProbeReport {
				online: true,
				rssi: Some(rssi),
				uptime_secs: Some(3600),
			}),
			ProbeBehavior::SelfReportedOffline => Ok(ProbeReport {
				online: false,
				rssi: None,
				uptime_secs: None,
			}),
			ProbeBehavior::Error => Err(TransportError::Rejected {
				address: address.to_string(),
				status: 503,
			}),
			ProbeBehavior::Hang => std::future::pending().await,
		}
	}
}

/// In-memory [`StockProvider`]
#[derive(Default)]
pub struct TestStock {
	products: Mutex<HashMap<Uuid, StockSnapshot>>,
}

impl TestStock {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Register a product with its stock numbers, returning its id
	pub fn add_product(&self, quantity: u32, min_level: u32) -> Uuid {
		let product_id = Uuid::new_v4();
		self.set_stock(product_id, quantity, min_level);
		product_id
	}

	pub fn set_stock(&self, product_id: Uuid, quantity: u32, min_level: u32) {
		self.products
			.lock()
			.unwrap()
			.insert(product_id, StockSnapshot::new(quantity, min_level));
	}
}

#[async_trait]
impl StockProvider for TestStock {
	async fn stock(&self, product_id: Uuid) -> Result<StockSnapshot, StockError> {
		self.products
			.lock()
			.unwrap()
			.get(&product_id)
			.copied()
			.ok_or(StockError::ProductNotFound(product_id))
	}

	async fn product_exists(&self, product_id: Uuid) -> bool {
		self.products.lock().unwrap().contains_key(&product_id)
	}
}
