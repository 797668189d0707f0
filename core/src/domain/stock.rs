//! Stock snapshot - read-only input from the inventory system
//!
//! The product database itself is out of scope; resolution only ever sees
//! this snapshot, supplied per call through [`StockProvider`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Live stock numbers for one product at one point in time
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StockSnapshot {
	pub quantity: u32,
	pub min_level: u32,
}

impl StockSnapshot {
	pub fn new(quantity: u32, min_level: u32) -> Self {
		Self { quantity, min_level }
	}

	/// Below the operator-set minimum (zero included)
	pub fn is_low(&self) -> bool {
		self.quantity < self.min_level
	}

	/// Completely out of stock
	pub fn is_out(&self) -> bool {
		self.quantity == 0
	}
}

#[derive(Error, Debug)]
pub enum StockError {
	#[error("product {0} not found")]
	ProductNotFound(Uuid),

	#[error("stock store unavailable: {0}")]
	Unavailable(String),
}

/// Boundary to the inventory/product store
#[async_trait]
pub trait StockProvider: Send + Sync {
	/// Current stock numbers for a product
	async fn stock(&self, product_id: Uuid) -> Result<StockSnapshot, StockError>;

	/// Whether the product exists at all (used by import validation)
	async fn product_exists(&self, product_id: Uuid) -> bool;
}
