//! Long-lived services: health monitoring, device sync, locate sessions

pub mod health;
pub mod locate;
pub mod sync;

pub use health::{DeviceHealthMonitor, HealthSummary};
pub use locate::{LocateError, LocateFlags, LocatePulseController};
pub use sync::{SyncCoordinator, SyncError, SyncReport};
