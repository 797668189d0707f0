//! Infrastructure layer - external interfaces and process-owned state

pub mod event;
pub mod registry;
pub mod transport;

pub use event::{Event, EventBus};
pub use registry::{FleetRegistry, RegistryError};
pub use transport::{
	CommandAck, DeviceTransport, HttpDeviceTransport, ProbeReport, SegmentFrame, TransportError,
};
