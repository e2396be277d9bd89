//! Application core: pure domain logic, zero I/O.
//!
//! Connection resilience, switch publishing, heartbeat leasing and display
//! timing are orchestrated here by the [`service::ControlLoop`]. All
//! interaction with hardware and the network happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable without
//! real peripherals.

pub mod events;
pub mod ports;
pub mod service;
