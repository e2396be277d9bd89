//! Heartlink firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod connection;
pub mod display;
pub mod error;
pub mod heartbeat;
pub mod publisher;
pub mod scheduler;
pub mod waveform;

pub mod pins;

// Adapters and drivers compile on host too; their hardware paths are
// replaced by simulation stubs there.
pub mod adapters;
pub mod drivers;
