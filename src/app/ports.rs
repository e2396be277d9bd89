//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlLoop (domain)
//! ```
//!
//! Driven adapters (WiFi, MQTT, GPIO/LEDC, clock, event sinks) implement
//! these traits. The [`ControlLoop`](super::service::ControlLoop) and the
//! components it owns consume them via generics injected at call sites, so
//! the domain core never touches hardware directly.
//!
//! Transport ports return the specific sub-enum of [`crate::error::Error`];
//! retry policy lives in the domain, never in the adapter.

use heapless::{String, Vec};

use crate::error::{LinkError, SessionError};

/// Longest topic an inbound message may carry.
pub const MAX_TOPIC_LEN: usize = 64;
/// Longest inbound payload kept. Valid commands are at most 5 bytes.
pub const MAX_PAYLOAD_LEN: usize = 32;

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source plus a cooperative delay.
pub trait Clock {
    /// Microseconds since boot. Drives the display's spin-waits.
    fn now_us(&self) -> u64;

    /// Milliseconds since boot, truncated to `u32` (wraps after ~49.7 days).
    fn now_ms(&self) -> u32 {
        (self.now_us() / 1_000) as u32
    }

    /// Block the calling task for at least `ms` milliseconds.
    fn delay_ms(&self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Network link port (driven adapter: WiFi station)
// ───────────────────────────────────────────────────────────────

/// The underlying wireless link.
pub trait LinkPort {
    /// One connection attempt. Blocks until associated with an address or
    /// the attempt fails.
    fn connect(&mut self) -> Result<(), LinkError>;

    /// Whether the link currently reports itself up.
    fn is_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Messaging session port (driven adapter: MQTT client)
// ───────────────────────────────────────────────────────────────

/// One inbound publish, copied out of the client's buffers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InboundMessage {
    pub topic: String<MAX_TOPIC_LEN>,
    pub payload: Vec<u8, MAX_PAYLOAD_LEN>,
}

impl InboundMessage {
    /// Build a message, truncating fields that exceed capacity.
    pub fn new(topic: &str, payload: &[u8]) -> Self {
        let mut t = String::new();
        for ch in topic.chars() {
            if t.push(ch).is_err() {
                break;
            }
        }
        let take = payload.len().min(MAX_PAYLOAD_LEN);
        let mut p = Vec::new();
        // Cannot fail: `take` is within capacity.
        let _ = p.extend_from_slice(&payload[..take]);
        Self { topic: t, payload: p }
    }
}

/// The authenticated publish/subscribe session running over the link.
pub trait SessionPort {
    /// One connection attempt (TCP, TLS, MQTT CONNECT).
    fn connect(&mut self) -> Result<(), SessionError>;

    /// Subscribe to `topic` on the current session.
    fn subscribe(&mut self, topic: &str) -> Result<(), SessionError>;

    /// Publish `payload` to `topic`.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError>;

    /// Non-blocking: at most one pending inbound message.
    fn poll(&mut self) -> Result<Option<InboundMessage>, SessionError>;

    /// Idempotent liveness probe. Fails if the session is dead.
    fn ping(&mut self) -> Result<(), SessionError>;
}

// ───────────────────────────────────────────────────────────────
// Physical I/O ports (driven adapters: GPIO / LEDC)
// ───────────────────────────────────────────────────────────────

/// Connectivity indicator LED.
pub trait IndicatorPort {
    fn set_indicator(&mut self, on: bool);
}

/// Raw (undebounced) presence switch.
pub trait SwitchPort {
    /// `true` when the switch is asserted (input HIGH).
    fn read_switch(&mut self) -> bool;
}

/// 8×8 multiplexed matrix: active-high column latches, active-low PWM rows.
pub trait MatrixPort {
    /// Drive all eight column lines at once; bit `n` = column `n`.
    fn set_columns(&mut self, bits: u8);

    /// Set the PWM duty of one row. `DUTY_MAX` = row dark.
    fn set_row_duty(&mut self, row: usize, duty: u16);

    /// Every row dark, every column low.
    fn all_off(&mut self);
}

/// Single active-high PWM heartbeat LED.
pub trait PulseLedPort {
    fn set_pulse_duty(&mut self, duty: u16);
}

/// Everything the display driver may touch. Both renderers share one
/// LEDC timer, released once at shutdown.
pub trait DisplayPort: MatrixPort + PulseLedPort {
    /// Stop every display PWM channel and release the timer.
    fn release(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
