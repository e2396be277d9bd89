//! Bounded hand-off from the MQTT client task to the control loop.
//!
//! The MQTT client delivers publishes on its own FreeRTOS task. Its callback
//! only copies the message into this channel; the control loop drains it
//! one message per poll tick, so it stays the sole mutator of domain state.
//!
//! ```text
//! ┌──────────────┐  InboundMessage  ┌──────────────┐
//! │ MQTT task    │─────────────────▶│ Control loop │
//! │ (callback)   │   depth 8, drop  │ (poll tick)  │
//! └──────────────┘   when full      └──────────────┘
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::app::ports::InboundMessage;

/// Messages buffered between two poll ticks.
pub const INBOX_DEPTH: usize = 8;

pub struct Inbox {
    channel: Channel<CriticalSectionRawMutex, InboundMessage, INBOX_DEPTH>,
    dropped: AtomicU32,
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Inbox {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Enqueue without blocking. Returns `false` (and counts a drop) when full.
    pub fn push(&self, msg: InboundMessage) -> bool {
        if self.channel.try_send(msg).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Oldest pending message, if any.
    pub fn try_take(&self) -> Option<InboundMessage> {
        self.channel.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Discard everything pending (stale messages from a dead session).
    pub fn clear(&self) {
        self.channel.clear();
    }

    /// Messages lost to a full inbox since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}
