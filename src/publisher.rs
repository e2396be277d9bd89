//! Debounced presence-switch publisher.
//!
//! Sampled once per debounce tick by the control loop:
//!
//! - a reading is *settled* once two consecutive ticks agree;
//! - a settled reading that differs from the committed state is published
//!   (edge);
//! - an asserted, unchanged state is republished every refresh interval so
//!   the peer's lease never runs out while the switch is held;
//! - a deasserted state is never refreshed.
//!
//! State is committed only after the publish succeeds, so a failed publish
//! is retried naturally on the next tick.

use log::{debug, info};

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, SessionPort};
use crate::config::Topic;
use crate::scheduler::{Task, TimerSet};

/// Wire form of a switch state.
pub const fn payload_for(asserted: bool) -> &'static [u8] {
    if asserted { b"true" } else { b"false" }
}

/// What a debounce tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to publish.
    Idle,
    /// A settled change was published.
    Edge(bool),
    /// The asserted state was republished.
    Refresh,
    /// A publish was attempted and failed.
    Failed,
}

/// Owner of the debounced `SwitchState`.
#[derive(Debug)]
pub struct SwitchPublisher {
    topic: Topic,
    /// Last committed (published) state.
    state: bool,
    /// Raw reading from the previous tick.
    last_sample: Option<bool>,
}

impl SwitchPublisher {
    /// `topic` is the peer's inbound topic.
    pub fn new(topic: Topic) -> Self {
        Self {
            topic,
            state: false,
            last_sample: None,
        }
    }

    /// Committed switch state.
    pub fn state(&self) -> bool {
        self.state
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Run one debounce tick with the raw reading `raw`.
    pub fn on_debounce_tick(
        &mut self,
        raw: bool,
        session: &mut impl SessionPort,
        timers: &mut TimerSet,
        now_ms: u32,
        sink: &mut impl EventSink,
    ) -> TickOutcome {
        let settled = self.last_sample == Some(raw);
        self.last_sample = Some(raw);

        if settled && raw != self.state {
            if !self.publish(raw, false, session, sink) {
                return TickOutcome::Failed;
            }
            self.state = raw;
            timers.restart(Task::SwitchRefresh, now_ms);
            info!("SWITCH | {}", if raw { "asserted" } else { "released" });
            return TickOutcome::Edge(raw);
        }

        if self.state && timers.is_due(Task::SwitchRefresh, now_ms) {
            if !self.publish(true, true, session, sink) {
                return TickOutcome::Failed;
            }
            timers.restart(Task::SwitchRefresh, now_ms);
            return TickOutcome::Refresh;
        }

        TickOutcome::Idle
    }

    fn publish(
        &self,
        asserted: bool,
        refresh: bool,
        session: &mut impl SessionPort,
        sink: &mut impl EventSink,
    ) -> bool {
        match session.publish(&self.topic, payload_for(asserted)) {
            Ok(()) => {
                debug!("SWITCH | published {} to {}", asserted, self.topic);
                sink.emit(&AppEvent::SwitchPublished { asserted, refresh });
                true
            }
            Err(error) => {
                sink.emit(&AppEvent::SwitchPublishFailed { asserted, error });
                false
            }
        }
    }
}
