//! Remote heartbeat activation with an auto-expiring lease.
//!
//! The peer keeps our animation running by publishing `"true"` to our
//! topic. Every accepted `"true"` restarts the lease; `"false"` ends it at
//! once; silence for `beat_timeout_ms` ends it from [`HeartbeatWatchdog::check_expiry`].
//!
//! The control loop is the only caller, so the activation needs no locking.

use log::debug;

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, InboundMessage};
use crate::config::Topic;
use crate::error::PayloadError;
use crate::scheduler::{Task, TimerSet};

/// Interpret an inbound payload: exactly `true` or `false`, any letter case.
///
/// No trimming is done; surrounding whitespace makes a payload invalid.
pub fn parse_payload(payload: &[u8]) -> Result<bool, PayloadError> {
    let text = core::str::from_utf8(payload).map_err(|_| PayloadError::NotUtf8)?;
    if text.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if text.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(PayloadError::Unrecognised)
    }
}

/// Owner of the heartbeat activation flag.
///
/// The lease timestamp is the [`Task::BeatTimeout`] entry of the loop's
/// [`TimerSet`].
#[derive(Debug)]
pub struct HeartbeatWatchdog {
    topic: Topic,
    active: bool,
}

impl HeartbeatWatchdog {
    /// `topic` is the node's own inbound topic; anything else is ignored.
    pub fn new(topic: Topic) -> Self {
        Self { topic, active: false }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Apply one inbound message. Rejected payloads leave state untouched.
    ///
    /// Returns the new activation when this message changed it.
    pub fn handle_message(
        &mut self,
        msg: &InboundMessage,
        timers: &mut TimerSet,
        now_ms: u32,
        sink: &mut impl EventSink,
    ) -> Option<bool> {
        if msg.topic.as_str() != self.topic.as_str() {
            debug!("BEAT | ignoring message on {}", msg.topic);
            return None;
        }

        match parse_payload(&msg.payload) {
            Ok(true) => {
                timers.restart(Task::BeatTimeout, now_ms);
                if self.active {
                    debug!("BEAT | lease refreshed");
                    return None;
                }
                self.active = true;
                sink.emit(&AppEvent::HeartbeatChanged { active: true });
                Some(true)
            }
            Ok(false) => {
                if !self.active {
                    return None;
                }
                self.active = false;
                debug!("BEAT | deactivated by peer");
                sink.emit(&AppEvent::HeartbeatChanged { active: false });
                Some(false)
            }
            Err(e) => {
                debug!("BEAT | discarding {} byte payload", msg.payload.len());
                sink.emit(&AppEvent::InvalidPayload(e));
                None
            }
        }
    }

    /// Force-deactivate when the lease has run out. Returns `true` on expiry.
    pub fn check_expiry(&mut self, timers: &TimerSet, now_ms: u32, sink: &mut impl EventSink) -> bool {
        if !self.active || !timers.is_due(Task::BeatTimeout, now_ms) {
            return false;
        }
        self.active = false;
        debug!("BEAT | no true for {} ms", timers.interval_ms(Task::BeatTimeout));
        sink.emit(&AppEvent::HeartbeatExpired);
        sink.emit(&AppEvent::HeartbeatChanged { active: false });
        true
    }
}
