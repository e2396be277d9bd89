//! Control loop: the hexagonal core.
//!
//! [`ControlLoop`] owns every piece of domain state (timers, connection
//! manager, switch publisher, heartbeat watchdog, display driver). All I/O
//! flows through port traits injected at call sites, so the whole loop is
//! testable with mock adapters.
//!
//! ```text
//!   LinkPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//! SessionPort ◀─▶│          ControlLoop          │
//!                │ connection · switch · beat ·  │
//!  Board I/O ◀──▶│ display                       │ ◀── Clock
//!                └──────────────────────────────┘
//! ```
//!
//! One iteration evaluates, in this fixed order: connection check, switch
//! debounce/publish, watchdog expiry, message poll, display frame. Only the
//! display frame and connection recovery take real time; everything else is
//! gated by the [`TimerSet`]. Every deactivation rewinds the display at the
//! step that caused it, so a `true` later in the same iteration restarts
//! the animation from its first beat.

use log::{debug, info};

use crate::config::NodeConfig;
use crate::connection::ConnectionManager;
use crate::display::{DisplayDriver, FrameOutcome};
use crate::heartbeat::HeartbeatWatchdog;
use crate::publisher::SwitchPublisher;
use crate::scheduler::{Task, TimerSet};

use super::events::AppEvent;
use super::ports::{Clock, DisplayPort, EventSink, IndicatorPort, LinkPort, SessionPort, SwitchPort};

// ───────────────────────────────────────────────────────────────
// ControlLoop
// ───────────────────────────────────────────────────────────────

pub struct ControlLoop {
    timers: TimerSet,
    connection: ConnectionManager,
    publisher: Option<SwitchPublisher>,
    watchdog: HeartbeatWatchdog,
    display: DisplayDriver,
    timing: crate::config::TimingConfig,
    iterations: u64,
    started: bool,
}

impl ControlLoop {
    /// Build the loop from a validated configuration.
    ///
    /// Does **not** touch the network; call [`start`](Self::start) next.
    pub fn new(config: &NodeConfig) -> Self {
        let publisher = config
            .features
            .switch_input
            .then(|| SwitchPublisher::new(config.publish_topic()));
        Self {
            timers: TimerSet::new(&config.timing, 0),
            connection: ConnectionManager::new(config.indicator, config.subscribe_topic()),
            publisher,
            watchdog: HeartbeatWatchdog::new(config.subscribe_topic()),
            display: DisplayDriver::new(&config.display, config.waveform),
            timing: config.timing,
            iterations: 0,
            started: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring both layers up (blocking), then arm every timer from now.
    pub fn start(
        &mut self,
        link: &mut impl LinkPort,
        session: &mut impl SessionPort,
        hw: &mut (impl IndicatorPort + DisplayPort),
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) {
        hw.set_indicator(false);
        self.display.blank(hw);

        self.connection.ensure_link_up(link, hw, clock, sink);
        self.connection.ensure_session_up(link, session, hw, clock, sink);

        self.timers = TimerSet::new(&self.timing, clock.now_ms());
        self.started = true;
        info!(
            "ControlLoop started (display={:?}, switch={})",
            self.display.mode(),
            self.publisher.is_some()
        );
        sink.emit(&AppEvent::Started);
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// Run one full iteration.
    ///
    /// The `hw` parameter satisfies every board port at once, which avoids
    /// a double mutable borrow while keeping the port boundary explicit.
    pub fn run_iteration(
        &mut self,
        link: &mut impl LinkPort,
        session: &mut impl SessionPort,
        hw: &mut (impl IndicatorPort + SwitchPort + DisplayPort),
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) -> FrameOutcome {
        self.iterations = self.iterations.wrapping_add(1);

        // 1. Connection liveness (blocks while recovering, display dark)
        if self.timers.fire_if_due(Task::ConnectionCheck, clock.now_ms()) {
            if let Some(link_up) = self.connection.lost_layer(link, session) {
                self.display.blank(hw);
                self.connection.recover(link_up, link, session, hw, clock, sink);
            }
        }

        // 2. Switch debounce / publish
        let now = clock.now_ms();
        if let Some(publisher) = self.publisher.as_mut() {
            if self.timers.fire_if_due(Task::SwitchDebounce, now) {
                let raw = hw.read_switch();
                publisher.on_debounce_tick(raw, session, &mut self.timers, now, sink);
            }
        }

        // 3. Watchdog expiry
        if self.watchdog.check_expiry(&self.timers, now, sink) {
            self.display.rewind(hw);
        }

        // 4. Message poll (at most one message per tick)
        if self.timers.fire_if_due(Task::MessagePoll, now) {
            match session.poll() {
                Ok(Some(msg)) => {
                    debug!("SESSION | inbound on {} ({} bytes)", msg.topic, msg.payload.len());
                    if self.watchdog.handle_message(&msg, &mut self.timers, now, sink) == Some(false) {
                        self.display.rewind(hw);
                    }
                }
                Ok(None) => {}
                Err(e) => sink.emit(&AppEvent::PollFailed(e)),
            }
        }

        // 5. Display frame
        let outcome = self.display.render(self.watchdog.is_active(), hw, clock, sink);
        if outcome == FrameOutcome::Idle {
            clock.delay_ms(self.timing.idle_pause_ms);
        }
        outcome
    }

    /// Leave the display dark and release its timer. The loop must not be
    /// iterated afterwards.
    pub fn shutdown(&mut self, hw: &mut (impl IndicatorPort + DisplayPort)) {
        self.display.shutdown(hw);
        hw.set_indicator(false);
        self.started = false;
        info!("ControlLoop shut down after {} iterations", self.iterations);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Current remote heartbeat activation.
    pub fn heartbeat_active(&self) -> bool {
        self.watchdog.is_active()
    }

    /// Committed switch state (`None` on receive-only nodes).
    pub fn switch_state(&self) -> Option<bool> {
        self.publisher.as_ref().map(SwitchPublisher::state)
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn display(&self) -> &DisplayDriver {
        &self.display
    }

    pub fn timers(&self) -> &TimerSet {
        &self.timers
    }

    /// Iterations executed since construction.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }
}
