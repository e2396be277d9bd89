//! Connection resilience for the two network layers.
//!
//! ```text
//!             connect() fails                 connect() + subscribe() ok
//!   ┌────────────┐  blink window  ┌────────────┐          ┌───────────┐
//!   │Disconnected│───────────────▶│ Connecting │─────────▶│ Connected │
//!   └────────────┘◀───────────────└────────────┘          └───────────┘
//!         ▲             retry                                  │
//!         └──────────── check_connections(): probe failed ─────┘
//! ```
//!
//! Both `ensure_*` calls block until their layer is up; there is no backoff
//! and no attempt limit. While retrying, the status indicator toggles fast
//! for the link and slowly for the session. A successful recovery ends with
//! one confirmation pulse. A layer that is already up is left alone.

use log::debug;

use crate::app::events::AppEvent;
use crate::app::ports::{Clock, EventSink, IndicatorPort, LinkPort, SessionPort};
use crate::config::{IndicatorConfig, Topic};

/// Lifecycle of one network layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

/// Owner of both [`LinkState`]s. Nothing else mutates them.
#[derive(Debug)]
pub struct ConnectionManager {
    indicator: IndicatorConfig,
    subscribe_topic: Topic,
    link: LinkState,
    session: LinkState,
    recoveries: u32,
}

impl ConnectionManager {
    /// `subscribe_topic` is re-subscribed on every new session.
    pub fn new(indicator: IndicatorConfig, subscribe_topic: Topic) -> Self {
        Self {
            indicator,
            subscribe_topic,
            link: LinkState::Disconnected,
            session: LinkState::Disconnected,
            recoveries: 0,
        }
    }

    pub fn link_state(&self) -> LinkState {
        self.link
    }

    pub fn session_state(&self) -> LinkState {
        self.session
    }

    /// Times `check_connections` found a layer down since boot.
    pub fn recoveries(&self) -> u32 {
        self.recoveries
    }

    /// Block until the link is up. Returns the number of connect attempts
    /// made (0 if it was already up).
    pub fn ensure_link_up(
        &mut self,
        link: &mut impl LinkPort,
        hw: &mut impl IndicatorPort,
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) -> u32 {
        if self.link == LinkState::Connected && link.is_connected() {
            return 0;
        }
        // A new link always needs a new session.
        self.session = LinkState::Disconnected;

        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            self.link = LinkState::Connecting;
            sink.emit(&AppEvent::LinkAttempt { attempt });

            match link.connect() {
                Ok(()) => {
                    self.link = LinkState::Connected;
                    sink.emit(&AppEvent::LinkUp { attempts: attempt });
                    self.confirm_pulse(hw, clock);
                    return attempt;
                }
                Err(error) => {
                    sink.emit(&AppEvent::LinkFailed { attempt, error });
                    self.blink(hw, clock, self.indicator.link_blink_ms, self.indicator.link_retry_ms);
                }
            }
        }
    }

    /// Block until the session is connected and subscribed. Re-establishes
    /// the link first whenever it drops mid-retry. Returns the number of
    /// session connect attempts (0 if it was already up).
    pub fn ensure_session_up(
        &mut self,
        link: &mut impl LinkPort,
        session: &mut impl SessionPort,
        hw: &mut impl IndicatorPort,
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) -> u32 {
        if self.session == LinkState::Connected {
            return 0;
        }

        let mut attempt: u32 = 0;
        loop {
            if !link.is_connected() {
                self.link = LinkState::Disconnected;
                self.ensure_link_up(link, hw, clock, sink);
            }

            attempt = attempt.saturating_add(1);
            self.session = LinkState::Connecting;
            sink.emit(&AppEvent::SessionAttempt { attempt });

            let result = session
                .connect()
                .and_then(|()| session.subscribe(&self.subscribe_topic));
            match result {
                Ok(()) => {
                    self.session = LinkState::Connected;
                    debug!("SESSION | subscribed to {}", self.subscribe_topic);
                    sink.emit(&AppEvent::SessionUp { attempts: attempt });
                    self.confirm_pulse(hw, clock);
                    return attempt;
                }
                Err(error) => {
                    sink.emit(&AppEvent::SessionFailed { attempt, error });
                    self.blink(
                        hw,
                        clock,
                        self.indicator.session_blink_ms,
                        self.indicator.session_retry_ms,
                    );
                }
            }
        }
    }

    /// Probe both layers and recover whichever is down. Returns `true` when
    /// everything was already healthy.
    pub fn check_connections(
        &mut self,
        link: &mut impl LinkPort,
        session: &mut impl SessionPort,
        hw: &mut impl IndicatorPort,
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) -> bool {
        match self.lost_layer(link, session) {
            None => true,
            Some(link_up) => {
                self.recover(link_up, link, session, hw, clock, sink);
                false
            }
        }
    }

    /// Non-blocking health check. Returns `None` when both layers are up,
    /// otherwise `Some(link_up)`.
    pub fn lost_layer(&self, link: &mut impl LinkPort, session: &mut impl SessionPort) -> Option<bool> {
        if !link.is_connected() {
            debug!("LINK | down");
            return Some(false);
        }
        match session.ping() {
            Ok(()) => None,
            Err(e) => {
                debug!("SESSION | liveness probe failed: {}", e);
                Some(true)
            }
        }
    }

    /// Block until both layers are back after [`lost_layer`](Self::lost_layer)
    /// reported a loss.
    pub fn recover(
        &mut self,
        link_up: bool,
        link: &mut impl LinkPort,
        session: &mut impl SessionPort,
        hw: &mut impl IndicatorPort,
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) {
        sink.emit(&AppEvent::ConnectionLost { link_up });
        self.recoveries = self.recoveries.wrapping_add(1);

        if !link_up {
            self.link = LinkState::Disconnected;
        }
        self.session = LinkState::Disconnected;

        self.ensure_link_up(link, hw, clock, sink);
        self.ensure_session_up(link, session, hw, clock, sink);
    }

    // ── Indicator ─────────────────────────────────────────────

    /// Toggle every `period_ms` for `window_ms`, then force off.
    fn blink(&self, hw: &mut impl IndicatorPort, clock: &impl Clock, period_ms: u32, window_ms: u32) {
        let toggles = window_ms / period_ms.max(1);
        let mut on = false;
        for _ in 0..toggles {
            on = !on;
            hw.set_indicator(on);
            clock.delay_ms(period_ms);
        }
        hw.set_indicator(false);
    }

    fn confirm_pulse(&self, hw: &mut impl IndicatorPort, clock: &impl Clock) {
        hw.set_indicator(true);
        clock.delay_ms(self.indicator.confirm_pulse_ms);
        hw.set_indicator(false);
    }
}
