//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production) as one tagged line
//! per event. Per-message noise goes out at `debug`.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink {
    overruns: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => info!("START | control loop running"),

            AppEvent::LinkAttempt { attempt } => debug!("LINK | attempt {}", attempt),
            AppEvent::LinkFailed { attempt, error } => {
                warn!("LINK | attempt {} failed: {}", attempt, error);
            }
            AppEvent::LinkUp { attempts } => info!("LINK | up (attempts={})", attempts),
            AppEvent::SessionAttempt { attempt } => debug!("SESSION | attempt {}", attempt),
            AppEvent::SessionFailed { attempt, error } => {
                warn!("SESSION | attempt {} failed: {}", attempt, error);
            }
            AppEvent::SessionUp { attempts } => info!("SESSION | up (attempts={})", attempts),
            AppEvent::ConnectionLost { link_up } => {
                warn!("SESSION | lost (link {})", if *link_up { "up" } else { "down" });
            }

            AppEvent::SwitchPublished { asserted, refresh } => {
                debug!("SWITCH | published {} (refresh={})", asserted, refresh);
            }
            AppEvent::SwitchPublishFailed { asserted, error } => {
                warn!("SWITCH | publish {} failed: {}", asserted, error);
            }

            AppEvent::HeartbeatChanged { active } => {
                info!("BEAT | {}", if *active { "active" } else { "inactive" });
            }
            AppEvent::HeartbeatExpired => info!("BEAT | lease expired"),
            AppEvent::InvalidPayload(e) => warn!("BEAT | invalid payload: {}", e),
            AppEvent::PollFailed(e) => warn!("SESSION | poll failed: {}", e),

            AppEvent::FrameOverrun { frame_us, budget_us } => {
                self.overruns = self.overruns.wrapping_add(1);
                // Rate-limited: a stalled frame tends to repeat.
                if self.overruns.is_power_of_two() {
                    warn!(
                        "DISPLAY | frame {} us > budget {} us (overruns={})",
                        frame_us, budget_us, self.overruns
                    );
                }
            }
        }
    }
}
