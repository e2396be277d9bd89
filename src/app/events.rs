//! Outbound application events.
//!
//! The [`ControlLoop`](super::service::ControlLoop) and the components it
//! owns emit these through the [`EventSink`](super::ports::EventSink) port.
//! Adapters on the other side decide what to do with them.

use crate::error::{LinkError, PayloadError, SessionError};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// The control loop finished bring-up and entered steady state.
    Started,

    // ── Connectivity ─────────────────────────────────────────
    /// A link connect attempt is starting (`attempt` counts from 1).
    LinkAttempt { attempt: u32 },
    /// A link connect attempt failed.
    LinkFailed { attempt: u32, error: LinkError },
    /// The link is up after `attempts` tries.
    LinkUp { attempts: u32 },
    /// A session connect attempt is starting.
    SessionAttempt { attempt: u32 },
    /// A session connect (or its subscribe) failed.
    SessionFailed { attempt: u32, error: SessionError },
    /// The session is up and subscribed.
    SessionUp { attempts: u32 },
    /// The periodic liveness check found a layer down.
    ConnectionLost { link_up: bool },

    // ── Switch ───────────────────────────────────────────────
    /// A switch state was published (`refresh` = periodic republish).
    SwitchPublished { asserted: bool, refresh: bool },
    /// A switch publish failed; it is retried on the next debounce tick.
    SwitchPublishFailed { asserted: bool, error: SessionError },

    // ── Heartbeat ────────────────────────────────────────────
    /// Remote activation changed.
    HeartbeatChanged { active: bool },
    /// The activation lease ran out without a refresh.
    HeartbeatExpired,
    /// An inbound payload was rejected.
    InvalidPayload(PayloadError),
    /// Polling the session for inbound messages failed.
    PollFailed(SessionError),

    // ── Display ──────────────────────────────────────────────
    /// A frame took longer than its budget.
    FrameOverrun { frame_us: u32, budget_us: u32 },
}
