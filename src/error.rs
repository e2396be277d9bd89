//! Unified error types for the Heartlink firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! control loop's error handling uniform. All variants are `Copy` so they
//! can be passed through the retry loops and the event sink without
//! allocation.
//!
//! | Class              | Variants                       | Policy                   |
//! |--------------------|--------------------------------|--------------------------|
//! | Transient transport| `Link`, `Session`              | retried, never fatal     |
//! | Malformed input    | `Payload`                      | discarded and logged     |
//! | Configuration      | `Config`, `Init`               | fatal at boot            |

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The network link (WiFi station) failed.
    Link(LinkError),
    /// The messaging session failed.
    Session(SessionError),
    /// An inbound payload could not be interpreted.
    Payload(PayloadError),
    /// Configuration is invalid or missing.
    Config(&'static str),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl Error {
    /// `true` for faults the control loop retries instead of surfacing.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Link(_) | Self::Session(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Session(e) => write!(f, "session: {e}"),
            Self::Payload(e) => write!(f, "payload: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// No SSID has been configured.
    NoCredentials,
    /// SSID failed validation (1-32 printable ASCII bytes).
    InvalidSsid,
    /// Password failed validation (empty, or 8-64 bytes for WPA2).
    InvalidPassword,
    /// Association with the access point failed.
    AssociationFailed,
    /// Associated, but the interface never received an address.
    NoAddress,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::AssociationFailed => write!(f, "WiFi association failed"),
            Self::NoAddress => write!(f, "no IP address acquired"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// Broker connect (TCP, TLS or MQTT CONNECT) failed.
    ConnectFailed,
    /// Operation needs a live session but there is none.
    NotConnected,
    /// SUBSCRIBE was refused or could not be sent.
    SubscribeFailed,
    /// PUBLISH could not be sent.
    PublishFailed,
    /// Keep-alive probe found the session dead.
    ProbeFailed,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "MQTT connect failed"),
            Self::NotConnected => write!(f, "MQTT session not connected"),
            Self::SubscribeFailed => write!(f, "MQTT subscribe failed"),
            Self::PublishFailed => write!(f, "MQTT publish failed"),
            Self::ProbeFailed => write!(f, "MQTT keep-alive probe failed"),
        }
    }
}

impl From<SessionError> for Error {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

// ---------------------------------------------------------------------------
// Payload errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    /// Payload bytes are not valid UTF-8.
    NotUtf8,
    /// Payload is text but not `true` / `false`.
    Unrecognised,
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotUtf8 => write!(f, "payload is not UTF-8"),
            Self::Unrecognised => write!(f, "payload is not \"true\" or \"false\""),
        }
    }
}

impl From<PayloadError> for Error {
    fn from(e: PayloadError) -> Self {
        Self::Payload(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
