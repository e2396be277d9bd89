//! Node configuration parameters
//!
//! All tunable parameters for a Heartlink node. The configuration is fixed
//! for the lifetime of the process: on device it is parsed once at boot from
//! JSON embedded at build time.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::adapters::utils::{is_printable_ascii, is_topic_level};
use crate::error::{Error, Result};
use crate::waveform::WaveformParams;

/// Topic suffix shared by both directions of the link.
pub const HEARTBEAT_TOPIC_SUFFIX: &str = "/heartbeat";

/// Longest node identity accepted (`<id>/heartbeat` must fit in 64 bytes).
pub const MAX_NODE_ID_LEN: usize = 24;

/// Fixed-capacity topic string.
pub type Topic = String<64>;

/// Core node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// This node's identity; also the MQTT client id.
    pub self_id: String<32>,
    /// The paired node's identity.
    pub peer_id: String<32>,

    pub wifi: WifiConfig,
    pub broker: BrokerConfig,
    pub timing: TimingConfig,
    pub indicator: IndicatorConfig,
    pub display: DisplayConfig,
    pub waveform: WaveformParams,
    pub features: FeatureConfig,
}

/// WiFi station credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiConfig {
    pub ssid: String<32>,
    pub password: String<64>,
}

/// MQTT broker endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub host: String<64>,
    pub port: u16,
    pub username: String<32>,
    pub password: String<64>,
}

/// Control-loop cadences (milliseconds).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Session liveness probe period.
    pub connection_check_ms: u32,
    /// Switch sampling period.
    pub debounce_ms: u32,
    /// Inbound message poll period.
    pub message_poll_ms: u32,
    /// Republish period for an asserted, unchanged switch.
    pub switch_refresh_ms: u32,
    /// Activation lease: silence for this long expires a heartbeat.
    pub beat_timeout_ms: u32,
    /// Yield per iteration when nothing is being rendered.
    pub idle_pause_ms: u32,
}

/// Status indicator cadences (milliseconds).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Toggle period while retrying the network link.
    pub link_blink_ms: u32,
    /// Blink window between two link connect attempts.
    pub link_retry_ms: u32,
    /// Toggle period while retrying the messaging session.
    pub session_blink_ms: u32,
    /// Blink window between two session connect attempts.
    pub session_retry_ms: u32,
    /// On-time of the success pulse.
    pub confirm_pulse_ms: u32,
}

/// Which heartbeat renderer is fitted to this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// 8×8 multiplexed matrix.
    Matrix,
    /// Single PWM LED.
    PulseLed,
    /// No renderer (switch-only node).
    None,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub mode: DisplayMode,
    /// Frames per second.
    pub refresh_hz: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Sample and publish the presence switch.
    pub switch_input: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            self_id: fixed("luna"),
            peer_id: fixed("dayan"),
            wifi: WifiConfig::default(),
            broker: BrokerConfig::default(),
            timing: TimingConfig::default(),
            indicator: IndicatorConfig::default(),
            display: DisplayConfig::default(),
            waveform: WaveformParams::default(),
            features: FeatureConfig::default(),
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 8883, // MQTT over TLS
            username: String::new(),
            password: String::new(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            connection_check_ms: 5_000,
            debounce_ms: 50,
            message_poll_ms: 10,
            switch_refresh_ms: 15_000,
            beat_timeout_ms: 20_000,
            idle_pause_ms: 5,
        }
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            link_blink_ms: 100,
            link_retry_ms: 1_000,
            session_blink_ms: 500,
            session_retry_ms: 2_000,
            confirm_pulse_ms: 500,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            mode: DisplayMode::Matrix,
            refresh_hz: 100,
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self { switch_input: true }
    }
}

impl NodeConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Err(Error::Config("configuration document is empty"));
        }
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("configuration JSON malformed"))?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every field. Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<()> {
        validate_node_id(&self.self_id, "self_id invalid")?;
        validate_node_id(&self.peer_id, "peer_id invalid")?;
        if self.self_id == self.peer_id {
            return Err(Error::Config("self_id and peer_id must differ"));
        }

        let t = &self.timing;
        if t.debounce_ms == 0 || t.connection_check_ms == 0 || t.message_poll_ms == 0 {
            return Err(Error::Config("timing intervals must be non-zero"));
        }
        if t.switch_refresh_ms <= t.debounce_ms {
            return Err(Error::Config("switch_refresh_ms must exceed debounce_ms"));
        }
        if t.beat_timeout_ms <= t.switch_refresh_ms {
            return Err(Error::Config("beat_timeout_ms must exceed switch_refresh_ms"));
        }

        let ind = &self.indicator;
        if ind.link_blink_ms == 0 || ind.session_blink_ms == 0 {
            return Err(Error::Config("indicator blink periods must be non-zero"));
        }
        if ind.link_blink_ms >= ind.session_blink_ms {
            return Err(Error::Config("link cadence must be faster than session cadence"));
        }
        if ind.link_retry_ms < ind.link_blink_ms || ind.session_retry_ms < ind.session_blink_ms {
            return Err(Error::Config("retry windows must cover at least one blink"));
        }

        if !(10..=1000).contains(&self.display.refresh_hz) {
            return Err(Error::Config("display.refresh_hz must be 10-1000"));
        }

        self.waveform.validate()
    }

    /// Validate the parts only the device build needs (credentials, broker).
    pub fn validate_network(&self) -> Result<()> {
        if self.wifi.ssid.is_empty() || !is_printable_ascii(&self.wifi.ssid) {
            return Err(Error::Config("wifi.ssid invalid"));
        }
        let pw = self.wifi.password.len();
        if pw != 0 && !(8..=64).contains(&pw) {
            return Err(Error::Config("wifi.password must be empty or 8-64 bytes"));
        }
        if self.broker.host.is_empty() || !is_printable_ascii(&self.broker.host) {
            return Err(Error::Config("broker.host invalid"));
        }
        if self.broker.port == 0 {
            return Err(Error::Config("broker.port invalid"));
        }
        Ok(())
    }

    /// Topic this node subscribes to: `<self_id>/heartbeat`.
    pub fn subscribe_topic(&self) -> Topic {
        heartbeat_topic(&self.self_id)
    }

    /// Topic this node publishes switch state to: `<peer_id>/heartbeat`.
    pub fn publish_topic(&self) -> Topic {
        heartbeat_topic(&self.peer_id)
    }
}

fn heartbeat_topic(id: &str) -> Topic {
    let mut topic = Topic::new();
    // Both pushes fit: ids are capped at MAX_NODE_ID_LEN by validation.
    let _ = topic.push_str(id);
    let _ = topic.push_str(HEARTBEAT_TOPIC_SUFFIX);
    topic
}

fn validate_node_id(id: &str, reason: &'static str) -> Result<()> {
    if id.len() > MAX_NODE_ID_LEN || !is_topic_level(id) {
        return Err(Error::Config(reason));
    }
    Ok(())
}

fn fixed<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    let _ = out.push_str(s);
    out
}
