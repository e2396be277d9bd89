//! MQTT session adapter.
//!
//! Implements [`SessionPort`] over a TLS MQTT connection to the broker.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`
//!   with the CA certificate embedded at build time. The client runs on its
//!   own task; its callback tracks the connected flag and pushes publishes
//!   into the shared [`Inbox`].
//! - **all other targets**: an in-process loopback for host-side tests,
//!   with injectable inbound messages and scripted failures.
//!
//! ## QoS
//!
//! Subscribe at QoS 1 so a heartbeat command survives a broker hiccup;
//! publish switch state at QoS 0 since the refresh republishes it anyway.

use core::fmt::Write as _;
use std::sync::Arc;

use heapless::String;
use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::adapters::inbox::Inbox;
use crate::app::ports::{InboundMessage, SessionPort};
use crate::config::NodeConfig;
use crate::error::SessionError;

/// Keep-alive negotiated with the broker.
pub const KEEP_ALIVE_SECS: u64 = 30;
/// How long one connect attempt waits for CONNACK.
pub const CONNECT_TIMEOUT_MS: u32 = 10_000;

/// Broker endpoint and credentials, copied out of [`NodeConfig`].
#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub url: String<96>,
    pub client_id: String<32>,
    pub username: String<32>,
    pub password: String<64>,
    /// NUL-terminated PEM CA certificate.
    pub ca_pem: &'static str,
}

impl MqttSettings {
    /// `mqtts://<host>:<port>`, client id = the node's own id.
    pub fn from_config(config: &NodeConfig, ca_pem: &'static str) -> Self {
        let mut url = String::new();
        // Fits: host is at most 64 bytes.
        let _ = write!(url, "mqtts://{}:{}", config.broker.host, config.broker.port);
        Self {
            url,
            client_id: config.self_id.clone(),
            username: config.broker.username.clone(),
            password: config.broker.password.clone(),
            ca_pem,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// MQTT adapter
// ───────────────────────────────────────────────────────────────

pub struct MqttAdapter {
    settings: MqttSettings,
    inbox: Arc<Inbox>,
    #[cfg(target_os = "espidf")]
    client: Option<esp_idf_svc::mqtt::client::EspMqttClient<'static>>,
    #[cfg(target_os = "espidf")]
    connected: Arc<core::sync::atomic::AtomicBool>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimBroker,
}

/// Host-side loopback state.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct SimBroker {
    pub connected: bool,
    /// Connect attempts that will fail before one succeeds.
    pub connect_failures: u32,
    /// Subscribe calls that will fail before one succeeds.
    pub subscribe_failures: u32,
    pub connect_calls: u32,
    pub subscriptions: std::vec::Vec<std::string::String>,
    pub published: std::vec::Vec<(std::string::String, std::vec::Vec<u8>)>,
}

impl MqttAdapter {
    pub fn new(settings: MqttSettings, inbox: Arc<Inbox>) -> Self {
        Self {
            settings,
            inbox,
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(target_os = "espidf")]
            connected: Arc::new(core::sync::atomic::AtomicBool::new(false)),
            #[cfg(not(target_os = "espidf"))]
            sim: SimBroker::default(),
        }
    }

    pub fn settings(&self) -> &MqttSettings {
        &self.settings
    }

    /// Messages lost to a full inbox since boot.
    pub fn dropped_messages(&self) -> u32 {
        self.inbox.dropped()
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), SessionError> {
        use core::sync::atomic::Ordering;
        use esp_idf_hal::delay::FreeRtos;
        use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration};
        use esp_idf_svc::tls::X509;

        // Tear down any previous client; esp-mqtt would otherwise keep
        // reconnecting it behind our back.
        self.client = None;
        self.connected.store(false, Ordering::Release);

        let conf = MqttClientConfiguration {
            client_id: Some(self.settings.client_id.as_str()),
            username: Some(self.settings.username.as_str()),
            password: Some(self.settings.password.as_str()),
            keep_alive_interval: Some(core::time::Duration::from_secs(KEEP_ALIVE_SECS)),
            server_certificate: Some(X509::pem_until_nul(self.settings.ca_pem.as_bytes())),
            ..Default::default()
        };

        let connected = Arc::clone(&self.connected);
        let inbox = Arc::clone(&self.inbox);
        let client = EspMqttClient::new_cb(&self.settings.url, &conf, move |event| {
            match event.payload() {
                EventPayload::Connected(_) => connected.store(true, Ordering::Release),
                EventPayload::Disconnected => connected.store(false, Ordering::Release),
                EventPayload::Received { topic, data, .. } => {
                    // Chunked deliveries carry no topic; commands never chunk.
                    if let Some(topic) = topic {
                        inbox.push(InboundMessage::new(topic, data));
                    }
                }
                _ => {}
            }
        })
        .map_err(|e| {
            warn!("MQTT(espidf): client create failed: {}", e);
            SessionError::ConnectFailed
        })?;
        self.client = Some(client);

        let mut waited = 0;
        while !self.connected.load(Ordering::Acquire) {
            if waited >= CONNECT_TIMEOUT_MS {
                self.client = None;
                return Err(SessionError::ConnectFailed);
            }
            FreeRtos::delay_ms(50);
            waited += 50;
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), SessionError> {
        self.sim.connect_calls = self.sim.connect_calls.wrapping_add(1);
        if self.sim.connect_failures > 0 {
            self.sim.connect_failures -= 1;
            self.sim.connected = false;
            return Err(SessionError::ConnectFailed);
        }
        self.sim.connected = true;
        self.sim.subscriptions.clear();
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.client.is_some() && self.connected.load(core::sync::atomic::Ordering::Acquire)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim.connected
    }

    #[cfg(target_os = "espidf")]
    fn platform_subscribe(&mut self, topic: &str) -> Result<(), SessionError> {
        use esp_idf_svc::mqtt::client::QoS;
        let client = self.client.as_mut().ok_or(SessionError::NotConnected)?;
        client
            .subscribe(topic, QoS::AtLeastOnce)
            .map(|_| ())
            .map_err(|_| SessionError::SubscribeFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_subscribe(&mut self, topic: &str) -> Result<(), SessionError> {
        if self.sim.subscribe_failures > 0 {
            self.sim.subscribe_failures -= 1;
            return Err(SessionError::SubscribeFailed);
        }
        self.sim.subscriptions.push(topic.into());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError> {
        use esp_idf_svc::mqtt::client::QoS;
        let client = self.client.as_mut().ok_or(SessionError::NotConnected)?;
        client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .map(|_| ())
            .map_err(|_| SessionError::PublishFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError> {
        self.sim.published.push((topic.into(), payload.to_vec()));
        Ok(())
    }
}

// ── Simulation controls ───────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    pub fn sim(&mut self) -> &mut SimBroker {
        &mut self.sim
    }

    /// Deliver an inbound publish as the client task would.
    pub fn inject(&self, topic: &str, payload: &[u8]) -> bool {
        self.inbox.push(InboundMessage::new(topic, payload))
    }

    /// Kill the session without telling the control loop.
    pub fn drop_session(&mut self) {
        self.sim.connected = false;
    }
}

// ───────────────────────────────────────────────────────────────
// SessionPort
// ───────────────────────────────────────────────────────────────

impl SessionPort for MqttAdapter {
    fn connect(&mut self) -> Result<(), SessionError> {
        info!("MQTT: connecting to {} as '{}'", self.settings.url, self.settings.client_id);
        self.platform_connect()?;
        // Anything queued belongs to the old session.
        self.inbox.clear();
        info!("MQTT: connected");
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), SessionError> {
        if !self.platform_is_connected() {
            return Err(SessionError::NotConnected);
        }
        self.platform_subscribe(topic)?;
        info!("MQTT: subscribed to {}", topic);
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), SessionError> {
        if !self.platform_is_connected() {
            return Err(SessionError::NotConnected);
        }
        self.platform_publish(topic, payload)
    }

    fn poll(&mut self) -> Result<Option<InboundMessage>, SessionError> {
        Ok(self.inbox.try_take())
    }

    fn ping(&mut self) -> Result<(), SessionError> {
        if self.platform_is_connected() {
            Ok(())
        } else {
            Err(SessionError::ProbeFailed)
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
