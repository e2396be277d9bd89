//! WiFi station-mode adapter.
//!
//! Implements [`LinkPort`], the hexagonal boundary for the network link.
//! One [`LinkPort::connect`] call is exactly one association attempt; the
//! retry policy belongs to the
//! [`ConnectionManager`](crate::connection::ConnectionManager).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via
//!   `esp_idf_svc::wifi::BlockingWifi`.
//! - **all other targets**: simulation stubs for host-side tests.

use log::{info, warn};

use crate::adapters::utils::is_printable_ascii;
use crate::app::ports::LinkPort;
use crate::error::LinkError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn validate_ssid(ssid: &str) -> Result<(), LinkError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(LinkError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), LinkError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(LinkError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    attempts: u32,
    #[cfg(target_os = "espidf")]
    driver: Option<BlockingWifi<EspWifi<'static>>>,
    /// Simulation: attempts that will fail before one succeeds.
    #[cfg(not(target_os = "espidf"))]
    sim_failures: u32,
    /// Simulation: the AP went away after association.
    #[cfg(not(target_os = "espidf"))]
    sim_dropped: bool,
}

impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            attempts: 0,
            #[cfg(target_os = "espidf")]
            driver: None,
            #[cfg(not(target_os = "espidf"))]
            sim_failures: 0,
            #[cfg(not(target_os = "espidf"))]
            sim_dropped: false,
        }
    }

    /// Hand over the ESP-IDF driver (modem, event loop and NVS bound in `main`).
    #[cfg(target_os = "espidf")]
    pub fn with_driver(mut self, driver: BlockingWifi<EspWifi<'static>>) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    /// Association attempts since boot.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), LinkError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|()| LinkError::InvalidSsid)?;
        self.password.clear();
        self.password.push_str(password).map_err(|()| LinkError::InvalidPassword)?;
        info!("WiFi: credentials set (SSID='{}')", self.ssid);
        Ok(())
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), LinkError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let driver = self.driver.as_mut().ok_or(LinkError::AssociationFailed)?;
        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let conf = Configuration::Client(ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|_| LinkError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| LinkError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });

        driver.set_configuration(&conf).map_err(|e| {
            warn!("WiFi(espidf): set_configuration failed: {}", e);
            LinkError::AssociationFailed
        })?;
        if !driver.is_started().unwrap_or(false) {
            driver.start().map_err(|_| LinkError::AssociationFailed)?;
        }
        // A stale association blocks connect(); ignore "not connected".
        let _ = driver.disconnect();
        driver.connect().map_err(|_| LinkError::AssociationFailed)?;
        driver.wait_netif_up().map_err(|_| LinkError::NoAddress)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), LinkError> {
        if self.sim_failures > 0 {
            self.sim_failures -= 1;
            warn!("WiFi(sim): simulated association failure (attempt {})", self.attempts);
            return Err(LinkError::AssociationFailed);
        }
        self.sim_dropped = false;
        info!("WiFi(sim): associated with '{}' (attempt {})", self.ssid, self.attempts);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.driver
            .as_ref()
            .is_some_and(|d| d.is_connected().unwrap_or(false))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.state == WifiState::Connected && !self.sim_dropped
    }
}

// ── Simulation controls ───────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    /// Make the next `n` association attempts fail.
    pub fn sim_fail_next(&mut self, n: u32) {
        self.sim_failures = n;
    }

    /// Drop the association without telling the control loop.
    pub fn sim_drop(&mut self) {
        self.sim_dropped = true;
    }
}

// ───────────────────────────────────────────────────────────────
// LinkPort
// ───────────────────────────────────────────────────────────────

impl LinkPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), LinkError> {
        if self.ssid.is_empty() {
            return Err(LinkError::NoCredentials);
        }
        self.attempts = self.attempts.wrapping_add(1);
        self.state = WifiState::Connecting;
        info!("WiFi: connecting to '{}'", self.ssid);

        match self.platform_connect() {
            Ok(()) => {
                self.state = WifiState::Connected;
                info!("WiFi: connected");
                Ok(())
            }
            Err(e) => {
                self.state = WifiState::Failed;
                Err(e)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_ssid() {
        let mut a = WifiAdapter::new();
        assert_eq!(a.set_credentials("", "password123"), Err(LinkError::InvalidSsid));
    }

    #[test]
    fn rejects_short_password() {
        let mut a = WifiAdapter::new();
        assert_eq!(a.set_credentials("MyNet", "short"), Err(LinkError::InvalidPassword));
    }

    #[test]
    fn accepts_open_network() {
        let mut a = WifiAdapter::new();
        assert!(a.set_credentials("OpenCafe", "").is_ok());
    }

    #[test]
    fn connect_without_credentials_fails() {
        let mut a = WifiAdapter::new();
        assert_eq!(a.connect(), Err(LinkError::NoCredentials));
        assert_eq!(a.attempts(), 0);
    }

    #[test]
    fn scripted_failures_then_success() {
        let mut a = WifiAdapter::new();
        a.set_credentials("HomeWiFi", "mysecret8").unwrap();
        a.sim_fail_next(2);
        assert_eq!(a.connect(), Err(LinkError::AssociationFailed));
        assert_eq!(a.state(), WifiState::Failed);
        assert!(a.connect().is_err());
        assert!(a.connect().is_ok());
        assert!(a.is_connected());
        assert_eq!(a.attempts(), 3);
    }

    #[test]
    fn dropped_link_reports_down_until_reconnect() {
        let mut a = WifiAdapter::new();
        a.set_credentials("HomeWiFi", "mysecret8").unwrap();
        a.connect().unwrap();
        a.sim_drop();
        assert!(!a.is_connected());
        a.connect().unwrap();
        assert!(a.is_connected());
    }
}
