//! Heartlink Firmware: Main Entry Point
//!
//! Hexagonal architecture around a single-threaded control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter     LogEventSink   Esp32TimeAdapter           │
//! │  (Indicator+Switch   (EventSink)    (Clock)                    │
//! │   +Display)                                                    │
//! │  WifiAdapter         MqttAdapter ◀── Inbox ◀── MQTT task       │
//! │  (LinkPort)          (SessionPort)                             │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              ControlLoop (pure logic)                  │    │
//! │  │  Connection · Switch publisher · Watchdog · Display    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{PinDriver, Pull};
use esp_idf_hal::prelude::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{error, info};

use heartlink::adapters::hardware::HardwareAdapter;
use heartlink::adapters::inbox::Inbox;
use heartlink::adapters::log_sink::LogEventSink;
use heartlink::adapters::mqtt::{MqttAdapter, MqttSettings};
use heartlink::adapters::time::Esp32TimeAdapter;
use heartlink::adapters::wifi::WifiAdapter;
use heartlink::app::service::ControlLoop;
use heartlink::config::NodeConfig;
use heartlink::drivers::hw_init;
use heartlink::drivers::status_led::StatusLed;
use heartlink::drivers::switch_input::SwitchInput;
use heartlink::drivers::task_pin::{spawn_on_core, Core};

/// Node configuration staged by `build.rs`.
const NODE_CONFIG_JSON: &str = include_str!(concat!(env!("OUT_DIR"), "/node_config.json"));
/// Broker CA certificate, NUL-terminated for mbedTLS.
const CA_CERT_PEM: &str = concat!(include_str!(concat!(env!("OUT_DIR"), "/ca_cert.pem")), "\0");

const CONTROL_TASK_PRIORITY: u8 = 5;
const CONTROL_TASK_STACK_KB: usize = 16;

/// Log the fault and park the main task. Nothing useful can run without
/// a valid configuration or display.
fn halt(what: &str, e: &dyn core::fmt::Display) -> ! {
    error!("{} failed: {}; halting", what, e);
    loop {
        FreeRtos::delay_ms(1_000);
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Heartlink v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration (fatal if invalid) ───────────────────
    let config = match NodeConfig::from_json(NODE_CONFIG_JSON)
        .and_then(|c| c.validate_network().map(|()| c))
    {
        Ok(c) => c,
        Err(e) => halt("config", &e),
    };
    if CA_CERT_PEM.len() <= 1 {
        halt("config", &"broker CA certificate missing");
    }
    info!(
        "Node '{}' paired with '{}' (display={:?})",
        config.self_id, config.peer_id, config.display.mode
    );

    // ── 3. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_display(config.display.mode) {
        halt("display init", &e);
    }

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // Indicator on GPIO2, switch on GPIO4 (see `pins`).
    let indicator = PinDriver::output(peripherals.pins.gpio2)?;
    let mut switch = PinDriver::input(peripherals.pins.gpio4)?;
    switch.set_pull(Pull::Down)?;

    let mut hw = HardwareAdapter::new(
        StatusLed::new(indicator),
        SwitchInput::new(switch),
        config.display.mode,
    );

    // ── 4. Network adapters ───────────────────────────────────
    let driver = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?;
    let mut wifi = WifiAdapter::new().with_driver(driver);
    if let Err(e) = wifi.set_credentials(&config.wifi.ssid, &config.wifi.password) {
        halt("wifi credentials", &e);
    }

    let inbox = Arc::new(Inbox::new());
    let mut mqtt = MqttAdapter::new(MqttSettings::from_config(&config, CA_CERT_PEM), inbox);

    // ── 5. Control loop on the APP core ───────────────────────
    let control = spawn_on_core(
        Core::App,
        CONTROL_TASK_PRIORITY,
        CONTROL_TASK_STACK_KB,
        "control\0",
        move || {
            let clock = Esp32TimeAdapter::new();
            let mut sink = LogEventSink::new();
            let mut app = ControlLoop::new(&config);

            app.start(&mut wifi, &mut mqtt, &mut hw, &clock, &mut sink);
            info!("System ready. Entering control loop.");

            loop {
                app.run_iteration(&mut wifi, &mut mqtt, &mut hw, &clock, &mut sink);
            }
        },
    )?;

    // The control task never returns; keep main parked on it.
    if control.join().is_err() {
        error!("control task panicked");
    }
    Ok(())
}
