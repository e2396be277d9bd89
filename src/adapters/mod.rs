//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements              | Connects to                  |
//! |------------|-------------------------|------------------------------|
//! | `hardware` | IndicatorPort           | Indicator GPIO               |
//! |            | SwitchPort              | Presence switch GPIO         |
//! |            | DisplayPort             | Matrix GPIO + LEDC, pulse LED|
//! | `inbox`    |                         | MQTT task → control loop     |
//! | `log_sink` | EventSink               | Serial log output            |
//! | `mqtt`     | SessionPort             | ESP-IDF MQTT over TLS        |
//! | `time`     | Clock                   | ESP32 system timer           |
//! | `wifi`     | LinkPort                | ESP-IDF WiFi STA             |

pub mod hardware;
pub mod inbox;
pub mod log_sink;
pub mod mqtt;
pub mod time;
pub(crate) mod utils;
pub mod wifi;
