//! One-shot display peripheral initialization.
//!
//! Configures the matrix column GPIOs and the LEDC timer/channels that dim
//! the matrix rows (or the single pulse LED) using raw ESP-IDF sys calls.
//! Called once from `main()` before the control loop starts. The indicator
//! LED and the presence switch go through `esp-idf-hal` pin drivers instead.
//!
//! ## LEDC layout
//!
//! | Timer | Resolution | Frequency | Channels                          |
//! |-------|------------|-----------|-----------------------------------|
//! | 0     | 13-bit     | 5 kHz     | CH0-7 = rows 0-7 (matrix mode)    |
//! |       |            |           | CH0 = pulse LED (pulse-LED mode)  |

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::config::DisplayMode;
#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    LedcTimerFailed(i32),
    LedcChannelFailed { channel: u32, rc: i32 },
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcTimerFailed(rc) => write!(f, "LEDC timer config failed (rc={})", rc),
            Self::LedcChannelFailed { channel, rc } => {
                write!(f, "LEDC channel {} config failed (rc={})", channel, rc)
            }
        }
    }
}

impl std::error::Error for HwInitError {}

/// LEDC channel of matrix row `row`.
pub const fn row_channel(row: usize) -> u32 {
    LEDC_CH_ROW0 + row as u32
}

pub const LEDC_CH_ROW0: u32 = 0;
pub const LEDC_CH_PULSE: u32 = 0;

// ── Entry points ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_display(mode: DisplayMode) -> Result<(), HwInitError> {
    use log::info;

    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        match mode {
            DisplayMode::Matrix => {
                init_column_outputs()?;
                init_ledc_timer()?;
                for (row, &gpio) in pins::ROW_GPIOS.iter().enumerate() {
                    // Rows are active-low: start at full duty (dark).
                    init_ledc_channel(row_channel(row), gpio, u32::from(pins::DUTY_MAX))?;
                }
                info!("hw_init: matrix configured (cols=GPIO, rows=LEDC CH0-7)");
            }
            DisplayMode::PulseLed => {
                init_ledc_timer()?;
                init_ledc_channel(LEDC_CH_PULSE, pins::PULSE_LED_GPIO, 0)?;
                info!("hw_init: pulse LED configured (LEDC CH0)");
            }
            DisplayMode::None => info!("hw_init: no display fitted"),
        }
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_display(mode: DisplayMode) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): display init skipped ({:?})", mode);
    Ok(())
}

// ── GPIO outputs (matrix columns) ─────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_column_outputs() -> Result<(), HwInitError> {
    let mask = pins::COLUMN_GPIOS.iter().fold(0u64, |m, &pin| m | (1u64 << pin));
    let cfg = gpio_config_t {
        pin_bit_mask: mask,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    for &pin in &pins::COLUMN_GPIOS {
        unsafe { gpio_set_level(pin, 0) };
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an output pin configured in
    // init_column_outputs(). Control-loop only.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── LEDC PWM ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ledc_timer() -> Result<(), HwInitError> {
    let timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: pins::PWM_RESOLUTION_BITS,
        freq_hz: pins::LED_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let ret = unsafe { ledc_timer_config(&timer) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcTimerFailed(ret));
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_ledc_channel(channel: u32, gpio: i32, duty: u32) -> Result<(), HwInitError> {
    let ret = unsafe {
        ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: gpio,
            duty,
            hpoint: 0,
            ..Default::default()
        })
    };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcChannelFailed { channel, rc: ret });
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u16) {
    // SAFETY: LEDC channels were configured in init_display(); duty register
    // writes are race-free since only the control loop calls this function.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, u32::from(duty));
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, _duty: u16) {}

/// Stop every display channel at its dark level and pause the timer.
#[cfg(target_os = "espidf")]
pub fn release_display(mode: DisplayMode) {
    // SAFETY: called from the control loop at shutdown, after the last frame.
    unsafe {
        match mode {
            DisplayMode::Matrix => {
                for row in 0..pins::ROW_GPIOS.len() {
                    ledc_stop(ledc_mode_t_LEDC_LOW_SPEED_MODE, row_channel(row), 1);
                }
                for &pin in &pins::COLUMN_GPIOS {
                    gpio_set_level(pin, 0);
                }
            }
            DisplayMode::PulseLed => {
                ledc_stop(ledc_mode_t_LEDC_LOW_SPEED_MODE, LEDC_CH_PULSE, 0);
            }
            DisplayMode::None => return,
        }
        ledc_timer_pause(ledc_mode_t_LEDC_LOW_SPEED_MODE, ledc_timer_t_LEDC_TIMER_0);
    }
    log::info!("hw_init: display released");
}

#[cfg(not(target_os = "espidf"))]
pub fn release_display(mode: DisplayMode) {
    log::info!("hw_init(sim): display released ({:?})", mode);
}
