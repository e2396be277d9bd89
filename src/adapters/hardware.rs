//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the indicator LED, the presence switch and both display drivers,
//! exposing them through [`IndicatorPort`], [`SwitchPort`] and
//! [`DisplayPort`]. This is the only module in the system that touches
//! actual hardware. Pin types are generic so host tests can plug in mock
//! `embedded-hal` pins; on non-espidf targets the display drivers use
//! cfg-gated simulation stubs.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{DisplayPort, IndicatorPort, MatrixPort, PulseLedPort, SwitchPort};
use crate::config::DisplayMode;
use crate::drivers::hw_init;
use crate::drivers::matrix::{MatrixDriver, PulseLed};
use crate::drivers::status_led::StatusLed;
use crate::drivers::switch_input::SwitchInput;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<L: OutputPin, S: InputPin> {
    indicator: StatusLed<L>,
    switch: SwitchInput<S>,
    matrix: MatrixDriver,
    pulse: PulseLed,
    mode: DisplayMode,
    released: bool,
}

impl<L: OutputPin, S: InputPin> HardwareAdapter<L, S> {
    pub fn new(indicator: StatusLed<L>, switch: SwitchInput<S>, mode: DisplayMode) -> Self {
        Self {
            indicator,
            switch,
            matrix: MatrixDriver::new(),
            pulse: PulseLed::new(),
            mode,
            released: false,
        }
    }

    pub fn indicator_on(&self) -> bool {
        self.indicator.is_on()
    }

    pub fn matrix(&self) -> &MatrixDriver {
        &self.matrix
    }

    pub fn pulse(&self) -> &PulseLed {
        &self.pulse
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

// ── IndicatorPort / SwitchPort ────────────────────────────────

impl<L: OutputPin, S: InputPin> IndicatorPort for HardwareAdapter<L, S> {
    fn set_indicator(&mut self, on: bool) {
        self.indicator.set(on);
    }
}

impl<L: OutputPin, S: InputPin> SwitchPort for HardwareAdapter<L, S> {
    fn read_switch(&mut self) -> bool {
        self.switch.is_asserted()
    }
}

// ── Display ports ─────────────────────────────────────────────

impl<L: OutputPin, S: InputPin> MatrixPort for HardwareAdapter<L, S> {
    fn set_columns(&mut self, bits: u8) {
        if self.mode == DisplayMode::Matrix {
            self.matrix.set_columns(bits);
        }
    }

    fn set_row_duty(&mut self, row: usize, duty: u16) {
        if self.mode == DisplayMode::Matrix {
            self.matrix.set_row_duty(row, duty);
        }
    }

    fn all_off(&mut self) {
        match self.mode {
            DisplayMode::Matrix => self.matrix.all_off(),
            DisplayMode::PulseLed => self.pulse.set_duty(0),
            DisplayMode::None => {}
        }
    }
}

impl<L: OutputPin, S: InputPin> PulseLedPort for HardwareAdapter<L, S> {
    fn set_pulse_duty(&mut self, duty: u16) {
        if self.mode == DisplayMode::PulseLed {
            self.pulse.set_duty(duty);
        }
    }
}

impl<L: OutputPin, S: InputPin> DisplayPort for HardwareAdapter<L, S> {
    fn release(&mut self) {
        if self.released {
            return;
        }
        hw_init::release_display(self.mode);
        self.released = true;
    }
}
