//! Connectivity indicator LED driver.
//!
//! A single active-high LED on a plain GPIO. Generic over the
//! `embedded-hal` output pin so the same driver runs on an
//! `esp-idf-hal` `PinDriver` and on a host-side mock.

use embedded_hal::digital::{OutputPin, PinState};
use log::warn;

pub struct StatusLed<P: OutputPin> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> StatusLed<P> {
    /// Takes ownership of the pin and drives it low.
    pub fn new(pin: P) -> Self {
        let mut led = Self { pin, on: true };
        led.set(false);
        led
    }

    pub fn set(&mut self, on: bool) {
        if self.pin.set_state(PinState::from(on)).is_err() {
            warn!("status_led: GPIO write failed");
            return;
        }
        self.on = on;
    }

    pub fn off(&mut self) {
        self.set(false);
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Hand the pin back (tests, or re-purposing at shutdown).
    pub fn release(self) -> P {
        self.pin
    }
}
