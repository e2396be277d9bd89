//! Presence switch input.
//!
//! ## Hardware
//!
//! Active-high latching switch with the internal pull-down enabled, so a
//! floating input reads as released. Sampled by polling; debouncing happens
//! one layer up in [`SwitchPublisher`](crate::publisher::SwitchPublisher),
//! which only acts on two equal consecutive samples.

use embedded_hal::digital::InputPin;
use log::warn;

pub struct SwitchInput<P: InputPin> {
    pin: P,
    read_errors: u32,
}

impl<P: InputPin> SwitchInput<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, read_errors: 0 }
    }

    /// Raw level: `true` when the input is HIGH. A failed read counts as
    /// released.
    pub fn is_asserted(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(high) => high,
            Err(_) => {
                self.read_errors = self.read_errors.wrapping_add(1);
                if self.read_errors == 1 {
                    warn!("switch: GPIO read failed, treating as released");
                }
                false
            }
        }
    }

    pub fn read_errors(&self) -> u32 {
        self.read_errors
    }
}
