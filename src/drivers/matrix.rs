//! 8×8 LED matrix and single pulse LED drivers.
//!
//! ## Hardware
//!
//! Columns are active-high plain GPIOs; rows are active-low LEDC channels,
//! so a row at `DUTY_MAX` is dark and a row at 0 is fully lit. Only one
//! row is driven at a time; the scan timing lives in
//! [`DisplayDriver`](crate::display::DisplayDriver).
//!
//! Both drivers keep a shadow of what they last wrote. On ESP-IDF the
//! writes go to hardware via `hw_init`; on host the shadow is the only
//! state.

use crate::display::MATRIX_SIZE;
use crate::drivers::hw_init;
use crate::pins;

pub struct MatrixDriver {
    columns: u8,
    row_duty: [u16; MATRIX_SIZE],
}

impl Default for MatrixDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixDriver {
    pub fn new() -> Self {
        Self {
            columns: 0,
            row_duty: [pins::DUTY_MAX; MATRIX_SIZE],
        }
    }

    /// Latch all eight column lines; bit `n` drives column `n`.
    pub fn set_columns(&mut self, bits: u8) {
        for (col, &gpio) in pins::COLUMN_GPIOS.iter().enumerate() {
            let high = bits & (1 << col) != 0;
            if (self.columns & (1 << col) != 0) != high {
                hw_init::gpio_write(gpio, high);
            }
        }
        self.columns = bits;
    }

    /// Out-of-range rows are ignored.
    pub fn set_row_duty(&mut self, row: usize, duty: u16) {
        let Some(slot) = self.row_duty.get_mut(row) else {
            return;
        };
        let duty = duty.min(pins::DUTY_MAX);
        hw_init::ledc_set(hw_init::row_channel(row), duty);
        *slot = duty;
    }

    pub fn all_off(&mut self) {
        for row in 0..MATRIX_SIZE {
            self.set_row_duty(row, pins::DUTY_MAX);
        }
        self.set_columns(0);
    }

    pub fn columns(&self) -> u8 {
        self.columns
    }

    pub fn row_duty(&self, row: usize) -> Option<u16> {
        self.row_duty.get(row).copied()
    }

    /// Rows currently driven below `DUTY_MAX` (i.e. not dark).
    pub fn lit_rows(&self) -> usize {
        self.row_duty.iter().filter(|&&d| d < pins::DUTY_MAX).count()
    }
}

/// Single active-high PWM LED.
#[derive(Default)]
pub struct PulseLed {
    duty: u16,
}

impl PulseLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_duty(&mut self, duty: u16) {
        let duty = duty.min(pins::DUTY_MAX);
        hw_init::ledc_set(hw_init::LEDC_CH_PULSE, duty);
        self.duty = duty;
    }

    pub fn duty(&self) -> u16 {
        self.duty
    }
}
