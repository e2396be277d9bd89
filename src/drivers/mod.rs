//! Display and I/O drivers, peripheral initialisation, and timing helpers.

pub mod hw_init;
pub mod matrix;
pub mod spin;
pub mod status_led;
pub mod switch_input;
pub mod task_pin;
