//! GPIO / peripheral pin assignments for the Heartlink node board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// User switch (active-high, internal pull-down)
// ---------------------------------------------------------------------------

/// Presence switch. HIGH = asserted.
pub const SWITCH_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Status indicator
// ---------------------------------------------------------------------------

/// Single connectivity indicator LED (active-high, plain GPIO).
pub const INDICATOR_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// 8×8 LED matrix
// ---------------------------------------------------------------------------

/// Row drivers (active-low, LEDC PWM). Index = matrix row, top to bottom.
pub const ROW_GPIOS: [i32; 8] = [5, 6, 7, 15, 16, 17, 18, 8];

/// Column drivers (active-high, plain GPIO). Index = bit position in the
/// pattern byte, bit 0 = leftmost column.
pub const COLUMN_GPIOS: [i32; 8] = [9, 10, 11, 12, 13, 14, 21, 47];

// ---------------------------------------------------------------------------
// Single pulse LED (alternative to the matrix)
// ---------------------------------------------------------------------------

/// Heartbeat LED for the single-LED build. Shares LEDC channel 0 with
/// matrix row 0; only one of the two display modes is configured at boot.
pub const PULSE_LED_GPIO: i32 = 48;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits). 13 bits gives 0 – 8191 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 13;
/// Largest duty value at [`PWM_RESOLUTION_BITS`].
pub const DUTY_MAX: u16 = (1 << PWM_RESOLUTION_BITS) - 1;
/// LEDC frequency for row / pulse LED dimming. Well above the 800 Hz row
/// rate so each 1.25 ms row slice spans several PWM periods.
pub const LED_PWM_FREQ_HZ: u32 = 5_000;
