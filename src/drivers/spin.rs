//! Busy-wait to a microsecond deadline.
//!
//! The display's row and frame slices are far shorter than a FreeRTOS tick,
//! so they are timed by spinning on the monotonic clock rather than by
//! sleeping.

use crate::app::ports::Clock;

/// Spin until `duration_us` has elapsed since `start_us`.
///
/// Returns immediately if the deadline already passed. Elapsed time uses
/// `wrapping_sub`, so a clock wrap mid-wait cannot hang the caller.
#[inline]
pub fn spin_until(clock: &impl Clock, start_us: u64, duration_us: u64) {
    while clock.now_us().wrapping_sub(start_us) < duration_us {
        core::hint::spin_loop();
    }
}
