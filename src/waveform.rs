//! Two-beat heartbeat waveform.
//!
//! A pure function of phase: no state, no clock. The display driver feeds
//! it the frame clock's phase, so an animation always starts on the rising
//! edge of the first beat.
//!
//! ```text
//!  1 ┤ /\                         one period
//!    │/  \_    /\                 ───────────────────────────────────
//!    │     \_ /  \_               rise │ fall │ gap │ rise·s │ fall·s │ rest
//!  0 ┼───────┴─────\____________
//! ```
//!
//! Segments are half-open `[start, end)` and tile the period exactly: the
//! period is computed from the same table the evaluator walks.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Decay constant: a beat falls to `exp(-3)` ≈ 5 % by the end of its fall.
const DECAY_RATE: f64 = 3.0;

/// Shape of one heartbeat cycle. Durations are seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformParams {
    /// Linear ramp 0 → peak.
    pub rise_s: f32,
    /// Exponential decay from peak.
    pub fall_s: f32,
    /// Dark gap between the two beats.
    pub between_beats_s: f32,
    /// Dark tail after the second beat.
    pub between_cycles_s: f32,
    /// Peak of the second beat relative to the first.
    pub second_beat_scale: f32,
}

impl Default for WaveformParams {
    fn default() -> Self {
        // 16 × 5 ms ramp, 32 × 5 ms decay, 100 ms pause, 900 ms rest.
        Self {
            rise_s: 0.08,
            fall_s: 0.16,
            between_beats_s: 0.1,
            between_cycles_s: 0.9,
            second_beat_scale: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Shape {
    Rise { peak: f64 },
    Decay { peak: f64 },
    Dark,
}

impl WaveformParams {
    pub fn validate(&self) -> Result<()> {
        let durations = [self.rise_s, self.fall_s, self.between_beats_s, self.between_cycles_s];
        if durations.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(Error::Config("waveform durations must be finite and >= 0"));
        }
        if self.rise_s <= 0.0 || self.fall_s <= 0.0 {
            return Err(Error::Config("waveform rise_s and fall_s must be > 0"));
        }
        if self.second_beat_scale.is_nan() || self.second_beat_scale <= 0.0 || self.second_beat_scale > 1.0 {
            return Err(Error::Config("waveform second_beat_scale must be in (0, 1]"));
        }
        Ok(())
    }

    fn segments(&self) -> [(f64, Shape); 6] {
        let scale = f64::from(self.second_beat_scale);
        [
            (f64::from(self.rise_s), Shape::Rise { peak: 1.0 }),
            (f64::from(self.fall_s), Shape::Decay { peak: 1.0 }),
            (f64::from(self.between_beats_s), Shape::Dark),
            (f64::from(self.rise_s), Shape::Rise { peak: scale }),
            (f64::from(self.fall_s), Shape::Decay { peak: scale }),
            (f64::from(self.between_cycles_s), Shape::Dark),
        ]
    }

    /// Length of one full cycle in seconds.
    pub fn period(&self) -> f64 {
        self.segments().iter().map(|(d, _)| d).sum()
    }

    /// Start of each segment followed by the end of the last one:
    /// rise, fall, gap, rise, fall, rest, end.
    pub fn segment_bounds(&self) -> [f64; 7] {
        let mut bounds = [0.0; 7];
        for (i, (duration, _)) in self.segments().iter().enumerate() {
            bounds[i + 1] = bounds[i] + duration;
        }
        bounds
    }

    /// Heartbeat intensity in `[0, 1]` at `phase_s` seconds into the cycle.
    ///
    /// Any phase is accepted; it is reduced modulo the period first.
    pub fn intensity(&self, phase_s: f64) -> f32 {
        let period = self.period();
        if !period.is_finite() || period <= 0.0 || !phase_s.is_finite() {
            return 0.0;
        }

        let mut t = phase_s.rem_euclid(period);
        for (duration, shape) in self.segments() {
            if t < duration {
                let value = match shape {
                    Shape::Rise { peak } => peak * (t / duration),
                    Shape::Decay { peak } => peak * (-DECAY_RATE * t / duration).exp(),
                    Shape::Dark => 0.0,
                };
                return value.clamp(0.0, 1.0) as f32;
            }
            t -= duration;
        }

        // Rounding residue at the very end of the period belongs to the tail.
        0.0
    }
}
