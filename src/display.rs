//! Heartbeat display driver.
//!
//! Renders one frame per call while the heartbeat is active:
//!
//! ```text
//!  frame_start                                          frame_start + frame_us
//!  │ row 0 │ row 1 │ row 2 │ … │ row 7 │ (pad) │
//!  ├───────┤
//!  │ set columns → row duty → spin to row_us → row dark
//! ```
//!
//! The waveform is sampled once per frame from the [`FrameClock`], never
//! from wall-clock time, so a late frame slows the animation instead of
//! skipping part of it. Rows are active-low: full intensity = duty 0.
//!
//! In [`DisplayMode::PulseLed`] the same frame budget is spent holding one
//! PWM LED at the frame's intensity.

use crate::app::events::AppEvent;
use crate::app::ports::{Clock, DisplayPort, EventSink};
use crate::config::{DisplayConfig, DisplayMode};
use crate::drivers::spin::spin_until;
use crate::pins::DUTY_MAX;
use crate::waveform::WaveformParams;

/// Rows (and columns) of the matrix.
pub const MATRIX_SIZE: usize = 8;

/// Register writes between row slices; a frame is late only beyond this.
const OVERRUN_SLACK_US: u64 = 250;

// ───────────────────────────────────────────────────────────────
// Frame clock
// ───────────────────────────────────────────────────────────────

/// Sole time base of the animation: completed frames since activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameClock {
    frame_index: u64,
    refresh_hz: u32,
}

impl FrameClock {
    pub const fn new(refresh_hz: u32) -> Self {
        Self {
            frame_index: 0,
            refresh_hz,
        }
    }

    pub const fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// `frame_index / refresh_hz`, in seconds.
    pub fn phase_seconds(&self) -> f64 {
        if self.refresh_hz == 0 {
            return 0.0;
        }
        self.frame_index as f64 / f64::from(self.refresh_hz)
    }

    /// Only [`reset`](Self::reset) ever moves the index backwards.
    pub fn advance(&mut self) {
        self.frame_index = self.frame_index.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.frame_index = 0;
    }
}

// ───────────────────────────────────────────────────────────────
// Patterns
// ───────────────────────────────────────────────────────────────

/// One 8×8 bitmap. Byte `r` is row `r`; bit `c` is column `c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixPattern(pub [u8; MATRIX_SIZE]);

impl MatrixPattern {
    /// 4×4 disc in the centre.
    pub const MEDIUM_CIRCLE: Self = Self([0x00, 0x00, 0x18, 0x3C, 0x3C, 0x18, 0x00, 0x00]);
    /// 6×6 disc.
    pub const FULL_CIRCLE: Self = Self([0x00, 0x3C, 0x7E, 0x7E, 0x7E, 0x7E, 0x3C, 0x00]);
    /// Every LED.
    pub const FULL_FILL: Self = Self([0xFF; MATRIX_SIZE]);

    /// Pick the pattern for an intensity by tercile (sparse → dense).
    pub fn for_intensity(intensity: f32) -> Self {
        if intensity < 1.0 / 3.0 {
            Self::MEDIUM_CIRCLE
        } else if intensity < 2.0 / 3.0 {
            Self::FULL_CIRCLE
        } else {
            Self::FULL_FILL
        }
    }

    pub const fn row(&self, row: usize) -> u8 {
        self.0[row]
    }

    pub const fn is_lit(&self, row: usize, col: usize) -> bool {
        self.0[row] & (1 << col) != 0
    }

    pub fn lit_count(&self) -> u32 {
        self.0.iter().map(|r| r.count_ones()).sum()
    }
}

/// Active-low row duty for `intensity`: 0 = fully lit, `DUTY_MAX` = dark.
pub fn row_duty(intensity: f32) -> u16 {
    let dark = 1.0 - intensity.clamp(0.0, 1.0);
    (dark * f32::from(DUTY_MAX)).round() as u16
}

/// Active-high pulse LED duty for `intensity`.
pub fn pulse_duty(intensity: f32) -> u16 {
    (intensity.clamp(0.0, 1.0) * f32::from(DUTY_MAX)).round() as u16
}

// ───────────────────────────────────────────────────────────────
// Driver
// ───────────────────────────────────────────────────────────────

/// What one [`DisplayDriver::render`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A full frame was rendered and the frame clock advanced.
    Rendered,
    /// Nothing to render (inactive, or no renderer fitted).
    Idle,
}

#[derive(Debug)]
pub struct DisplayDriver {
    mode: DisplayMode,
    waveform: WaveformParams,
    clock: FrameClock,
    frame_us: u64,
    row_us: u64,
    was_active: bool,
    blanked: bool,
    overruns: u32,
}

impl DisplayDriver {
    pub fn new(config: &DisplayConfig, waveform: WaveformParams) -> Self {
        let frame_us = 1_000_000 / u64::from(config.refresh_hz.max(1));
        Self {
            mode: config.mode,
            waveform,
            clock: FrameClock::new(config.refresh_hz),
            frame_us,
            row_us: frame_us / MATRIX_SIZE as u64,
            was_active: false,
            blanked: false,
            overruns: 0,
        }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn frame_clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn frame_us(&self) -> u64 {
        self.frame_us
    }

    pub fn row_us(&self) -> u64 {
        self.row_us
    }

    /// Frames that ran past their budget since boot.
    pub fn overruns(&self) -> u32 {
        self.overruns
    }

    /// Render one frame if `active`, otherwise blank once and rewind.
    pub fn render(
        &mut self,
        active: bool,
        hw: &mut impl DisplayPort,
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) -> FrameOutcome {
        if !active {
            if self.was_active || !self.blanked {
                self.rewind(hw);
            }
            return FrameOutcome::Idle;
        }

        self.was_active = true;
        if self.mode == DisplayMode::None {
            return FrameOutcome::Idle;
        }
        self.blanked = false;

        let intensity = self.waveform.intensity(self.clock.phase_seconds());
        let frame_start = clock.now_us();

        match self.mode {
            DisplayMode::Matrix => self.scan_rows(intensity, hw, clock),
            DisplayMode::PulseLed => hw.set_pulse_duty(pulse_duty(intensity)),
            DisplayMode::None => {}
        }

        let work_us = clock.now_us().wrapping_sub(frame_start);
        spin_until(clock, frame_start, self.frame_us);
        self.clock.advance();

        if work_us > self.frame_us + OVERRUN_SLACK_US {
            self.overruns = self.overruns.wrapping_add(1);
            sink.emit(&AppEvent::FrameOverrun {
                frame_us: u32::try_from(work_us).unwrap_or(u32::MAX),
                budget_us: self.frame_us as u32,
            });
        }
        FrameOutcome::Rendered
    }

    fn scan_rows(&self, intensity: f32, hw: &mut impl DisplayPort, clock: &impl Clock) {
        let pattern = MatrixPattern::for_intensity(intensity);
        let duty = row_duty(intensity);
        for row in 0..MATRIX_SIZE {
            let row_start = clock.now_us();
            hw.set_columns(pattern.row(row));
            hw.set_row_duty(row, duty);
            spin_until(clock, row_start, self.row_us);
            hw.set_row_duty(row, DUTY_MAX);
        }
    }

    /// End the current animation: rewind the frame clock and go dark.
    ///
    /// Called on every active→inactive transition, including one that is
    /// reversed again before the next [`render`](Self::render).
    pub fn rewind(&mut self, hw: &mut impl DisplayPort) {
        self.clock.reset();
        self.was_active = false;
        if !self.blanked {
            self.blank(hw);
        }
    }

    /// Drive every output of the fitted renderer off.
    pub fn blank(&mut self, hw: &mut impl DisplayPort) {
        match self.mode {
            DisplayMode::Matrix => hw.all_off(),
            DisplayMode::PulseLed => hw.set_pulse_duty(0),
            DisplayMode::None => {}
        }
        self.blanked = true;
    }

    /// Blank and hand the PWM timer back. The driver must not render again.
    pub fn shutdown(&mut self, hw: &mut impl DisplayPort) {
        self.blank(hw);
        if self.mode != DisplayMode::None {
            hw.release();
        }
        self.clock.reset();
        self.was_active = false;
    }
}
