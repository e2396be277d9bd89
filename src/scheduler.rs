//! Named periodic timers for the control loop.
//!
//! Every cadence the loop cares about lives in one [`TimerSet`]:
//!
//! ```text
//! ┌────────────────────┬────────────┬──────────────────────────────┐
//! │ Task               │ Interval   │ Driven by                    │
//! ├────────────────────┼────────────┼──────────────────────────────┤
//! │ ConnectionCheck    │ 5 s        │ ControlLoop (fire_if_due)    │
//! │ SwitchDebounce     │ 50 ms      │ ControlLoop (fire_if_due)    │
//! │ MessagePoll        │ 10 ms      │ ControlLoop (fire_if_due)    │
//! │ SwitchRefresh      │ 15 s       │ SwitchPublisher (restart)    │
//! │ BeatTimeout        │ 20 s       │ HeartbeatWatchdog (restart)  │
//! └────────────────────┴────────────┴──────────────────────────────┘
//! ```
//!
//! Timestamps are `u32` milliseconds and compared with `wrapping_sub`, so a
//! task keeps firing correctly across the 49.7-day counter wrap.

use crate::config::TimingConfig;

/// Milliseconds elapsed from `since` to `now`, tolerant of counter wrap.
#[inline]
pub fn elapsed_ms(now_ms: u32, since_ms: u32) -> u32 {
    now_ms.wrapping_sub(since_ms)
}

/// Named periodic tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Task {
    ConnectionCheck = 0,
    SwitchDebounce = 1,
    MessagePoll = 2,
    SwitchRefresh = 3,
    BeatTimeout = 4,
}

impl Task {
    /// Total number of tasks; sizes the table array.
    pub const COUNT: usize = 5;

    pub const ALL: [Task; Task::COUNT] = [
        Task::ConnectionCheck,
        Task::SwitchDebounce,
        Task::MessagePoll,
        Task::SwitchRefresh,
        Task::BeatTimeout,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimerEntry {
    interval_ms: u32,
    last_fired_ms: u32,
}

/// Last-fired timestamp and fixed interval for every [`Task`].
#[derive(Debug, Clone)]
pub struct TimerSet {
    entries: [TimerEntry; Task::COUNT],
}

impl TimerSet {
    /// Build the table from config. Every timer starts "just fired" at
    /// `now_ms`, so nothing fires on the very first iteration.
    pub fn new(timing: &TimingConfig, now_ms: u32) -> Self {
        let interval = |task| match task {
            Task::ConnectionCheck => timing.connection_check_ms,
            Task::SwitchDebounce => timing.debounce_ms,
            Task::MessagePoll => timing.message_poll_ms,
            Task::SwitchRefresh => timing.switch_refresh_ms,
            Task::BeatTimeout => timing.beat_timeout_ms,
        };
        Self {
            entries: Task::ALL.map(|task| TimerEntry {
                interval_ms: interval(task),
                last_fired_ms: now_ms,
            }),
        }
    }

    pub fn interval_ms(&self, task: Task) -> u32 {
        self.entries[task as usize].interval_ms
    }

    pub fn last_fired_ms(&self, task: Task) -> u32 {
        self.entries[task as usize].last_fired_ms
    }

    /// `now - last_fired >= interval`.
    pub fn is_due(&self, task: Task, now_ms: u32) -> bool {
        let e = &self.entries[task as usize];
        elapsed_ms(now_ms, e.last_fired_ms) >= e.interval_ms
    }

    /// Fire the task if due, recording `now_ms` as its new timestamp.
    pub fn fire_if_due(&mut self, task: Task, now_ms: u32) -> bool {
        if self.is_due(task, now_ms) {
            self.restart(task, now_ms);
            true
        } else {
            false
        }
    }

    /// Record `now_ms` as the task's last-fired time regardless of due-ness.
    pub fn restart(&mut self, task: Task, now_ms: u32) {
        self.entries[task as usize].last_fired_ms = now_ms;
    }
}
