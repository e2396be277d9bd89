//! Mock board, clock and event sink for integration tests.
//!
//! The clock is virtual: `delay_ms` advances it instantly and every
//! `now_us` read ticks it forward by a small step, so spin-waits terminate.
//! The board shares the clock's time cell and timestamps every indicator
//! change, letting tests assert on blink cadence.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use heartlink::adapters::inbox::Inbox;
use heartlink::adapters::mqtt::{MqttAdapter, MqttSettings};
use heartlink::adapters::wifi::WifiAdapter;
use heartlink::app::events::AppEvent;
use heartlink::app::ports::{
    Clock, DisplayPort, EventSink, IndicatorPort, MatrixPort, PulseLedPort, SwitchPort,
};
use heartlink::app::service::ControlLoop;
use heartlink::config::{DisplayMode, NodeConfig};
use heartlink::display::FrameOutcome;
use heartlink::pins::DUTY_MAX;

pub type SharedTime = Rc<Cell<u64>>;

// ── MockClock ─────────────────────────────────────────────────

pub struct MockClock {
    time_us: SharedTime,
    step_us: u64,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new(step_us: u64) -> Self {
        Self {
            time_us: Rc::new(Cell::new(0)),
            step_us,
        }
    }

    pub fn shared(&self) -> SharedTime {
        Rc::clone(&self.time_us)
    }

    pub fn ms(&self) -> u64 {
        self.time_us.get() / 1_000
    }

    pub fn advance_ms(&self, ms: u64) {
        self.time_us.set(self.time_us.get() + ms * 1_000);
    }
}

impl Clock for MockClock {
    fn now_us(&self) -> u64 {
        let t = self.time_us.get();
        self.time_us.set(t + self.step_us);
        t
    }

    fn delay_ms(&self, ms: u32) {
        self.advance_ms(u64::from(ms));
    }
}

// ── MockBoard ─────────────────────────────────────────────────

/// Records indicator transitions and the current display outputs.
pub struct MockBoard {
    time_us: SharedTime,
    pub switch_level: bool,
    pub indicator: bool,
    /// `(time_ms, level)` for every indicator write.
    pub indicator_log: Vec<(u64, bool)>,
    pub columns: u8,
    pub row_duty: [u16; 8],
    pub pulse_duty: u16,
    /// Highest intensity-carrying write seen on any row (lowest duty).
    pub brightest_row_duty: u16,
    pub max_pulse_duty: u16,
    pub all_off_calls: u32,
    pub released: bool,
    /// Indicator writes made while any display output was lit.
    pub indicator_writes_while_lit: u32,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new(clock: &MockClock) -> Self {
        Self {
            time_us: clock.shared(),
            switch_level: false,
            indicator: false,
            indicator_log: Vec::new(),
            columns: 0,
            row_duty: [DUTY_MAX; 8],
            pulse_duty: 0,
            brightest_row_duty: DUTY_MAX,
            max_pulse_duty: 0,
            all_off_calls: 0,
            released: false,
            indicator_writes_while_lit: 0,
        }
    }

    /// Off→on transitions of the indicator.
    pub fn rising_edges(&self) -> usize {
        let mut prev = false;
        let mut edges = 0;
        for &(_, on) in &self.indicator_log {
            if on && !prev {
                edges += 1;
            }
            prev = on;
        }
        edges
    }

    /// Timestamps (ms) of the off→on transitions.
    pub fn rising_edge_times(&self) -> Vec<u64> {
        let mut prev = false;
        let mut times = Vec::new();
        for &(t, on) in &self.indicator_log {
            if on && !prev {
                times.push(t);
            }
            prev = on;
        }
        times
    }

    pub fn clear_indicator_log(&mut self) {
        self.indicator_log.clear();
    }

    pub fn display_dark(&self) -> bool {
        self.columns == 0 && self.row_duty.iter().all(|&d| d == DUTY_MAX) && self.pulse_duty == 0
    }
}

impl IndicatorPort for MockBoard {
    fn set_indicator(&mut self, on: bool) {
        self.indicator = on;
        self.indicator_log.push((self.time_us.get() / 1_000, on));
        if !self.display_dark() {
            self.indicator_writes_while_lit += 1;
        }
    }
}

impl SwitchPort for MockBoard {
    fn read_switch(&mut self) -> bool {
        self.switch_level
    }
}

impl MatrixPort for MockBoard {
    fn set_columns(&mut self, bits: u8) {
        self.columns = bits;
    }

    fn set_row_duty(&mut self, row: usize, duty: u16) {
        if let Some(slot) = self.row_duty.get_mut(row) {
            *slot = duty;
            self.brightest_row_duty = self.brightest_row_duty.min(duty);
        }
    }

    fn all_off(&mut self) {
        self.all_off_calls += 1;
        self.columns = 0;
        self.row_duty = [DUTY_MAX; 8];
    }
}

impl PulseLedPort for MockBoard {
    fn set_pulse_duty(&mut self, duty: u16) {
        self.pulse_duty = duty;
        self.max_pulse_duty = self.max_pulse_duty.max(duty);
    }
}

impl DisplayPort for MockBoard {
    fn release(&mut self) {
        self.released = true;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

// ── Network fixtures (simulation adapters) ────────────────────

/// Node "luna" paired with "dayan", no renderer unless overridden.
#[allow(dead_code)]
pub fn config(mode: DisplayMode) -> NodeConfig {
    let mut config = NodeConfig::default();
    config.display.mode = mode;
    config.wifi.ssid.push_str("HomeWiFi").unwrap();
    config.wifi.password.push_str("mysecret8").unwrap();
    config.broker.host.push_str("broker.example.net").unwrap();
    config
}

#[allow(dead_code)]
pub fn wifi(config: &NodeConfig) -> WifiAdapter {
    let mut wifi = WifiAdapter::new();
    wifi.set_credentials(&config.wifi.ssid, &config.wifi.password).unwrap();
    wifi
}

#[allow(dead_code)]
pub fn mqtt(config: &NodeConfig) -> MqttAdapter {
    let settings = MqttSettings::from_config(config, "-----BEGIN CERTIFICATE-----\0");
    MqttAdapter::new(settings, Arc::new(Inbox::new()))
}

/// Published `(topic, payload)` pairs carrying `payload`.
#[allow(dead_code)]
pub fn published(mqtt: &mut MqttAdapter, payload: &[u8]) -> usize {
    mqtt.sim().published.iter().filter(|(_, p)| p.as_slice() == payload).count()
}

// ── Rig: a started control loop on simulated hardware ─────────

pub struct Rig {
    pub config: NodeConfig,
    pub clock: MockClock,
    pub board: MockBoard,
    pub sink: RecordingSink,
    pub link: WifiAdapter,
    pub session: MqttAdapter,
    pub app: ControlLoop,
}

#[allow(dead_code)]
impl Rig {
    /// Build and start with `config`; both layers come up first try.
    pub fn start_with(config: NodeConfig) -> Self {
        let clock = MockClock::new(1);
        let board = MockBoard::new(&clock);
        let mut rig = Self {
            link: wifi(&config),
            session: mqtt(&config),
            app: ControlLoop::new(&config),
            config,
            clock,
            board,
            sink: RecordingSink::default(),
        };
        rig.app
            .start(&mut rig.link, &mut rig.session, &mut rig.board, &rig.clock, &mut rig.sink);
        rig
    }

    pub fn start(mode: DisplayMode) -> Self {
        Self::start_with(config(mode))
    }

    pub fn step(&mut self) -> FrameOutcome {
        self.app
            .run_iteration(&mut self.link, &mut self.session, &mut self.board, &self.clock, &mut self.sink)
    }

    /// Iterate until `ms` of virtual time have passed.
    pub fn run_for(&mut self, ms: u64) {
        let end = self.clock.ms() + ms;
        while self.clock.ms() < end {
            self.step();
        }
    }

    /// Iterate until `pred` holds; returns the virtual time (ms) it took,
    /// or `None` if `limit_ms` passed first.
    pub fn run_until(&mut self, limit_ms: u64, pred: impl Fn(&Self) -> bool) -> Option<u64> {
        let start = self.clock.ms();
        while self.clock.ms() - start < limit_ms {
            self.step();
            if pred(self) {
                return Some(self.clock.ms() - start);
            }
        }
        None
    }

    /// Deliver `payload` on this node's own heartbeat topic.
    pub fn deliver(&mut self, payload: &[u8]) {
        let topic = self.config.subscribe_topic();
        assert!(self.session.inject(&topic, payload));
    }
}
