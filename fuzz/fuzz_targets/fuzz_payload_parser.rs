//! Fuzz target: heartbeat payload handling
//!
//! Feeds arbitrary bytes through `parse_payload` and the watchdog and
//! asserts that only the two boolean words are ever accepted, and that a
//! rejected payload never changes the activation state.
//!
//! cargo fuzz run fuzz_payload_parser

#![no_main]

use heartlink::app::events::AppEvent;
use heartlink::app::ports::{EventSink, InboundMessage};
use heartlink::config::{NodeConfig, TimingConfig};
use heartlink::heartbeat::{parse_payload, HeartbeatWatchdog};
use heartlink::scheduler::TimerSet;
use libfuzzer_sys::fuzz_target;

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    match parse_payload(data) {
        Ok(v) => {
            let word: &[u8] = if v { b"true" } else { b"false" };
            assert!(data.eq_ignore_ascii_case(word));
        }
        Err(_) => {
            assert!(!data.eq_ignore_ascii_case(b"true") && !data.eq_ignore_ascii_case(b"false"));
        }
    }

    let config = NodeConfig::default();
    let mut timers = TimerSet::new(&TimingConfig::default(), 0);
    let mut dog = HeartbeatWatchdog::new(config.subscribe_topic());
    let before = dog.is_active();
    dog.handle_message(&InboundMessage::new("luna/heartbeat", data), &mut timers, 1, &mut Discard);
    if parse_payload(data).is_err() {
        assert_eq!(dog.is_active(), before);
    }
});
