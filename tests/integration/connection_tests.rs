//! Connection manager against the simulation WiFi/MQTT adapters.
//!
//! Verifies retry counts, indicator cadence per layer, and that recovery
//! always ends with exactly one confirmation pulse.

use heartlink::app::events::AppEvent;
use heartlink::connection::{ConnectionManager, LinkState};
use heartlink::config::DisplayMode;
use heartlink::error::{LinkError, SessionError};

use crate::mock_hw::{config, mqtt, wifi, MockBoard, MockClock, RecordingSink};

fn manager() -> ConnectionManager {
    let config = config(DisplayMode::None);
    ConnectionManager::new(config.indicator, config.subscribe_topic())
}

#[test]
fn link_retries_blink_fast_then_pulse_once() {
    let config = config(DisplayMode::None);
    let clock = MockClock::new(1);
    let mut board = MockBoard::new(&clock);
    let mut sink = RecordingSink::default();
    let mut link = wifi(&config);
    link.sim_fail_next(2);

    let mut cm = manager();
    let attempts = cm.ensure_link_up(&mut link, &mut board, &clock, &mut sink);

    assert_eq!(attempts, 3);
    assert_eq!(cm.link_state(), LinkState::Connected);
    // 1000 ms window / 100 ms toggle = 5 flashes per failure, plus the pulse.
    assert_eq!(board.rising_edges(), 5 + 5 + 1);
    let edges = board.rising_edge_times();
    assert_eq!(edges[1] - edges[0], 200);
    assert!(!board.indicator);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::LinkFailed { error: LinkError::AssociationFailed, .. })),
        2
    );
    assert!(sink.contains(&AppEvent::LinkUp { attempts: 3 }));
}

#[test]
fn session_subscribes_to_own_topic() {
    let config = config(DisplayMode::None);
    let clock = MockClock::new(1);
    let mut board = MockBoard::new(&clock);
    let mut sink = RecordingSink::default();
    let mut link = wifi(&config);
    let mut session = mqtt(&config);

    let mut cm = manager();
    cm.ensure_link_up(&mut link, &mut board, &clock, &mut sink);
    let attempts = cm.ensure_session_up(&mut link, &mut session, &mut board, &clock, &mut sink);

    assert_eq!(attempts, 1);
    assert_eq!(cm.session_state(), LinkState::Connected);
    assert_eq!(session.sim().subscriptions, vec!["luna/heartbeat".to_string()]);
    assert_eq!(board.rising_edges(), 2);
}

#[test]
fn subscribe_failure_retries_whole_session() {
    let config = config(DisplayMode::None);
    let clock = MockClock::new(1);
    let mut board = MockBoard::new(&clock);
    let mut sink = RecordingSink::default();
    let mut link = wifi(&config);
    let mut session = mqtt(&config);
    session.sim().subscribe_failures = 1;

    let mut cm = manager();
    cm.ensure_link_up(&mut link, &mut board, &clock, &mut sink);
    let attempts = cm.ensure_session_up(&mut link, &mut session, &mut board, &clock, &mut sink);

    assert_eq!(attempts, 2);
    assert_eq!(session.sim().connect_calls, 2);
    assert!(sink.contains(&AppEvent::SessionFailed {
        attempt: 1,
        error: SessionError::SubscribeFailed,
    }));
}

#[test]
fn healthy_check_does_nothing() {
    let config = config(DisplayMode::None);
    let clock = MockClock::new(1);
    let mut board = MockBoard::new(&clock);
    let mut sink = RecordingSink::default();
    let mut link = wifi(&config);
    let mut session = mqtt(&config);

    let mut cm = manager();
    cm.ensure_link_up(&mut link, &mut board, &clock, &mut sink);
    cm.ensure_session_up(&mut link, &mut session, &mut board, &clock, &mut sink);
    board.clear_indicator_log();
    sink.clear();

    assert!(cm.check_connections(&mut link, &mut session, &mut board, &clock, &mut sink));
    assert!(board.indicator_log.is_empty());
    assert!(sink.events.is_empty());
    assert_eq!(cm.recoveries(), 0);
}

#[test]
fn link_loss_rebuilds_link_then_session() {
    let config = config(DisplayMode::None);
    let clock = MockClock::new(1);
    let mut board = MockBoard::new(&clock);
    let mut sink = RecordingSink::default();
    let mut link = wifi(&config);
    let mut session = mqtt(&config);

    let mut cm = manager();
    cm.ensure_link_up(&mut link, &mut board, &clock, &mut sink);
    cm.ensure_session_up(&mut link, &mut session, &mut board, &clock, &mut sink);
    sink.clear();

    link.sim_drop();
    link.sim_fail_next(1);
    assert!(!cm.check_connections(&mut link, &mut session, &mut board, &clock, &mut sink));

    assert!(sink.contains(&AppEvent::ConnectionLost { link_up: false }));
    assert!(sink.contains(&AppEvent::LinkUp { attempts: 2 }));
    assert!(sink.contains(&AppEvent::SessionUp { attempts: 1 }));
    assert_eq!(cm.link_state(), LinkState::Connected);
    assert_eq!(cm.session_state(), LinkState::Connected);
    assert_eq!(session.sim().connect_calls, 2);
    assert_eq!(cm.recoveries(), 1);
}
