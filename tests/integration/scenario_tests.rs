//! End-to-end scenarios on a started control loop.
//!
//! Virtual time only; each iteration of a display-less node costs the
//! 5 ms idle pause, so 30 s of behaviour runs in a few thousand steps.

use heartlink::app::events::AppEvent;
use heartlink::config::DisplayMode;
use heartlink::error::PayloadError;
use heartlink::scheduler::Task;

use crate::mock_hw::{published, Rig};

// ── Heartbeat activation lease ────────────────────────────────

#[test]
fn uppercase_true_activates_then_silence_expires() {
    let mut rig = Rig::start(DisplayMode::None);
    let lease_before = rig.app.timers().last_fired_ms(Task::BeatTimeout);

    rig.deliver(b"TRUE");
    assert!(rig.run_until(100, |r| r.app.heartbeat_active()).is_some());
    assert!(rig.app.timers().last_fired_ms(Task::BeatTimeout) > lease_before);
    assert!(rig.sink.contains(&AppEvent::HeartbeatChanged { active: true }));

    let off_after = rig
        .run_until(25_000, |r| !r.app.heartbeat_active())
        .expect("lease never expired");
    assert!((19_900..=20_100).contains(&off_after), "expired after {off_after} ms");
    assert!(rig.sink.contains(&AppEvent::HeartbeatExpired));
    assert_eq!(
        rig.sink.events.last(),
        Some(&AppEvent::HeartbeatChanged { active: false })
    );
}

#[test]
fn periodic_true_keeps_heartbeat_alive() {
    let mut rig = Rig::start(DisplayMode::None);
    for _ in 0..6 {
        rig.deliver(b"true");
        rig.run_for(10_000);
        assert!(rig.app.heartbeat_active());
    }
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::HeartbeatExpired)), 0);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::HeartbeatChanged { .. })),
        1
    );
}

#[test]
fn explicit_false_deactivates_immediately() {
    let mut rig = Rig::start(DisplayMode::None);
    rig.deliver(b"true");
    rig.run_for(100);
    rig.deliver(b"False");
    assert!(rig.run_until(100, |r| !r.app.heartbeat_active()).is_some());
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::HeartbeatExpired)), 0);
}

// ── Switch publishing ─────────────────────────────────────────

#[test]
fn held_switch_publishes_edge_plus_one_refresh() {
    let mut rig = Rig::start(DisplayMode::None);
    rig.run_for(1_000);
    assert_eq!(published(&mut rig.session, b"false"), 0, "low switch never publishes at boot");

    rig.board.switch_level = true;
    rig.run_for(16_000);
    assert_eq!(published(&mut rig.session, b"true"), 2);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::SwitchPublished { refresh: true, .. })),
        1
    );

    // Next refresh is due 30 s after the edge, not before.
    rig.run_for(13_900);
    assert_eq!(published(&mut rig.session, b"true"), 2);
    rig.run_for(400);
    assert_eq!(published(&mut rig.session, b"true"), 3);
}

#[test]
fn release_publishes_false_once() {
    let mut rig = Rig::start(DisplayMode::None);
    rig.board.switch_level = true;
    rig.run_for(500);
    rig.board.switch_level = false;
    rig.run_for(20_000);

    assert_eq!(published(&mut rig.session, b"true"), 1);
    assert_eq!(published(&mut rig.session, b"false"), 1);
    assert_eq!(rig.app.switch_state(), Some(false));
    assert!(rig.session.sim().published.iter().all(|(t, _)| t == "dayan/heartbeat"));
}

#[test]
fn single_sample_glitch_is_ignored() {
    let mut rig = Rig::start(DisplayMode::None);
    rig.run_for(200);
    // High for exactly one debounce sample.
    let first = rig.app.timers().last_fired_ms(Task::SwitchDebounce);
    rig.board.switch_level = true;
    rig.run_until(200, |r| r.app.timers().last_fired_ms(Task::SwitchDebounce) != first);
    rig.board.switch_level = false;
    rig.run_for(1_000);

    assert!(rig.session.sim().published.is_empty());
    assert_eq!(rig.app.switch_state(), Some(false));
}

// ── Connection recovery ───────────────────────────────────────

#[test]
fn session_loss_blinks_slow_until_reconnect_then_one_pulse() {
    let mut rig = Rig::start(DisplayMode::None);
    rig.board.clear_indicator_log();
    rig.sink.clear();

    rig.session.drop_session();
    rig.session.sim().connect_failures = 2;
    rig.run_for(5_100);

    assert!(rig.sink.contains(&AppEvent::ConnectionLost { link_up: true }));
    assert!(rig.sink.contains(&AppEvent::SessionUp { attempts: 3 }));

    // Two slow flashes per failed attempt, then the confirmation pulse.
    let edges = rig.board.rising_edge_times();
    assert_eq!(edges.len(), 2 + 2 + 1);
    assert!(edges.windows(2).all(|w| w[1] - w[0] == 1_000), "edges at {edges:?}");
    assert!(!rig.board.indicator);
    assert_eq!(rig.app.connection().recoveries(), 1);
    assert_eq!(
        rig.session.sim().subscriptions,
        vec!["luna/heartbeat".to_string()]
    );
}

// ── Malformed input ───────────────────────────────────────────

#[test]
fn unrecognised_payload_changes_nothing() {
    let mut rig = Rig::start(DisplayMode::None);
    rig.deliver(b"maybe");
    rig.run_for(100);

    assert!(!rig.app.heartbeat_active());
    assert!(rig.sink.contains(&AppEvent::InvalidPayload(PayloadError::Unrecognised)));
}

#[test]
fn invalid_payload_does_not_refresh_lease() {
    let mut rig = Rig::start(DisplayMode::None);
    rig.deliver(b"true");
    rig.run_for(100);
    let lease = rig.app.timers().last_fired_ms(Task::BeatTimeout);

    rig.deliver(&[0xff, 0xfe]);
    rig.deliver(b" true");
    rig.run_for(100);

    assert!(rig.app.heartbeat_active());
    assert_eq!(rig.app.timers().last_fired_ms(Task::BeatTimeout), lease);
    assert!(rig.sink.contains(&AppEvent::InvalidPayload(PayloadError::NotUtf8)));
    assert!(rig.sink.contains(&AppEvent::InvalidPayload(PayloadError::Unrecognised)));
}

#[test]
fn message_on_foreign_topic_is_ignored() {
    let mut rig = Rig::start(DisplayMode::None);
    assert!(rig.session.inject("dayan/heartbeat", b"true"));
    rig.run_for(100);
    assert!(!rig.app.heartbeat_active());
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::InvalidPayload(_))), 0);
}
