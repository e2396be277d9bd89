//! ControlLoop lifecycle and rendering through the mock board.

use heartlink::app::events::AppEvent;
use heartlink::app::service::ControlLoop;
use heartlink::config::DisplayMode;
use heartlink::display::FrameOutcome;
use heartlink::pins::DUTY_MAX;

use crate::mock_hw::{config, mqtt, wifi, MockBoard, MockClock, RecordingSink, Rig};

#[test]
fn start_brings_both_layers_up_with_two_pulses() {
    let rig = Rig::start(DisplayMode::Matrix);

    assert!(rig.app.is_started());
    assert_eq!(rig.board.rising_edges(), 2);
    assert!(!rig.board.indicator);
    assert!(rig.board.display_dark());
    assert_eq!(rig.sink.events.last(), Some(&AppEvent::Started));
    assert_eq!(rig.app.switch_state(), Some(false));
}

#[test]
fn start_retries_link_before_session() {
    let config = config(DisplayMode::None);
    let clock = MockClock::new(1);
    let mut board = MockBoard::new(&clock);
    let mut sink = RecordingSink::default();
    let mut link = wifi(&config);
    let mut session = mqtt(&config);
    link.sim_fail_next(1);
    session.sim().connect_failures = 1;

    let mut app = ControlLoop::new(&config);
    app.start(&mut link, &mut session, &mut board, &clock, &mut sink);

    let ups: Vec<_> = sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::LinkUp { .. } | AppEvent::SessionUp { .. }))
        .copied()
        .collect();
    assert_eq!(
        ups,
        vec![AppEvent::LinkUp { attempts: 2 }, AppEvent::SessionUp { attempts: 2 }]
    );
    // 5 fast flashes + pulse, 2 slow flashes + pulse.
    assert_eq!(board.rising_edges(), 5 + 1 + 2 + 1);
}

#[test]
fn idle_node_yields_every_iteration() {
    let mut rig = Rig::start(DisplayMode::Matrix);
    let before = rig.clock.ms();
    assert_eq!(rig.step(), FrameOutcome::Idle);
    assert!(rig.clock.ms() - before >= u64::from(rig.config.timing.idle_pause_ms));
    assert_eq!(rig.app.iterations(), 1);
}

#[test]
fn active_matrix_scans_rows_within_budget() {
    let mut rig = Rig::start(DisplayMode::Matrix);
    rig.deliver(b"true");
    rig.run_until(100, |r| r.app.heartbeat_active());

    // 200 ms reaches well into the first beat's fall.
    rig.run_for(200);
    assert!(rig.board.brightest_row_duty < DUTY_MAX);
    assert!(rig.app.display().frame_clock().frame_index() >= 19);
    assert_eq!(rig.app.display().overruns(), 0);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::FrameOverrun { .. })), 0);
    // Every row is parked dark between slices.
    assert!(rig.board.row_duty.iter().all(|&d| d == DUTY_MAX));
}

#[test]
fn deactivation_blanks_and_rewinds_animation() {
    let mut rig = Rig::start(DisplayMode::Matrix);
    rig.deliver(b"true");
    rig.run_for(300);
    assert!(rig.app.display().frame_clock().frame_index() > 0);

    rig.deliver(b"false");
    rig.run_until(100, |r| !r.app.heartbeat_active());
    rig.step();

    assert!(rig.board.display_dark());
    assert_eq!(rig.app.display().frame_clock().frame_index(), 0);
}

#[test]
fn expiry_rewinds_even_when_true_arrives_in_same_iteration() {
    let mut rig = Rig::start(DisplayMode::Matrix);
    rig.deliver(b"true");
    rig.run_until(100, |r| r.app.heartbeat_active());
    rig.run_for(500);
    assert!(rig.app.display().frame_clock().frame_index() > 1);

    // Lease and poll fall due together; the fresh true is polled right
    // after the expiry check.
    rig.clock.advance_ms(u64::from(rig.config.timing.beat_timeout_ms));
    rig.deliver(b"true");
    assert_eq!(rig.step(), FrameOutcome::Rendered);

    assert!(rig.sink.contains(&AppEvent::HeartbeatExpired));
    assert!(rig.app.heartbeat_active());
    assert_eq!(rig.app.display().frame_clock().frame_index(), 1);
    assert!(rig.board.all_off_calls >= 2);
}

#[test]
fn recovery_keeps_display_dark() {
    let mut rig = Rig::start(DisplayMode::PulseLed);
    rig.deliver(b"true");
    assert!(rig.run_until(500, |r| r.board.pulse_duty > 0).is_some());

    rig.session.drop_session();
    rig.session.sim().connect_failures = 1;
    rig.board.indicator_writes_while_lit = 0;
    rig.clock.advance_ms(u64::from(rig.config.timing.connection_check_ms));
    rig.step();

    assert_eq!(rig.app.connection().recoveries(), 1);
    assert!(rig.board.rising_edges() > 0);
    assert_eq!(rig.board.indicator_writes_while_lit, 0);
}

#[test]
fn pulse_led_follows_waveform() {
    let mut rig = Rig::start(DisplayMode::PulseLed);
    rig.deliver(b"true");
    rig.run_for(400);
    assert!(rig.board.max_pulse_duty > DUTY_MAX / 2);
    assert_eq!(rig.board.columns, 0);

    rig.deliver(b"false");
    rig.run_for(50);
    assert_eq!(rig.board.pulse_duty, 0);
}

#[test]
fn receive_only_node_never_reads_or_publishes_switch() {
    let mut config = config(DisplayMode::None);
    config.features.switch_input = false;
    let mut rig = Rig::start_with(config);
    rig.board.switch_level = true;
    rig.run_for(20_000);

    assert_eq!(rig.app.switch_state(), None);
    assert!(rig.session.sim().published.is_empty());
}

#[test]
fn shutdown_releases_display_and_indicator() {
    let mut rig = Rig::start(DisplayMode::Matrix);
    rig.deliver(b"true");
    rig.run_for(100);
    rig.board.indicator = true;

    rig.app.shutdown(&mut rig.board);
    assert!(rig.board.released);
    assert!(rig.board.display_dark());
    assert!(!rig.board.indicator);
    assert!(!rig.app.is_started());
}
