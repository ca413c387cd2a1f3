//! Control loop integration tests.
//!
//! Drives [`ControlLoop::tick`] against the recording mocks and checks the
//! full trace: relay levels, blocking holds and publishes, in order.

use soilpump::app::service::Decision;
use soilpump::drivers::relay::RelayState;
use soilpump::error::{ConfigError, Error, HardwareFault};

use crate::mock_hw::{RigBuilder, Step, activations, publishes};

fn publish(payload: &str) -> Step {
    Step::Publish {
        payload: payload.into(),
        delivered: true,
    }
}

// ── Decision ──────────────────────────────────────────────────

#[test]
fn full_scale_sample_runs_pump_then_reports() {
    let (mut app, trace) = RigBuilder::new([4095]).build();

    let it = app.tick().unwrap();

    assert_eq!(it.decision, Decision::Ran);
    assert_eq!(it.reading.raw, 4095);
    assert_eq!(it.reading.voltage, 3.3);
    assert_eq!(it.reading.percent, 0.0);
    assert_eq!(
        *trace.borrow(),
        vec![
            publish("Starting the motor"),
            Step::Level(true),
            Step::Hold(10_000),
            Step::Level(false),
            publish("Stopping the motor"),
            publish("AO raw=4095 | Voltage=3.30 V | Moisture=0.0%"),
            Step::Hold(2_000),
            Step::Level(false),
            Step::Hold(2_000),
        ]
    );
    assert_eq!(app.actuator().state(), RelayState::Idle);
    assert_eq!(app.actuator().cycles(), 1);
}

#[test]
fn submerged_probe_only_reports_and_idles() {
    let (mut app, trace) = RigBuilder::new([0]).build();

    let it = app.tick().unwrap();

    assert_eq!(it.decision, Decision::Skip);
    assert_eq!(it.reading.percent, 100.0);
    assert_eq!(
        *trace.borrow(),
        vec![
            publish("AO raw=0 | Voltage=0.00 V | Moisture=100.0%"),
            Step::Hold(2_000),
            Step::Level(false),
            Step::Hold(2_000),
        ]
    );
    assert_eq!(app.actuator().cycles(), 0);
}

#[test]
fn threshold_is_inclusive() {
    let mut rig = RigBuilder::new([2481, 2482]);
    rig.config.policy.dry_threshold_voltage = 2.0;
    let (mut app, trace) = rig.build();

    assert_eq!(app.tick().unwrap().decision, Decision::Skip);
    assert_eq!(activations(&trace), 0);

    assert_eq!(app.tick().unwrap().decision, Decision::Ran);
    assert_eq!(activations(&trace), 1);
}

#[test]
fn configured_run_duration_is_held() {
    let mut rig = RigBuilder::new([4095]);
    rig.config.policy.run_duration_ms = 750;
    let (mut app, trace) = rig.build();

    app.tick().unwrap();

    let t = trace.borrow();
    let on = t.iter().position(|s| *s == Step::Level(true)).unwrap();
    assert_eq!(t[on + 1], Step::Hold(750));
    assert_eq!(t[on + 2], Step::Level(false));
}

// ── Repeat firing and the cycle cap ───────────────────────────

#[test]
fn dry_soil_refires_every_iteration_by_default() {
    let (mut app, trace) = RigBuilder::new([4095, 4095, 4095]).build();

    for _ in 0..3 {
        assert_eq!(app.tick().unwrap().decision, Decision::Ran);
    }

    assert_eq!(activations(&trace), 3);
    assert_eq!(app.actuator().cycles(), 3);
    assert_eq!(app.tick_count(), 3);
}

#[test]
fn cycle_cap_holds_pump_off_until_soil_is_wet() {
    let mut rig = RigBuilder::new([4095, 4095, 4095, 4095, 0, 4095]);
    rig.config.policy.max_consecutive_cycles = 2;
    let (mut app, trace) = rig.build();

    let decisions: Vec<_> = (0..6).map(|_| app.tick().unwrap().decision).collect();

    assert_eq!(
        decisions,
        vec![
            Decision::Ran,
            Decision::Ran,
            Decision::HeldOff,
            Decision::HeldOff,
            Decision::Skip,
            Decision::Ran,
        ]
    );
    assert_eq!(activations(&trace), 3);
    let notices = publishes(&trace)
        .into_iter()
        .filter(|p| p.starts_with("Cycle limit reached"))
        .count();
    assert_eq!(notices, 1);
    assert!(!app.limiter().is_locked_out());
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn broker_outage_does_not_stop_the_pump() {
    let mut rig = RigBuilder::new([4095]);
    rig.broker_down = true;
    let (mut app, trace) = rig.build();

    let it = app.tick().unwrap();

    assert_eq!(it.decision, Decision::Ran);
    let t = trace.borrow();
    let attempts: Vec<_> = t
        .iter()
        .filter(|s| matches!(s, Step::Publish { .. }))
        .collect();
    assert_eq!(attempts.len(), 3);
    assert!(
        attempts
            .iter()
            .all(|s| matches!(s, Step::Publish { delivered: false, .. }))
    );
    assert_eq!(t[1], Step::Level(true));
    assert_eq!(t[3], Step::Level(false));
    drop(t);

    assert_eq!(app.sink().failed(), 3);
    assert_eq!(app.sink().published(), 0);
}

#[test]
fn exactly_two_publishes_bracket_each_run() {
    let (mut app, trace) = RigBuilder::new([4095, 100, 4095]).build();
    for _ in 0..3 {
        app.tick().unwrap();
    }

    let msgs = publishes(&trace);
    assert_eq!(msgs.iter().filter(|m| *m == "Starting the motor").count(), 2);
    assert_eq!(msgs.iter().filter(|m| *m == "Stopping the motor").count(), 2);
    assert_eq!(msgs.iter().filter(|m| m.starts_with("AO raw=")).count(), 3);
    assert_eq!(app.sink().published(), 7);
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn inverted_calibration_never_touches_the_relay() {
    let mut rig = RigBuilder::new([4095]);
    rig.config.calibration.dry_voltage = 0.3;
    rig.config.calibration.wet_voltage = 3.3;

    let (app, trace) = rig.try_build();

    assert_eq!(
        app.err(),
        Some(Error::Config(ConfigError::InvalidCalibration))
    );
    assert!(trace.borrow().is_empty());
}

#[test]
fn zero_run_duration_is_rejected() {
    let mut rig = RigBuilder::new([4095]);
    rig.config.policy.run_duration_ms = 0;

    let (app, _) = rig.try_build();

    assert!(matches!(
        app.err(),
        Some(Error::Config(ConfigError::ValidationFailed(_)))
    ));
}

#[test]
fn sensor_fault_ends_the_loop() {
    let (mut app, trace) = RigBuilder::new([100]).build();
    app.sensor_mut().push(Err(HardwareFault::AdcReadFailed));

    let err = app.run().unwrap_err();

    assert_eq!(err, Error::Hardware(HardwareFault::AdcReadFailed));
    assert_eq!(app.tick_count(), 2);
    assert_eq!(activations(&trace), 0);
}

#[test]
fn sample_above_full_scale_is_a_fault() {
    let (mut app, trace) = RigBuilder::new([5000]).build();

    assert_eq!(
        app.tick().unwrap_err(),
        Error::Hardware(HardwareFault::SampleOutOfRange(5000))
    );
    assert!(trace.borrow().is_empty());
}

#[test]
fn relay_that_will_not_close_is_fatal_but_released() {
    let mut rig = RigBuilder::new([4095]);
    rig.stuck_low = true;
    let (mut app, trace) = rig.build();

    assert_eq!(
        app.tick().unwrap_err(),
        Error::Hardware(HardwareFault::OutputWriteFailed)
    );
    assert_eq!(
        *trace.borrow(),
        vec![
            publish("Starting the motor"),
            Step::Level(false),
            publish("Stopping the motor"),
        ]
    );
    assert_eq!(app.actuator().state(), RelayState::Idle);
    assert_eq!(app.actuator().cycles(), 0);
}
