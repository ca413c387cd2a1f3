//! Control loop: the hexagonal core.
//!
//! [`ControlLoop`] owns the sensor port, the actuator controller, the
//! event sink and the delay provider.  Each [`tick`](ControlLoop::tick)
//! is one full iteration:
//!
//! ```text
//!   sample ──▶ decide ──▶ (engage, blocking) ──▶ report ──▶ idle
//!                                                   poll · release · settle
//! ```
//!
//! Everything runs on the caller's thread.  The blocking hold inside
//! `engage` and the idle waits are the only suspension points, which is
//! what keeps sampling and actuation mutually exclusive without a lock.

use core::convert::Infallible;
use core::num::NonZeroU32;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{error, info};

use crate::config::{RunPolicy, SystemConfig};
use crate::error::{HardwareFault, Result};
use crate::safety::{CycleLimiter, Permit};
use crate::sensors::moisture::{Calibration, MoistureReading};

use super::actuator::ActuatorController;
use super::events::AppEvent;
use super::ports::{EventSink, SensorPort};

/// What the decision phase did in one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Voltage below the dry threshold.
    Skip,
    /// Pump ran for the configured duration.
    Ran,
    /// Dry, but the cycle limiter held the pump off.
    HeldOff,
}

/// Result of one [`ControlLoop::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Iteration {
    pub reading: MoistureReading,
    pub decision: Decision,
}

pub struct ControlLoop<S, P, E, D> {
    sensor: S,
    actuator: ActuatorController<P>,
    sink: E,
    delay: D,
    calibration: Calibration,
    policy: RunPolicy,
    run_duration: NonZeroU32,
    limiter: CycleLimiter,
    tick_count: u64,
}

impl<S, P, E, D> ControlLoop<S, P, E, D>
where
    S: SensorPort,
    P: OutputPin,
    E: EventSink,
    D: DelayNs,
{
    /// Validate `config` and take ownership of the ports.
    ///
    /// A configuration error is returned before the relay pin is touched.
    /// On success the relay output has been driven inactive.
    pub fn new(config: &SystemConfig, sensor: S, relay: P, sink: E, delay: D) -> Result<Self> {
        config.validate()?;
        let calibration = Calibration::try_from(&config.calibration)?;
        let run_duration = config.policy.run_duration()?;
        let actuator = ActuatorController::new(relay)?;

        info!(
            "ControlLoop ready: threshold={:.2}V run={}ms poll={}ms settle={}ms cap={}",
            config.policy.dry_threshold_voltage,
            run_duration,
            config.policy.poll_interval_ms,
            config.policy.settle_interval_ms,
            config.policy.max_consecutive_cycles,
        );

        Ok(Self {
            sensor,
            actuator,
            sink,
            delay,
            calibration,
            policy: config.policy,
            run_duration,
            limiter: CycleLimiter::new(&config.policy),
            tick_count: 0,
        })
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// Run one full iteration: sample → decide → report → idle.
    ///
    /// Only hardware faults come back as errors; telemetry failures are
    /// absorbed by the sink.
    pub fn tick(&mut self) -> Result<Iteration> {
        self.tick_count += 1;

        // 1. Sample
        let reading = self.sample()?;

        // 2. Decide (voltage, not percent: a dry probe reads high)
        let decision = if reading.voltage >= self.policy.dry_threshold_voltage {
            match self.limiter.permit() {
                Permit::Run => {
                    self.actuator
                        .engage(self.run_duration, &mut self.delay, &mut self.sink)?;
                    Decision::Ran
                }
                Permit::LockedOut { cycles } => {
                    self.sink.emit(&AppEvent::CycleLimitReached { cycles });
                    Decision::HeldOff
                }
                Permit::StillLockedOut => Decision::HeldOff,
            }
        } else {
            self.limiter.reset();
            Decision::Skip
        };

        // 3. Report, unconditionally and after any pump run
        self.sink.emit(&AppEvent::Reading(reading));

        // 4. Idle
        self.delay.delay_ms(self.policy.poll_interval_ms);
        self.actuator.release()?;
        self.delay.delay_ms(self.policy.settle_interval_ms);

        Ok(Iteration { reading, decision })
    }

    /// Loop forever.  Returns only with a fatal error.
    pub fn run(&mut self) -> Result<Infallible> {
        loop {
            if let Err(e) = self.tick() {
                error!("ControlLoop stopped after {} ticks: {}", self.tick_count, e);
                return Err(e);
            }
        }
    }

    fn sample(&mut self) -> Result<MoistureReading> {
        let raw = self.sensor.read_raw()?;
        if raw > self.calibration.max_raw() {
            return Err(HardwareFault::SampleOutOfRange(raw).into());
        }
        Ok(self.calibration.reading(raw))
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn actuator(&self) -> &ActuatorController<P> {
        &self.actuator
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn limiter(&self) -> &CycleLimiter {
        &self.limiter
    }

    /// Iterations started since construction.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
