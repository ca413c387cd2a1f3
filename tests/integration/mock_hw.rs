//! Mock hardware for integration tests.
//!
//! Every mock writes into one shared [`Trace`], so a test can assert on the
//! exact interleaving of relay writes, waits and publishes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};

use soilpump::app::ports::{SensorPort, TelemetryPort};
use soilpump::app::service::ControlLoop;
use soilpump::app::telemetry::TelemetrySink;
use soilpump::config::{Qos, SystemConfig};
use soilpump::error::{HardwareFault, TelemetryError};

// ── Trace ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Relay output written (`true` = active).
    Level(bool),
    /// Blocking wait, in milliseconds.
    Hold(u32),
    /// Publish attempted; `delivered` is false when the broker was down.
    Publish { payload: String, delivered: bool },
}

pub type Trace = Rc<RefCell<Vec<Step>>>;

#[allow(dead_code)]
pub fn publishes(trace: &Trace) -> Vec<String> {
    trace
        .borrow()
        .iter()
        .filter_map(|s| match s {
            Step::Publish { payload, .. } => Some(payload.clone()),
            _ => None,
        })
        .collect()
}

#[allow(dead_code)]
pub fn activations(trace: &Trace) -> usize {
    trace
        .borrow()
        .iter()
        .filter(|s| **s == Step::Level(true))
        .count()
}

// ── MockSensor ────────────────────────────────────────────────

/// Replays queued samples; repeats the last good one once the queue drains.
pub struct MockSensor {
    queue: VecDeque<Result<u16, HardwareFault>>,
    last: u16,
}

#[allow(dead_code)]
impl MockSensor {
    pub fn new(samples: impl IntoIterator<Item = u16>) -> Self {
        Self {
            queue: samples.into_iter().map(Ok).collect(),
            last: 0,
        }
    }

    pub fn push(&mut self, sample: Result<u16, HardwareFault>) {
        self.queue.push_back(sample);
    }
}

impl SensorPort for MockSensor {
    fn read_raw(&mut self) -> Result<u16, HardwareFault> {
        match self.queue.pop_front() {
            Some(Ok(raw)) => {
                self.last = raw;
                Ok(raw)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last),
        }
    }
}

// ── MockPin ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinFault;

impl embedded_hal::digital::Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

pub struct MockPin {
    trace: Trace,
    /// When set, driving the output high fails without changing the level.
    pub stuck_low: bool,
}

impl ErrorType for MockPin {
    type Error = PinFault;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), PinFault> {
        self.trace.borrow_mut().push(Step::Level(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), PinFault> {
        if self.stuck_low {
            return Err(PinFault);
        }
        self.trace.borrow_mut().push(Step::Level(true));
        Ok(())
    }
}

// ── MockDelay ─────────────────────────────────────────────────

pub struct MockDelay {
    trace: Trace,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_ms(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.trace.borrow_mut().push(Step::Hold(ms));
    }
}

// ── MockBroker ────────────────────────────────────────────────

pub struct MockBroker {
    trace: Trace,
    pub down: bool,
}

impl TelemetryPort for MockBroker {
    fn publish(
        &mut self,
        _topic: &str,
        payload: &str,
        _qos: Qos,
        _retain: bool,
    ) -> Result<(), TelemetryError> {
        self.trace.borrow_mut().push(Step::Publish {
            payload: payload.into(),
            delivered: !self.down,
        });
        if self.down {
            Err(TelemetryError::NotConnected)
        } else {
            Ok(())
        }
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub type Loop = ControlLoop<MockSensor, MockPin, TelemetrySink<MockBroker>, MockDelay>;

pub struct RigBuilder {
    pub config: SystemConfig,
    pub samples: Vec<u16>,
    pub stuck_low: bool,
    pub broker_down: bool,
}

#[allow(dead_code)]
impl RigBuilder {
    pub fn new(samples: impl IntoIterator<Item = u16>) -> Self {
        Self {
            config: SystemConfig::default(),
            samples: samples.into_iter().collect(),
            stuck_low: false,
            broker_down: false,
        }
    }

    /// Build the loop and clear the trace of the start-up relay write.
    pub fn build(self) -> (Loop, Trace) {
        let (app, trace) = self.try_build();
        let app = app.expect("rig config must be valid");
        trace.borrow_mut().clear();
        (app, trace)
    }

    /// Build without panicking; the trace keeps the start-up writes.
    pub fn try_build(self) -> (soilpump::error::Result<Loop>, Trace) {
        let trace: Trace = Rc::default();
        let app = ControlLoop::new(
            &self.config,
            MockSensor::new(self.samples),
            MockPin {
                trace: trace.clone(),
                stuck_low: self.stuck_low,
            },
            TelemetrySink::new(
                MockBroker {
                    trace: trace.clone(),
                    down: self.broker_down,
                },
                &self.config.telemetry,
            ),
            MockDelay {
                trace: trace.clone(),
            },
        );
        (app, trace)
    }
}
