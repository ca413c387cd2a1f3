//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the irrigation rules: the run/stop decision, the
//! bounded pump run, and the telemetry it reports.  All interaction with
//! hardware happens through **port traits** defined in [`ports`] and the
//! `embedded-hal` pin/delay traits, keeping this layer fully testable
//! without real peripherals.

pub mod actuator;
pub mod events;
pub mod ports;
pub mod service;
pub mod telemetry;
