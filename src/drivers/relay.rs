//! Pump relay driver.
//!
//! A single digital output: HIGH closes the relay and runs the pump.
//! Works with any `embedded_hal::digital::OutputPin`, so the same driver
//! runs on the ESP-IDF GPIO and on the recording pins used in tests.
//!
//! ## Safety contract
//!
//! The driver is a dumb actuator.  Bounding how long the pump stays on is
//! the job of [`ActuatorController`](crate::app::actuator::ActuatorController),
//! which is the only owner of a `RelayDriver`.

use embedded_hal::digital::OutputPin;
use log::error;

use crate::error::HardwareFault;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Running,
}

pub struct RelayDriver<P> {
    pin: P,
    state: RelayState,
}

impl<P: OutputPin> RelayDriver<P> {
    /// Take ownership of the pin and drive it low.
    pub fn new(pin: P) -> Result<Self, HardwareFault> {
        let mut relay = Self {
            pin,
            state: RelayState::Idle,
        };
        relay.deactivate()?;
        Ok(relay)
    }

    pub fn activate(&mut self) -> Result<(), HardwareFault> {
        self.pin.set_high().map_err(|e| {
            error!("relay: set_high failed: {:?}", e);
            HardwareFault::OutputWriteFailed
        })?;
        self.state = RelayState::Running;
        Ok(())
    }

    /// Drive the output low.  The state only returns to `Idle` once the
    /// write has succeeded.
    pub fn deactivate(&mut self) -> Result<(), HardwareFault> {
        self.pin.set_low().map_err(|e| {
            error!("relay: set_low failed: {:?}", e);
            HardwareFault::OutputWriteFailed
        })?;
        self.state = RelayState::Idle;
        Ok(())
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RelayState::Running
    }
}
