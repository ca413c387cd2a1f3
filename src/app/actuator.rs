//! Actuator controller: bounded, non-overlapping pump runs.
//!
//! [`ActuatorController::engage`] closes the relay, holds the calling
//! context for the full run duration, and opens the relay again before it
//! returns.  The hold is a plain blocking delay: the "on" and the "off"
//! are issued by the same call, so there is no window in which the caller
//! can move on with the pump still running.
//!
//! The controller also emits the "starting" / "stopping" telemetry pair
//! itself, so the pair always brackets the output toggle in the trace.
//!
//! `engage` takes `&mut self`; overlapping runs would need two mutable
//! borrows of the single controller that owns the relay.

use core::num::NonZeroU32;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::drivers::relay::{RelayDriver, RelayState};
use crate::error::HardwareFault;

use super::events::AppEvent;
use super::ports::EventSink;

pub struct ActuatorController<P> {
    relay: RelayDriver<P>,
    cycles: u32,
}

impl<P: OutputPin> ActuatorController<P> {
    /// Take exclusive ownership of the relay output.  The output is driven
    /// inactive before the controller is returned.
    pub fn new(pin: P) -> Result<Self, HardwareFault> {
        Ok(Self {
            relay: RelayDriver::new(pin)?,
            cycles: 0,
        })
    }

    /// Run the pump for exactly `duration_ms`, blocking the caller.
    ///
    /// Emits [`AppEvent::PumpStarting`] before the relay closes and
    /// [`AppEvent::PumpStopping`] after it opens, whether or not the
    /// writes or the publishes succeed.  If closing the relay fails the
    /// hold is skipped, but the relay is still driven open.
    pub fn engage(
        &mut self,
        duration_ms: NonZeroU32,
        delay: &mut impl DelayNs,
        sink: &mut impl EventSink,
    ) -> Result<(), HardwareFault> {
        info!("PUMP | start ({} ms)", duration_ms);
        sink.emit(&AppEvent::PumpStarting);

        let started = self.relay.activate();
        if started.is_ok() {
            delay.delay_ms(duration_ms.get());
        } else {
            warn!("PUMP | relay did not close, skipping hold");
        }
        let stopped = self.relay.deactivate();

        info!("PUMP | stop");
        sink.emit(&AppEvent::PumpStopping);

        started.and(stopped)?;
        self.cycles = self.cycles.wrapping_add(1);
        Ok(())
    }

    /// Force the output inactive.  Idempotent; emits nothing.
    pub fn release(&mut self) -> Result<(), HardwareFault> {
        self.relay.deactivate()
    }

    pub fn state(&self) -> RelayState {
        self.relay.state()
    }

    /// Completed pump runs since boot.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }
}
