//! Hardware adapter: bridges real peripherals to the domain.
//!
//! [`HardwareAdapter`] owns the [`MoistureProbe`] and implements
//! [`SensorPort`]; [`RelayPin`] exposes the relay GPIO as an
//! `embedded_hal` output pin.  These are the only types in the system that
//! touch actual hardware.  On non-espidf targets the underlying `hw_init`
//! calls use the simulation atomics.

use embedded_hal::digital::{Error, ErrorKind, ErrorType, OutputPin};

use crate::app::ports::SensorPort;
use crate::drivers::hw_init;
use crate::error::HardwareFault;
use crate::sensors::MoistureProbe;

/// Concrete adapter for the moisture sensor.
pub struct HardwareAdapter {
    probe: MoistureProbe,
}

impl HardwareAdapter {
    pub fn new(probe: MoistureProbe) -> Self {
        Self { probe }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HardwareAdapter {
    fn read_raw(&mut self) -> Result<u16, HardwareFault> {
        self.probe.read_raw()
    }
}

// ── Relay output pin ──────────────────────────────────────────

/// ESP-IDF return code from a failed `gpio_set_level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioWriteError(pub i32);

impl Error for GpioWriteError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// The relay GPIO configured by `hw_init::init_peripherals`.
pub struct RelayPin {
    gpio: i32,
}

impl RelayPin {
    pub fn new(gpio: i32) -> Self {
        Self { gpio }
    }
}

impl ErrorType for RelayPin {
    type Error = GpioWriteError;
}

impl OutputPin for RelayPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.gpio, false).map_err(GpioWriteError)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.gpio, true).map_err(GpioWriteError)
    }
}
