//! Sensor subsystem.
//!
//! [`moisture`] holds the pure signal-conversion math; [`MoistureProbe`]
//! is the ADC-backed driver that produces raw samples for it.

pub mod moisture;

use crate::drivers::hw_init;
use crate::error::HardwareFault;

/// HD-38 analog output on one ADC1 channel.
///
/// ## Dual-target design
///
/// On ESP-IDF: reads the oneshot ADC configured by `hw_init`.
/// On host/test: reads the value injected with [`sim_set_moisture_raw`].
pub struct MoistureProbe {
    channel: u32,
}

impl MoistureProbe {
    pub fn new(channel: u32) -> Self {
        Self { channel }
    }

    pub fn read_raw(&mut self) -> Result<u16, HardwareFault> {
        hw_init::adc1_read(self.channel).map_err(|rc| {
            log::error!("moisture ADC read failed (rc={})", rc);
            HardwareFault::AdcReadFailed
        })
    }
}

/// Inject the next raw sample seen by every [`MoistureProbe`].
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_moisture_raw(raw: u16) {
    hw_init::sim_set_adc_raw(raw);
}
