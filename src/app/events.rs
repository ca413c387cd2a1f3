//! Outbound application events.
//!
//! The control loop and the actuator controller emit these through the
//! [`EventSink`](super::ports::EventSink) port.  The `Display` impl is the
//! exact text published on the telemetry topic.

use core::fmt;

use crate::sensors::moisture::MoistureReading;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// Relay about to close.
    PumpStarting,
    /// Relay open again after a run.
    PumpStopping,
    /// Per-iteration sensor report.
    Reading(MoistureReading),
    /// The consecutive-cycle cap was hit; the pump stays off until the
    /// soil reads wet again.
    CycleLimitReached { cycles: u32 },
}

impl fmt::Display for AppEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PumpStarting => write!(f, "Starting the motor"),
            Self::PumpStopping => write!(f, "Stopping the motor"),
            Self::Reading(r) => write!(
                f,
                "AO raw={} | Voltage={:.2} V | Moisture={:.1}%",
                r.raw, r.voltage, r.percent
            ),
            Self::CycleLimitReached { cycles } => write!(
                f,
                "Cycle limit reached after {} runs, holding the motor off",
                cycles
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_message_format() {
        let e = AppEvent::Reading(MoistureReading {
            raw: 4095,
            voltage: 3.3,
            percent: 0.0,
        });
        assert_eq!(
            e.to_string(),
            "AO raw=4095 | Voltage=3.30 V | Moisture=0.0%"
        );
    }

    #[test]
    fn pump_messages() {
        assert_eq!(AppEvent::PumpStarting.to_string(), "Starting the motor");
        assert_eq!(AppEvent::PumpStopping.to_string(), "Stopping the motor");
    }
}
