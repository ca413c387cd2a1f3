//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlLoop (domain)
//! ```
//!
//! Driven adapters (sensor, telemetry transport, config storage) implement
//! these traits.  The [`ControlLoop`](super::service::ControlLoop) consumes
//! them via generics, so the domain core never touches hardware directly.
//!
//! The relay output and the blocking delay need no port of their own: the
//! domain takes any `embedded_hal::digital::OutputPin` and
//! `embedded_hal::delay::DelayNs`.

use crate::config::{Qos, SystemConfig};
use crate::error::{ConfigError, HardwareFault, TelemetryError};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per loop iteration.
pub trait SensorPort {
    /// Read one raw ADC sample, nominally in `[0, max_raw]`.
    fn read_raw(&mut self) -> Result<u16, HardwareFault>;
}

// ───────────────────────────────────────────────────────────────
// Telemetry port (driven adapter: domain → message channel)
// ───────────────────────────────────────────────────────────────

/// Publish side of the message channel.  Connection management belongs to
/// the adapter; the domain only ever publishes.
pub trait TelemetryPort {
    fn publish(
        &mut self,
        topic: &str,
        payload: &str,
        qos: Qos,
        retain: bool,
    ) -> Result<(), TelemetryError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Emitting never fails from the caller's point of
/// view; sinks deal with their own transport errors.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting.  Invalid ranges are
/// rejected with [`ConfigError`], not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}
