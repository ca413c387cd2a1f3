//! Best-effort telemetry sink.
//!
//! Implements [`EventSink`] on top of any [`TelemetryPort`]: every event is
//! rendered to text, logged, and published on the configured topic.  A
//! failed publish is logged and counted, never returned, so the control
//! loop cannot be stopped by a broker outage.

use core::fmt::Write;

use log::{info, warn};

use crate::config::{Qos, TelemetryConfig};
use crate::error::TelemetryError;

use super::events::AppEvent;
use super::ports::{EventSink, TelemetryPort};

/// Payload buffer size.  The longest message is the per-iteration reading.
pub const MAX_PAYLOAD: usize = 128;

pub struct TelemetrySink<T> {
    port: T,
    topic: heapless::String<64>,
    qos: Qos,
    retain: bool,
    published: u32,
    failed: u32,
}

impl<T: TelemetryPort> TelemetrySink<T> {
    pub fn new(port: T, config: &TelemetryConfig) -> Self {
        Self {
            port,
            topic: config.topic.clone(),
            qos: config.qos,
            retain: config.retain,
            published: 0,
            failed: 0,
        }
    }

    /// Publishes that went through.
    pub fn published(&self) -> u32 {
        self.published
    }

    /// Publishes that failed (and were dropped).
    pub fn failed(&self) -> u32 {
        self.failed
    }

    pub fn port(&self) -> &T {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut T {
        &mut self.port
    }

    fn try_publish(&mut self, event: &AppEvent) -> Result<(), TelemetryError> {
        let payload = render::<MAX_PAYLOAD>(event)?;
        info!("{}", payload);
        self.port
            .publish(&self.topic, &payload, self.qos, self.retain)
    }
}

/// Format `event` into an `N`-byte buffer.
fn render<const N: usize>(event: &AppEvent) -> Result<heapless::String<N>, TelemetryError> {
    let mut payload = heapless::String::new();
    write!(payload, "{event}").map_err(|_| TelemetryError::PayloadTooLong)?;
    Ok(payload)
}

impl<T: TelemetryPort> EventSink for TelemetrySink<T> {
    fn emit(&mut self, event: &AppEvent) {
        match self.try_publish(event) {
            Ok(()) => self.published = self.published.wrapping_add(1),
            Err(e) => {
                self.failed = self.failed.wrapping_add(1);
                warn!("TELEM | publish to '{}' dropped: {}", self.topic, e);
            }
        }
    }
}
