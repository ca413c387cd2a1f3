//! System configuration parameters
//!
//! All tunable parameters for the irrigation controller: calibration,
//! run policy, telemetry channel, Wi-Fi credentials and pin assignments.
//! Values can be overridden via NVS (see [`NvsAdapter`](crate::adapters::nvs::NvsAdapter)).
//!
//! The config is built once at startup, validated, and then handed to the
//! [`ControlLoop`](crate::app::service::ControlLoop) by reference.

use core::num::NonZeroU32;

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pins;
use crate::sensors::moisture::Calibration;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub calibration: CalibrationConfig,
    pub policy: RunPolicy,
    pub telemetry: TelemetryConfig,
    pub wifi: WifiConfig,
    pub pins: PinConfig,
    /// Task watchdog timeout.  Must outlast one full loop iteration.
    pub watchdog_timeout_ms: u32,
}

/// Sensor calibration constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// ADC reference / supply voltage (V).
    pub supply_voltage: f32,
    /// Full-scale raw reading of the converter.
    pub max_raw: u16,
    /// Sensor output with the probe in air (V).
    pub dry_voltage: f32,
    /// Sensor output with the probe fully in water (V).
    pub wet_voltage: f32,
}

/// When and for how long the pump runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunPolicy {
    /// Voltage at or above which the substrate counts as dry.
    pub dry_threshold_voltage: f32,
    /// How long the pump runs once triggered.
    pub run_duration_ms: u32,
    /// Wait after reporting, before the output safety reset.
    pub poll_interval_ms: u32,
    /// Wait after the output safety reset, before the next sample.
    pub settle_interval_ms: u32,
    /// Cap on back-to-back actuation cycles while the soil stays dry.
    /// `0` = unlimited.
    pub max_consecutive_cycles: u32,
}

impl RunPolicy {
    /// Run duration as the non-zero type the actuator requires.
    pub fn run_duration(&self) -> Result<NonZeroU32, ConfigError> {
        NonZeroU32::new(self.run_duration_ms)
            .ok_or(ConfigError::ValidationFailed("run_duration_ms must be > 0"))
    }

    /// Worst-case wall time of one loop iteration (ms).
    ///
    /// Telemetry adds nothing: publishes are queued for the MQTT task and
    /// never wait on the network.
    pub fn iteration_budget_ms(&self) -> u64 {
        u64::from(self.run_duration_ms)
            + u64::from(self.poll_interval_ms)
            + u64::from(self.settle_interval_ms)
    }
}

/// MQTT quality-of-service level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Qos {
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

impl Qos {
    pub const fn level(self) -> u8 {
        match self {
            Self::AtMostOnce => 0,
            Self::AtLeastOnce => 1,
            Self::ExactlyOnce => 2,
        }
    }
}

impl TryFrom<u8> for Qos {
    type Error = ConfigError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Self::AtMostOnce),
            1 => Ok(Self::AtLeastOnce),
            2 => Ok(Self::ExactlyOnce),
            _ => Err(ConfigError::ValidationFailed("qos must be 0, 1 or 2")),
        }
    }
}

/// Telemetry channel (MQTT broker) settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub broker_url: String<64>,
    pub client_id: String<32>,
    pub username: String<32>,
    pub password: String<64>,
    pub topic: String<64>,
    pub qos: Qos,
    pub retain: bool,
}

/// Station-mode Wi-Fi credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WifiConfig {
    pub ssid: String<32>,
    pub password: String<64>,
}

/// Channel / GPIO assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinConfig {
    pub moisture_adc_channel: u32,
    pub relay_gpio: i32,
}

fn fixed<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    // Defaults below are compile-time literals well inside capacity.
    let _ = out.push_str(s);
    out
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            calibration: CalibrationConfig {
                supply_voltage: 3.3,
                max_raw: 4095, // 12-bit
                dry_voltage: 3.3,
                wet_voltage: 0.3,
            },
            policy: RunPolicy {
                dry_threshold_voltage: 3.3,
                run_duration_ms: 10_000,
                poll_interval_ms: 2_000,
                settle_interval_ms: 2_000,
                max_consecutive_cycles: 0,
            },
            telemetry: TelemetryConfig {
                broker_url: fixed("mqtt://broker.local"),
                client_id: fixed("soilpump"),
                username: String::new(),
                password: String::new(),
                topic: fixed("/topic/test"),
                qos: Qos::AtLeastOnce,
                retain: false,
            },
            wifi: WifiConfig {
                ssid: String::new(),
                password: String::new(),
            },
            pins: PinConfig {
                moisture_adc_channel: pins::MOISTURE_ADC_CHANNEL,
                relay_gpio: pins::RELAY_GPIO,
            },
            watchdog_timeout_ms: 30_000,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Called before the control loop is built
    /// and before any config is persisted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cal = Calibration::try_from(&self.calibration)?;
        let policy = &self.policy;

        policy.run_duration()?;
        if !policy.dry_threshold_voltage.is_finite()
            || policy.dry_threshold_voltage <= 0.0
            || policy.dry_threshold_voltage > cal.supply_voltage()
        {
            return Err(ConfigError::ValidationFailed(
                "dry_threshold_voltage must be within (0, supply_voltage]",
            ));
        }
        if u64::from(self.watchdog_timeout_ms) <= policy.iteration_budget_ms() {
            return Err(ConfigError::ValidationFailed(
                "watchdog_timeout_ms must exceed run + poll + settle",
            ));
        }

        let t = &self.telemetry;
        if !(t.broker_url.starts_with("mqtt://") || t.broker_url.starts_with("mqtts://")) {
            return Err(ConfigError::ValidationFailed(
                "broker_url must start with mqtt:// or mqtts://",
            ));
        }
        if t.topic.is_empty() {
            return Err(ConfigError::ValidationFailed("topic must not be empty"));
        }

        if !self.wifi.ssid.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
            return Err(ConfigError::ValidationFailed(
                "ssid must be printable ASCII",
            ));
        }
        if !self.wifi.password.is_empty() && self.wifi.password.len() < 8 {
            return Err(ConfigError::ValidationFailed(
                "wifi password must be empty or at least 8 bytes",
            ));
        }
        Ok(())
    }
}
