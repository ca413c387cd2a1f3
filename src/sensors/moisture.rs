//! HD-38 resistive soil-moisture sensor: signal conversion.
//!
//! The analog output rises as the soil dries (probe in air ≈ supply
//! voltage, probe in water ≈ 0.3 V).  Conversion is two linear steps:
//!
//! ```text
//!   raw ──▶ voltage = raw / MAX_RAW · SUPPLY
//!   voltage ──▶ pct = clamp((DRY − v) / (DRY − WET) · 100, 0, 100)
//! ```
//!
//! The free functions use the board's default constants.  [`Calibration`]
//! carries validated constants from [`SystemConfig`](crate::config::SystemConfig)
//! and is what the control loop uses per sample.

use crate::config::CalibrationConfig;
use crate::error::ConfigError;
use crate::pins::ADC_RESOLUTION_BITS;

/// Full-scale reading of the ADC.
pub const MAX_RAW: u16 = ((1u32 << ADC_RESOLUTION_BITS) - 1) as u16;
/// ADC reference voltage.
pub const SUPPLY_VOLTAGE: f32 = 3.3;

/// Scale a raw sample to volts using the board defaults.
///
/// Samples above [`MAX_RAW`] are clamped to full scale.
pub fn raw_to_voltage(sample: u16) -> f32 {
    scale(sample, MAX_RAW, SUPPLY_VOLTAGE)
}

/// Map a sensor voltage to a moisture percentage in `[0, 100]`.
///
/// Fails if `dry <= wet`; the division would be meaningless.  A NaN
/// voltage reports 0 %.
pub fn voltage_to_moisture(voltage: f32, dry: f32, wet: f32) -> Result<f32, ConfigError> {
    check_span(dry, wet)?;
    Ok(percent(voltage, dry, wet))
}

fn scale(sample: u16, max_raw: u16, supply: f32) -> f32 {
    // Divide first so full scale lands exactly on `supply`.
    (sample.min(max_raw) as f32 / max_raw as f32) * supply
}

fn percent(voltage: f32, dry: f32, wet: f32) -> f32 {
    let pct = ((dry - voltage) / (dry - wet)) * 100.0;
    // `clamp` passes NaN through.
    if pct.is_nan() { 0.0 } else { pct.clamp(0.0, 100.0) }
}

fn check_span(dry: f32, wet: f32) -> Result<(), ConfigError> {
    if dry.is_finite() && wet.is_finite() && dry > wet {
        Ok(())
    } else {
        Err(ConfigError::InvalidCalibration)
    }
}

/// One sample and everything derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoistureReading {
    pub raw: u16,
    pub voltage: f32,
    pub percent: f32,
}

/// Validated calibration.  Construction is the only fallible step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    supply_voltage: f32,
    max_raw: u16,
    dry_voltage: f32,
    wet_voltage: f32,
}

impl Calibration {
    pub fn new(
        supply_voltage: f32,
        max_raw: u16,
        dry_voltage: f32,
        wet_voltage: f32,
    ) -> Result<Self, ConfigError> {
        check_span(dry_voltage, wet_voltage)?;
        if !supply_voltage.is_finite() || supply_voltage <= 0.0 {
            return Err(ConfigError::ValidationFailed("supply_voltage must be > 0"));
        }
        if max_raw == 0 {
            return Err(ConfigError::ValidationFailed("max_raw must be > 0"));
        }
        Ok(Self {
            supply_voltage,
            max_raw,
            dry_voltage,
            wet_voltage,
        })
    }

    pub fn supply_voltage(&self) -> f32 {
        self.supply_voltage
    }

    pub fn max_raw(&self) -> u16 {
        self.max_raw
    }

    pub fn voltage(&self, raw: u16) -> f32 {
        scale(raw, self.max_raw, self.supply_voltage)
    }

    pub fn moisture(&self, voltage: f32) -> f32 {
        percent(voltage, self.dry_voltage, self.wet_voltage)
    }

    /// Convert one raw sample into a full reading.
    pub fn reading(&self, raw: u16) -> MoistureReading {
        let voltage = self.voltage(raw);
        MoistureReading {
            raw,
            voltage,
            percent: self.moisture(voltage),
        }
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            supply_voltage: SUPPLY_VOLTAGE,
            max_raw: MAX_RAW,
            dry_voltage: 3.3,
            wet_voltage: 0.3,
        }
    }
}

impl TryFrom<&CalibrationConfig> for Calibration {
    type Error = ConfigError;

    fn try_from(c: &CalibrationConfig) -> Result<Self, Self::Error> {
        Self::new(c.supply_voltage, c.max_raw, c.dry_voltage, c.wet_voltage)
    }
}
