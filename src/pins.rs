//! GPIO / peripheral pin assignments for the HD-38 + relay board.
//!
//! Single source of truth for the default wiring.  [`SystemConfig`](crate::config::SystemConfig)
//! copies these into its `pins` section so a board revision can override
//! them without a rebuild.

// ---------------------------------------------------------------------------
// Moisture sensor (HD-38 analog output)
// ---------------------------------------------------------------------------

/// ADC1 channel wired to the HD-38 AO pin (GPIO3 → ADC1_CH3).  `hw_init`
/// configures it with 12 dB attenuation, roughly 0 – 3.3 V input range.
pub const MOISTURE_ADC_CHANNEL: u32 = 3;

// ---------------------------------------------------------------------------
// Pump relay
// ---------------------------------------------------------------------------

/// Digital output: HIGH = relay closed, pump running.
pub const RELAY_GPIO: i32 = 9;

// ---------------------------------------------------------------------------
// ADC configuration
// ---------------------------------------------------------------------------

/// ADC resolution (bits).  Sets the full-scale raw reading,
/// [`MAX_RAW`](crate::sensors::moisture::MAX_RAW).
pub const ADC_RESOLUTION_BITS: u32 = 12;
