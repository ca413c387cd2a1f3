//! Soilpump Firmware: Main Entry Point
//!
//! HD-38 soil-moisture sensor driving a relay pump, with MQTT telemetry.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   RelayPin      MqttAdapter     SystemDelay   │
//! │  (SensorPort)      (OutputPin)   (TelemetryPort) (DelayNs)     │
//! │  NvsAdapter (ConfigPort)         wifi (STA bring-up)           │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          ControlLoop (pure logic)                      │    │
//! │  │  Calibration · CycleLimiter · ActuatorController       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Watchdog (fed once per iteration)                             │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::{error, info, warn};

use soilpump::adapters::hardware::{HardwareAdapter, RelayPin};
use soilpump::adapters::mqtt::MqttAdapter;
use soilpump::adapters::nvs::NvsAdapter;
use soilpump::adapters::time::SystemDelay;
use soilpump::adapters::wifi;
use soilpump::app::ports::ConfigPort;
use soilpump::app::service::ControlLoop;
use soilpump::app::telemetry::TelemetrySink;
use soilpump::config::SystemConfig;
use soilpump::drivers::hw_init;
use soilpump::drivers::watchdog::Watchdog;
use soilpump::sensors::MoistureProbe;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }

    info!("Soilpump v{}: HD-38 humidity + motor", env!("CARGO_PKG_VERSION"));

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = load_config();

    // ── 3. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals(&config.pins).context("peripheral init")?;

    // ── 4. Network + telemetry channel ────────────────────────
    #[cfg(target_os = "espidf")]
    let _station = {
        let peripherals = esp_idf_hal::peripherals::Peripherals::take()?;
        wifi::connect(&config.wifi, peripherals.modem)?
    };
    #[cfg(not(target_os = "espidf"))]
    let _station = wifi::connect(&config.wifi)?;

    let mqtt = MqttAdapter::connect(&config.telemetry)
        .map_err(|e| anyhow::anyhow!("MQTT client: {e}"))?;
    let sink = TelemetrySink::new(mqtt, &config.telemetry);

    // ── 5. Control loop ───────────────────────────────────────
    let sensor = HardwareAdapter::new(MoistureProbe::new(config.pins.moisture_adc_channel));
    let relay = RelayPin::new(config.pins.relay_gpio);
    let mut app = ControlLoop::new(&config, sensor, relay, sink, SystemDelay::new())
        .map_err(|e| anyhow::anyhow!("control loop: {e}"))?;

    let watchdog = Watchdog::new(config.watchdog_timeout_ms);

    info!("System ready. Entering control loop.");

    // ── 6. Loop ───────────────────────────────────────────────
    loop {
        #[cfg(not(target_os = "espidf"))]
        sim_drive_sensor(app.tick_count());

        match app.tick() {
            Ok(it) => log::debug!("tick {}: {:?}", app.tick_count(), it.decision),
            Err(e) => {
                error!("Fatal: {}, stopping", e);
                return Err(anyhow::anyhow!("control loop: {e}"));
            }
        }
        watchdog.feed();
    }
}

/// Stored config if it loads and validates, defaults otherwise.
///
/// On the host a JSON file given as the first argument replaces NVS.
fn load_config() -> SystemConfig {
    #[cfg(not(target_os = "espidf"))]
    if let Some(path) = std::env::args().nth(1) {
        match std::fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|s| {
                serde_json::from_str::<SystemConfig>(&s).map_err(|e| anyhow::anyhow!("{e}"))
            })
        {
            Ok(cfg) => {
                info!("Config loaded from {}", path);
                return cfg;
            }
            Err(e) => warn!("Config file {} unusable ({}), using defaults", path, e),
        }
    }

    match NvsAdapter::new().and_then(|nvs| nvs.load()) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    }
}

/// Simulated soil: dries out step by step, soaked again after each run.
#[cfg(not(target_os = "espidf"))]
fn sim_drive_sensor(tick: u64) {
    const STEPS: u64 = 8;
    let raw = ((tick % STEPS + 1) * 4095 / STEPS) as u16;
    soilpump::sensors::sim_set_moisture_raw(raw);
}
