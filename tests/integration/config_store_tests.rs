//! Config persistence flow: NVS blob → validated `SystemConfig` → control loop.

use soilpump::adapters::nvs::NvsAdapter;
use soilpump::app::ports::ConfigPort;
use soilpump::app::service::Decision;
use soilpump::config::{Qos, SystemConfig};
use soilpump::error::ConfigError;

use crate::mock_hw::{RigBuilder, Step};

#[test]
fn stored_policy_drives_the_loop() {
    let nvs = NvsAdapter::new().unwrap();
    let mut cfg = SystemConfig::default();
    cfg.policy.run_duration_ms = 3_000;
    cfg.policy.poll_interval_ms = 500;
    cfg.policy.settle_interval_ms = 250;
    nvs.save(&cfg).unwrap();

    let mut rig = RigBuilder::new([4095]);
    rig.config = nvs.load().unwrap();
    let (mut app, trace) = rig.build();

    assert_eq!(app.tick().unwrap().decision, Decision::Ran);
    let holds: Vec<_> = trace
        .borrow()
        .iter()
        .filter_map(|s| match s {
            Step::Hold(ms) => Some(*ms),
            _ => None,
        })
        .collect();
    assert_eq!(holds, vec![3_000, 500, 250]);
}

#[test]
fn json_config_file_round_trips_through_nvs() {
    let json = r#"{
        "calibration": { "supply_voltage": 3.3, "max_raw": 4095, "dry_voltage": 3.0, "wet_voltage": 1.0 },
        "policy": {
            "dry_threshold_voltage": 2.5,
            "run_duration_ms": 8000,
            "poll_interval_ms": 1000,
            "settle_interval_ms": 1000,
            "max_consecutive_cycles": 4
        },
        "telemetry": {
            "broker_url": "mqtts://garden.example:8883",
            "client_id": "bed-2",
            "username": "",
            "password": "",
            "topic": "garden/bed-2",
            "qos": "AtMostOnce",
            "retain": true
        },
        "wifi": { "ssid": "greenhouse", "password": "" },
        "pins": { "moisture_adc_channel": 3, "relay_gpio": 9 },
        "watchdog_timeout_ms": 20000
    }"#;
    let cfg: SystemConfig = serde_json::from_str(json).unwrap();
    assert_eq!(cfg.telemetry.qos, Qos::AtMostOnce);

    let nvs = NvsAdapter::new().unwrap();
    nvs.save(&cfg).unwrap();
    let loaded = nvs.load().unwrap();

    assert_eq!(loaded, cfg);
    assert_eq!(loaded.policy.max_consecutive_cycles, 4);
    assert_eq!(loaded.telemetry.topic.as_str(), "garden/bed-2");
}

#[test]
fn watchdog_shorter_than_an_iteration_is_refused() {
    let nvs = NvsAdapter::new().unwrap();
    let mut cfg = SystemConfig::default();
    cfg.watchdog_timeout_ms = 5_000;

    assert!(matches!(
        nvs.save(&cfg),
        Err(ConfigError::ValidationFailed(_))
    ));
    assert_eq!(nvs.load().unwrap(), SystemConfig::default());
}
