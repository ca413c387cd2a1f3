//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements            | Connects to              |
//! |------------|-----------------------|--------------------------|
//! | `hardware` | SensorPort, OutputPin | ESP32 ADC1, relay GPIO   |
//! | `mqtt`     | TelemetryPort         | ESP-IDF MQTT client      |
//! | `nvs`      | ConfigPort            | NVS / in-memory blob     |
//! | `time`     | DelayNs               | FreeRTOS / thread sleep  |
//! | `wifi`     | (none)                | ESP-IDF WiFi STA         |

pub mod hardware;
pub mod mqtt;
pub mod nvs;
pub mod time;
pub mod wifi;
