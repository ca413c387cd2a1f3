//! MQTT telemetry adapter.
//!
//! Implements [`TelemetryPort`] over the ESP-IDF MQTT client.  The client
//! owns reconnection (auto-reconnect stays enabled); this adapter only
//! watches the connection events, logs them, and refuses to publish while
//! the broker is unreachable.
//!
//! Publishing only enqueues into the client's outbox; the MQTT task does
//! the network I/O, so a stalled broker never holds up the control loop.
//!
//! On (re)connect a greeting (QoS 1, not retained) is queued ahead of the
//! next message so a subscriber can see the controller come back.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//! - **all other targets**: in-memory broker for host-side simulation.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{info, warn};

use crate::app::ports::TelemetryPort;
use crate::config::{Qos, TelemetryConfig};
use crate::error::TelemetryError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{
    EspMqttClient, EventPayload, MqttClientConfiguration, QoS,
};

pub const GREETING: &str = "Hello from ESP32";

/// Connection flags shared with the client's event callback.
#[derive(Debug, Default)]
struct Link {
    connected: AtomicBool,
    greet: AtomicBool,
}

impl Link {
    fn on_connected(&self) {
        info!("MQTT connected");
        self.connected.store(true, Ordering::Release);
        self.greet.store(true, Ordering::Release);
    }

    fn on_disconnected(&self) {
        info!("MQTT disconnected");
        self.connected.store(false, Ordering::Release);
    }
}

pub struct MqttAdapter {
    link: Arc<Link>,
    #[cfg(target_os = "espidf")]
    client: EspMqttClient<'static>,
    #[cfg(not(target_os = "espidf"))]
    sent: Vec<SimMessage>,
}

/// A message accepted by the simulated broker.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimMessage {
    pub topic: String,
    pub payload: String,
    pub qos: u8,
    pub retain: bool,
}

#[cfg(target_os = "espidf")]
fn qos(q: Qos) -> QoS {
    match q {
        Qos::AtMostOnce => QoS::AtMostOnce,
        Qos::AtLeastOnce => QoS::AtLeastOnce,
        Qos::ExactlyOnce => QoS::ExactlyOnce,
    }
}

impl MqttAdapter {
    /// Create the client and start connecting in the background.
    #[cfg(target_os = "espidf")]
    pub fn connect(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        info!("MQTT: connecting to {}", config.broker_url);
        let link = Arc::new(Link::default());
        let events = Arc::clone(&link);

        let conf = MqttClientConfiguration {
            client_id: Some(config.client_id.as_str()),
            username: (!config.username.is_empty()).then_some(config.username.as_str()),
            password: (!config.password.is_empty()).then_some(config.password.as_str()),
            ..Default::default()
        };

        let client = EspMqttClient::new_cb(&config.broker_url, &conf, move |event| {
            match event.payload() {
                EventPayload::Connected(_) => events.on_connected(),
                EventPayload::Disconnected => events.on_disconnected(),
                EventPayload::Published(id) => info!("Message published, msg_id={}", id),
                EventPayload::Error(e) => log::error!("MQTT_EVENT_ERROR: {:?}", e),
                _ => {}
            }
        })
        .map_err(|e| {
            warn!("MQTT: client init failed: {}", e);
            TelemetryError::NotConnected
        })?;

        Ok(Self { link, client })
    }

    /// Simulated broker, connected immediately.
    #[cfg(not(target_os = "espidf"))]
    pub fn connect(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        info!("MQTT(sim): broker {}", config.broker_url);
        let link = Arc::new(Link::default());
        link.on_connected();
        Ok(Self {
            link,
            sent: Vec::new(),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.link.connected.load(Ordering::Acquire)
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(
        &mut self,
        topic: &str,
        payload: &str,
        q: Qos,
        retain: bool,
    ) -> Result<(), TelemetryError> {
        self.client
            .enqueue(topic, qos(q), retain, payload.as_bytes())
            .map(|_| ())
            .map_err(|e| {
                warn!("MQTT: enqueue error {}", e);
                TelemetryError::PublishFailed
            })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(
        &mut self,
        topic: &str,
        payload: &str,
        q: Qos,
        retain: bool,
    ) -> Result<(), TelemetryError> {
        self.sent.push(SimMessage {
            topic: topic.into(),
            payload: payload.into(),
            qos: q.level(),
            retain,
        });
        Ok(())
    }

    // ── Simulation hooks ──────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_connected(&self, connected: bool) {
        if connected {
            self.link.on_connected();
        } else {
            self.link.on_disconnected();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_sent(&self) -> &[SimMessage] {
        &self.sent
    }
}

impl TelemetryPort for MqttAdapter {
    fn publish(
        &mut self,
        topic: &str,
        payload: &str,
        qos: Qos,
        retain: bool,
    ) -> Result<(), TelemetryError> {
        if !self.is_connected() {
            return Err(TelemetryError::NotConnected);
        }
        if self.link.greet.swap(false, Ordering::AcqRel) {
            // Best-effort; the real message still goes out.
            if let Err(e) = self.platform_publish(topic, GREETING, Qos::AtLeastOnce, false) {
                warn!("MQTT: greeting dropped: {}", e);
            }
        }
        self.platform_publish(topic, payload, qos, retain)
    }
}
