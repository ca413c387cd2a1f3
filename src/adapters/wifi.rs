//! WiFi station-mode bring-up.
//!
//! Brings the station interface up before the MQTT client is created.
//! Retries a few times, then gives up; the ESP-IDF driver handles
//! reconnection after that.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::BlockingWifi`.
//! - **all other targets**: no-op, the host network is already up.

use log::info;

use crate::config::WifiConfig;

const CONNECT_ATTEMPTS: u32 = 5;

#[cfg(target_os = "espidf")]
pub type Station = esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>;

/// Host stand-in for the station handle.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug)]
pub struct Station;

#[cfg(target_os = "espidf")]
pub fn connect(
    config: &WifiConfig,
    modem: esp_idf_hal::modem::Modem,
) -> anyhow::Result<Station> {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

    let auth_method = if config.password.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::WPA2Personal
    };
    let wifi_configuration = Configuration::Client(ClientConfiguration {
        ssid: config
            .ssid
            .as_str()
            .try_into()
            .map_err(|_| anyhow::anyhow!("ssid too long"))?,
        password: config
            .password
            .as_str()
            .try_into()
            .map_err(|_| anyhow::anyhow!("password too long"))?,
        auth_method,
        ..Default::default()
    });

    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let mut wifi = BlockingWifi::wrap(EspWifi::new(modem, sys_loop.clone(), Some(nvs))?, sys_loop)?;
    wifi.set_configuration(&wifi_configuration)?;

    let mut attempt = 1;
    loop {
        info!("Wifi connection attempt #{}", attempt);
        let result = wifi
            .start()
            .and_then(|_| wifi.connect())
            .and_then(|_| wifi.wait_netif_up());
        match result {
            Ok(()) => break,
            Err(e) if attempt >= CONNECT_ATTEMPTS => return Err(e.into()),
            Err(e) => {
                log::warn!("Wifi attempt #{} failed: {}", attempt, e);
                let _ = wifi.disconnect();
                attempt += 1;
            }
        }
    }

    info!("Wifi connected to '{}'", config.ssid);
    Ok(wifi)
}

#[cfg(not(target_os = "espidf"))]
pub fn connect(config: &WifiConfig) -> anyhow::Result<Station> {
    info!(
        "WiFi(sim): skipping station bring-up for '{}' ({} attempts on device)",
        config.ssid, CONNECT_ATTEMPTS
    );
    Ok(Station)
}
