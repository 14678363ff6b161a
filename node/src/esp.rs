use std::{
    net::Ipv4Addr,
    thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Context};
use dht_sensor::{dht11, DhtError};
use embedded_svc::{
    http::{client::Client as HttpClient, Method, Status},
    io::Read,
    wifi::{AuthMethod, ClientConfiguration, Configuration},
};
use esp_idf_hal::{
    delay::Ets,
    gpio::{AnyIOPin, AnyOutputPin, IOPin, InputOutput, Output, OutputPin, PinDriver, Pull},
};
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::{modem::Modem, prelude::Peripherals},
    http::client::{Configuration as HttpClientConfiguration, EspHttpConnection},
    log::EspLogger,
    nvs::EspDefaultNvsPartition,
    wifi::EspWifi,
};
use log::{info, warn};

use climate_common::{
    config::NetworkConfig, connect_or_restart, ClimateNode, ClimateSensor, HttpResponse,
    HttpTransport, Indicator, NetworkLink, NodeConfig, OutputDriver, SensorError,
    SensorReading, TransportError,
};

// GPIO assignments: DHT11 data on 15, RGB indicator on 13/12/14, fan relay on 17.
const DHT11_PIN: i32 = 15;
const MAX_RESPONSE_BODY: usize = 1024;

struct Dht11Sensor {
    pin: PinDriver<'static, AnyIOPin, InputOutput>,
    delay: Ets,
}

impl Dht11Sensor {
    fn new(pin: AnyIOPin) -> anyhow::Result<Self> {
        let mut pin = PinDriver::input_output_od(pin)?;
        pin.set_pull(Pull::Up)?;
        pin.set_high()?;

        Ok(Self { pin, delay: Ets })
    }
}

impl ClimateSensor for Dht11Sensor {
    fn measure(&mut self) -> Result<SensorReading, SensorError> {
        self.pin
            .set_high()
            .map_err(|err| SensorError::Pin(format!("{err:?}")))?;

        match dht11::blocking::read(&mut self.delay, &mut self.pin) {
            Ok(reading) => Ok(SensorReading {
                temperature_c: f32::from(reading.temperature),
                humidity: f32::from(reading.relative_humidity),
            }),
            Err(DhtError::Timeout) => Err(SensorError::Timeout),
            Err(DhtError::ChecksumMismatch) => Err(SensorError::Checksum),
            Err(err) => {
                warn!("DHT11 on GPIO{DHT11_PIN} failed: {err:?}");
                Err(SensorError::Pin(format!("{err:?}")))
            }
        }
    }
}

struct GpioOutputs {
    red: PinDriver<'static, AnyOutputPin, Output>,
    green: PinDriver<'static, AnyOutputPin, Output>,
    blue: PinDriver<'static, AnyOutputPin, Output>,
    relay: PinDriver<'static, AnyOutputPin, Output>,
}

impl GpioOutputs {
    fn new(
        red: AnyOutputPin,
        green: AnyOutputPin,
        blue: AnyOutputPin,
        relay: AnyOutputPin,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            red: PinDriver::output(red)?,
            green: PinDriver::output(green)?,
            blue: PinDriver::output(blue)?,
            relay: PinDriver::output(relay)?,
        })
    }

    fn drive(pin: &mut PinDriver<'static, AnyOutputPin, Output>, high: bool, name: &str) {
        let result = if high { pin.set_high() } else { pin.set_low() };
        if let Err(err) = result {
            warn!("failed to drive {name} line: {err:?}");
        }
    }
}

impl OutputDriver for GpioOutputs {
    fn set_indicator(&mut self, indicator: Indicator) {
        Self::drive(&mut self.red, indicator.red, "red");
        Self::drive(&mut self.green, indicator.green, "green");
        Self::drive(&mut self.blue, indicator.blue, "blue");
    }

    fn set_actuator(&mut self, on: bool) {
        Self::drive(&mut self.relay, on, "relay");
    }
}

struct EspHttpTransport {
    timeout: Duration,
}

impl EspHttpTransport {
    fn request(&self, url: &str) -> anyhow::Result<HttpResponse> {
        let conf = HttpClientConfiguration {
            timeout: Some(self.timeout),
            ..Default::default()
        };
        let mut client = HttpClient::wrap(EspHttpConnection::new(&conf)?);
        let request = client.request(Method::Get, url, &[])?;
        let mut response = request.submit().map_err(|e| anyhow!("{e:?}"))?;

        let status = response.status();
        let mut body = Vec::new();
        let mut chunk = [0_u8; 256];

        loop {
            let read = response.read(&mut chunk).map_err(|e| anyhow!("{e:?}"))?;
            if read == 0 {
                break;
            }
            if body.len() + read > MAX_RESPONSE_BODY {
                return Err(anyhow!("response body larger than {MAX_RESPONSE_BODY} bytes"));
            }
            body.extend_from_slice(&chunk[..read]);
        }

        Ok(HttpResponse {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

impl HttpTransport for EspHttpTransport {
    fn get(&mut self, url: &str) -> Result<HttpResponse, TransportError> {
        self.request(url)
            .map_err(|err| TransportError(format!("{err:#}")))
    }
}

struct WifiLink {
    wifi: EspWifi<'static>,
}

impl NetworkLink for WifiLink {
    fn is_connected(&mut self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }

    fn address(&mut self) -> Option<Ipv4Addr> {
        self.wifi
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
            .filter(|ip| !ip.is_unspecified())
    }
}

pub fn run() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    EspLogger::initialize_default();

    let config = build_config();

    let sys_loop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;
    let Peripherals { modem, pins, .. } = Peripherals::take()?;

    let outputs = GpioOutputs::new(
        pins.gpio13.downgrade_output(),
        pins.gpio12.downgrade_output(),
        pins.gpio14.downgrade_output(),
        pins.gpio17.downgrade_output(),
    )
    .context("failed to initialize output lines")?;
    let sensor =
        Dht11Sensor::new(pins.gpio15.downgrade()).context("failed to initialize DHT11")?;

    let mut link = start_wifi(modem, sys_loop, nvs_partition, &config.network)
        .context("wifi startup failed")?;

    connect_or_restart(&mut link, &config.network, thread::sleep, |err| {
        unsafe { esp_idf_svc::sys::esp_restart() };
        err
    })
    .context("wifi connection failed")?;

    let transport = EspHttpTransport {
        timeout: config.cloud.request_timeout(),
    };
    let mut node = ClimateNode::new(&config, transport, sensor, outputs);

    // Keep the wifi driver alive for the program lifetime.
    let _link = link;

    info!("=== climate node running ===");

    let started = Instant::now();
    node.run_until(
        || started.elapsed().as_millis() as u64,
        thread::sleep,
        || true,
    );

    Ok(())
}

fn build_config() -> NodeConfig {
    let mut config = NodeConfig::default();

    config.network.wifi_ssid = option_env!("WIFI_SSID").unwrap_or("CHANGE_ME").to_string();
    config.network.wifi_pass = option_env!("WIFI_PASS").unwrap_or("CHANGE_ME").to_string();
    if let Some(token) = option_env!("CLOUD_AUTH_TOKEN") {
        config.cloud.auth_token = token.to_string();
    }

    config.sanitize();

    if config.cloud.auth_token == "CHANGE_ME" {
        warn!("CLOUD_AUTH_TOKEN was not set at build time; dashboard requests will be rejected");
    }

    config
}

fn start_wifi(
    modem: Modem,
    sys_loop: EspSystemEventLoop,
    nvs_partition: EspDefaultNvsPartition,
    network: &NetworkConfig,
) -> anyhow::Result<WifiLink> {
    let mut wifi = EspWifi::new(modem, sys_loop, Some(nvs_partition))?;

    let auth_method = if network.wifi_pass.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::WPAWPA2Personal
    };

    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: network
            .wifi_ssid
            .as_str()
            .try_into()
            .map_err(|_| anyhow!("wifi ssid too long"))?,
        password: network
            .wifi_pass
            .as_str()
            .try_into()
            .map_err(|_| anyhow!("wifi password too long"))?,
        auth_method,
        ..Default::default()
    }))?;

    wifi.start()?;
    wifi.connect()?;
    info!("connecting to wifi `{}`", network.wifi_ssid);

    Ok(WifiLink { wifi })
}
