use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs, UdpSocket},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use climate_common::{
    connect_or_restart, ClimateNode, ClimateSensor, HttpResponse, HttpTransport,
    Indicator, NetworkLink, NodeConfig, OutputDriver, SensorError, SensorReading,
    TransportError,
};

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let config = load_config()?;
    let running = Arc::new(AtomicBool::new(true));

    let mut worker = {
        let running = running.clone();
        tokio::task::spawn_blocking(move || run_node(config, running))
    };

    tokio::select! {
        joined = &mut worker => return joined.context("climate node task panicked")?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            info!("shutdown requested");
            running.store(false, Ordering::SeqCst);
        }
    }

    worker.await.context("climate node task panicked")?
}

fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn run_node(config: NodeConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let mut link = HostLink::new(&config.cloud.update_url)?;

    connect_or_restart(&mut link, &config.network, thread::sleep, |err| err)
        .context("network link failed; exiting so the supervisor restarts the node")?;

    let transport = ReqwestTransport::new(config.cloud.request_timeout())?;
    let mut node = ClimateNode::new(
        &config,
        transport,
        SimulatedDht11::default(),
        ConsoleOutputs::default(),
    );

    info!("=== climate node simulation running ===");

    let started = Instant::now();
    node.run_until(
        || started.elapsed().as_millis() as u64,
        thread::sleep,
        || running.load(Ordering::SeqCst),
    );
    node.shutdown();

    info!("outputs off, climate node stopped");
    Ok(())
}

fn load_config() -> anyhow::Result<NodeConfig> {
    let mut config = match std::env::var("CLIMATE_CONFIG") {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {path}"))?;
            serde_json::from_str(&raw).with_context(|| format!("invalid config file {path}"))?
        }
        Err(_) => NodeConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.sanitize();

    if config.cloud.auth_token == "CHANGE_ME" {
        warn!("CLOUD_AUTH_TOKEN is not set; dashboard requests will be rejected");
    }

    Ok(config)
}

fn apply_env_overrides<F>(config: &mut NodeConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("CLOUD_UPDATE_URL") {
        config.cloud.update_url = url;
    }
    if let Some(url) = lookup("CLOUD_GET_URL") {
        config.cloud.get_url = url;
    }
    if let Some(token) = lookup("CLOUD_AUTH_TOKEN") {
        config.cloud.auth_token = token;
    }
}

/// Treats the cloud host resolving as "link up".
struct HostLink {
    target: String,
}

impl HostLink {
    fn new(cloud_url: &str) -> anyhow::Result<Self> {
        let url = reqwest::Url::parse(cloud_url)
            .with_context(|| format!("invalid cloud url {cloud_url}"))?;
        let host = url.host_str().context("cloud url has no host")?;
        let port = url.port_or_known_default().unwrap_or(80);

        Ok(Self {
            target: format!("{host}:{port}"),
        })
    }

    fn resolve(&self) -> Option<SocketAddr> {
        self.target
            .to_socket_addrs()
            .ok()?
            .find(SocketAddr::is_ipv4)
    }
}

impl NetworkLink for HostLink {
    fn is_connected(&mut self) -> bool {
        self.resolve().is_some()
    }

    fn address(&mut self) -> Option<Ipv4Addr> {
        let remote = self.resolve()?;
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
        socket.connect(remote).ok()?;

        match socket.local_addr().ok()?.ip() {
            IpAddr::V4(ip) => Some(ip),
            IpAddr::V6(_) => None,
        }
    }
}

struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;

        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&mut self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| TransportError(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|err| TransportError(err.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

/// Stand-in for the DHT11: whole-degree readings sweeping 29-34 C.
#[derive(Default)]
struct SimulatedDht11 {
    tick: u64,
}

impl ClimateSensor for SimulatedDht11 {
    fn measure(&mut self) -> Result<SensorReading, SensorError> {
        self.tick = self.tick.saturating_add(1);

        // Real DHT11s drop the occasional frame.
        if self.tick % 13 == 0 {
            return Err(SensorError::Checksum);
        }

        Ok(SensorReading {
            temperature_c: 29.0 + (self.tick % 6) as f32,
            humidity: 55.0 + (self.tick % 4) as f32,
        })
    }
}

#[derive(Default)]
struct ConsoleOutputs {
    indicator: Indicator,
    relay_on: bool,
}

impl OutputDriver for ConsoleOutputs {
    fn set_indicator(&mut self, indicator: Indicator) {
        if indicator != self.indicator {
            info!("indicator -> {}", indicator.color_name());
        }
        self.indicator = indicator;
    }

    fn set_actuator(&mut self, on: bool) {
        if on != self.relay_on {
            info!("fan relay -> {}", if on { "ON" } else { "OFF" });
        }
        self.relay_on = on;
    }
}
