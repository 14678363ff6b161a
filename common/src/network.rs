use std::{net::Ipv4Addr, time::Duration};

use thiserror::Error;

use crate::config::NetworkConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("link not up after {attempts} attempts")]
    Timeout { attempts: u32 },
    #[error("link up but no address assigned")]
    NoAddress,
}

pub trait NetworkLink {
    fn is_connected(&mut self) -> bool;
    fn address(&mut self) -> Option<Ipv4Addr>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl From<&NetworkConfig> for ConnectPolicy {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            attempts: config.connect_attempts,
            interval: config.connect_interval(),
        }
    }
}

/// Polls the link once per `interval` until it is up or `attempts` run out.
pub fn wait_for_link<L, F>(
    link: &mut L,
    policy: ConnectPolicy,
    mut sleep: F,
) -> Result<Ipv4Addr, NetworkError>
where
    L: NetworkLink,
    F: FnMut(Duration),
{
    let mut connected = link.is_connected();
    let mut attempt = 0;

    while !connected && attempt < policy.attempts {
        attempt += 1;
        log::debug!("waiting for link ({attempt}/{})", policy.attempts);
        sleep(policy.interval);
        connected = link.is_connected();
    }

    if !connected {
        return Err(NetworkError::Timeout {
            attempts: policy.attempts,
        });
    }

    link.address().ok_or(NetworkError::NoAddress)
}

/// Connectivity loss is fatal: after `restart_delay` the error goes to `restart`,
/// which reboots the board or hands back the error to exit with.
pub fn connect_or_restart<L, F, R, E>(
    link: &mut L,
    config: &NetworkConfig,
    mut sleep: F,
    restart: R,
) -> Result<Ipv4Addr, E>
where
    L: NetworkLink,
    F: FnMut(Duration),
    R: FnOnce(NetworkError) -> E,
{
    match wait_for_link(link, ConnectPolicy::from(config), &mut sleep) {
        Ok(addr) => {
            log::info!("network up, address {addr}");
            Ok(addr)
        }
        Err(err) => {
            log::error!(
                "network unavailable ({err}); restarting in {} ms",
                config.restart_delay_ms
            );
            sleep(config.restart_delay());
            Err(restart(err))
        }
    }
}
