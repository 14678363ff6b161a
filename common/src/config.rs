use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ControlConfig {
    pub default_threshold_c: i32,
    /// Readings below this are COOL, independent of the threshold.
    pub cool_below_c: i32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            default_threshold_c: 32,
            cool_below_c: 31,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScheduleConfig {
    pub threshold_poll_interval_ms: u64,
    pub publish_interval_ms: u64,
    pub idle_tick_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            threshold_poll_interval_ms: 3_000,
            publish_interval_ms: 8_000,
            idle_tick_ms: 100,
        }
    }
}

impl ScheduleConfig {
    pub fn sanitize(&mut self) {
        self.idle_tick_ms = self.idle_tick_ms.clamp(10, 1_000);
        self.threshold_poll_interval_ms = self.threshold_poll_interval_ms.max(self.idle_tick_ms);
        self.publish_interval_ms = self.publish_interval_ms.max(self.idle_tick_ms);
    }

    pub fn idle_tick(&self) -> Duration {
        Duration::from_millis(self.idle_tick_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CloudConfig {
    pub update_url: String,
    pub get_url: String,
    pub auth_token: String,
    pub error_marker: String,
    pub request_timeout_ms: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            update_url: "http://blynk.cloud/external/api/update".to_string(),
            get_url: "http://blynk.cloud/external/api/get".to_string(),
            auth_token: "CHANGE_ME".to_string(),
            error_marker: "Invalid".to_string(),
            request_timeout_ms: 5_000,
        }
    }
}

impl CloudConfig {
    pub fn sanitize(&mut self) {
        self.auth_token = self.auth_token.trim().to_string();
        for url in [&mut self.update_url, &mut self.get_url] {
            let trimmed = url.trim().trim_end_matches(['?', '&']).to_string();
            *url = trimmed;
        }
        if self.error_marker.is_empty() {
            self.error_marker = "Invalid".to_string();
        }
        self.request_timeout_ms = self.request_timeout_ms.clamp(500, 60_000);
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NetworkConfig {
    pub wifi_ssid: String,
    pub wifi_pass: String,
    pub connect_attempts: u32,
    pub connect_interval_ms: u64,
    pub restart_delay_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: String::new(),
            wifi_pass: String::new(),
            connect_attempts: 20,
            connect_interval_ms: 1_000,
            restart_delay_ms: 2_000,
        }
    }
}

impl NetworkConfig {
    pub fn connect_interval(&self) -> Duration {
        Duration::from_millis(self.connect_interval_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NodeConfig {
    pub network: NetworkConfig,
    pub cloud: CloudConfig,
    pub control: ControlConfig,
    pub schedule: ScheduleConfig,
}

impl NodeConfig {
    pub fn sanitize(&mut self) {
        self.cloud.sanitize();
        self.schedule.sanitize();
        self.network.connect_attempts = self.network.connect_attempts.max(1);
    }
}
