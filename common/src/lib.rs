pub mod channels;
pub mod cloud;
pub mod config;
pub mod control;
pub mod network;
pub mod node;
pub mod output;
pub mod scheduler;
pub mod sensor;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use channels::*;
pub use cloud::{CloudClient, CloudError, HttpResponse, HttpTransport, TransportError};
pub use config::{CloudConfig, ControlConfig, NetworkConfig, NodeConfig, ScheduleConfig};
pub use control::{parse_threshold, ClimateController, Evaluation, ThresholdError};
pub use network::{connect_or_restart, wait_for_link, ConnectPolicy, NetworkError, NetworkLink};
pub use node::{ClimateNode, ThresholdChange, TickReport};
pub use output::OutputDriver;
pub use scheduler::PeriodicTimer;
pub use sensor::{ClimateSensor, SensorError};
pub use types::{Brightness, ClimateState, EvalSource, Indicator, SensorReading};
