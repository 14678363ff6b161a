use thiserror::Error;

use crate::types::SensorReading;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("sensor did not respond in time")]
    Timeout,
    #[error("checksum mismatch")]
    Checksum,
    #[error("pin error: {0}")]
    Pin(String),
    #[error("sensor unavailable")]
    Unavailable,
}

pub trait ClimateSensor {
    fn measure(&mut self) -> Result<SensorReading, SensorError>;
}
