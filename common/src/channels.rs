pub const CHANNEL_THRESHOLD: &str = "V0";

pub const CHANNEL_TEMPERATURE: &str = "V1";
pub const CHANNEL_HUMIDITY: &str = "V2";
pub const CHANNEL_STATUS: &str = "V3";
pub const CHANNEL_HOT: &str = "V4";
pub const CHANNEL_NORMAL: &str = "V5";
pub const CHANNEL_COOL: &str = "V6";
