#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClimateState {
    Hot,
    Normal,
    Cool,
}

impl ClimateState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hot => "HOT",
            Self::Normal => "NORMAL",
            Self::Cool => "COOL",
        }
    }

    pub fn status_text(self) -> &'static str {
        match self {
            Self::Hot => "HOT - Fan ON",
            Self::Normal => "NORMAL - Fan OFF",
            Self::Cool => "COOL - Fan OFF",
        }
    }

    pub fn indicator(self) -> Indicator {
        match self {
            Self::Hot => Indicator::RED,
            Self::Normal => Indicator::GREEN,
            Self::Cool => Indicator::BLUE,
        }
    }

    pub fn actuator_on(self) -> bool {
        matches!(self, Self::Hot)
    }

    pub fn brightness(self) -> Brightness {
        match self {
            Self::Hot => Brightness {
                hot: 255,
                normal: 0,
                cool: 0,
            },
            Self::Normal => Brightness {
                hot: 0,
                normal: 255,
                cool: 0,
            },
            Self::Cool => Brightness {
                hot: 0,
                normal: 0,
                cool: 255,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Indicator {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

impl Indicator {
    pub const OFF: Self = Self {
        red: false,
        green: false,
        blue: false,
    };
    pub const RED: Self = Self {
        red: true,
        green: false,
        blue: false,
    };
    pub const GREEN: Self = Self {
        red: false,
        green: true,
        blue: false,
    };
    pub const BLUE: Self = Self {
        red: false,
        green: false,
        blue: true,
    };

    pub fn color_name(self) -> &'static str {
        match (self.red, self.green, self.blue) {
            (false, false, false) => "OFF",
            (true, false, false) => "RED",
            (false, true, false) => "GREEN",
            (false, false, true) => "BLUE",
            _ => "MIXED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Brightness {
    pub hot: u8,
    pub normal: u8,
    pub cool: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub temperature_c: f32,
    pub humidity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalSource {
    Status,
    Update,
}

impl EvalSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "STATUS",
            Self::Update => "UPDATE",
        }
    }
}
