use thiserror::Error;

use crate::{
    channels::{
        CHANNEL_COOL, CHANNEL_HOT, CHANNEL_HUMIDITY, CHANNEL_NORMAL, CHANNEL_STATUS,
        CHANNEL_TEMPERATURE,
    },
    config::ControlConfig,
    types::{ClimateState, EvalSource, SensorReading},
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("not a number: {0:?}")]
    NotNumeric(String),
    #[error("value is not finite")]
    NonFinite,
    #[error("value {0} is out of range")]
    OutOfRange(f64),
}

pub fn parse_threshold(raw: &str) -> Result<i32, ThresholdError> {
    let trimmed = raw.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| ThresholdError::NotNumeric(trimmed.to_string()))?;

    if !value.is_finite() {
        return Err(ThresholdError::NonFinite);
    }

    let truncated = value.trunc();
    if truncated < f64::from(i32::MIN) || truncated > f64::from(i32::MAX) {
        return Err(ThresholdError::OutOfRange(value));
    }

    Ok(truncated as i32)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub source: EvalSource,
    pub reading: SensorReading,
    pub threshold_c: i32,
    pub state: ClimateState,
    pub log_line: Option<String>,
}

impl Evaluation {
    pub fn publications(&self) -> [(&'static str, String); 6] {
        let brightness = self.state.brightness();
        [
            (CHANNEL_TEMPERATURE, self.reading.temperature_c.to_string()),
            (CHANNEL_HUMIDITY, self.reading.humidity.to_string()),
            (CHANNEL_STATUS, self.state.status_text().to_string()),
            (CHANNEL_HOT, brightness.hot.to_string()),
            (CHANNEL_NORMAL, brightness.normal.to_string()),
            (CHANNEL_COOL, brightness.cool.to_string()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct ClimateController {
    config: ControlConfig,
    threshold_c: i32,
    last_status: Option<ClimateState>,
}

impl ClimateController {
    pub fn new(config: ControlConfig) -> Self {
        Self {
            threshold_c: config.default_threshold_c,
            config,
            last_status: None,
        }
    }

    pub fn threshold_c(&self) -> i32 {
        self.threshold_c
    }

    pub fn last_status(&self) -> Option<ClimateState> {
        self.last_status
    }

    /// Returns true when the threshold actually changed.
    pub fn set_threshold(&mut self, threshold_c: i32) -> bool {
        if self.threshold_c == threshold_c {
            return false;
        }
        self.threshold_c = threshold_c;
        true
    }

    pub fn classify(&self, temperature_c: f32) -> ClimateState {
        if temperature_c >= self.threshold_c as f32 {
            ClimateState::Hot
        } else if temperature_c < self.config.cool_below_c as f32 {
            ClimateState::Cool
        } else {
            // Unreachable when threshold <= cool_below_c.
            ClimateState::Normal
        }
    }

    pub fn evaluate(&mut self, reading: SensorReading, source: EvalSource) -> Evaluation {
        let state = self.classify(reading.temperature_c);

        let log_line = if source == EvalSource::Update || self.last_status != Some(state) {
            self.last_status = Some(state);
            Some(format!(
                "[{}] temperature: {} C | humidity: {}% | threshold: {} C | {} | LED: {}",
                source.as_str(),
                reading.temperature_c,
                reading.humidity,
                self.threshold_c,
                state.status_text(),
                state.indicator().color_name(),
            ))
        } else {
            None
        };

        Evaluation {
            source,
            reading,
            threshold_c: self.threshold_c,
            state,
            log_line,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::types::{Brightness, Indicator};

    fn reading(temperature_c: f32) -> SensorReading {
        SensorReading {
            temperature_c,
            humidity: 60.0,
        }
    }

    fn controller_at(threshold_c: i32) -> ClimateController {
        let mut controller = ClimateController::new(ControlConfig::default());
        controller.set_threshold(threshold_c);
        controller
    }

    #[test]
    fn scenarios_at_default_threshold() {
        let mut controller = ClimateController::new(ControlConfig::default());
        assert_eq!(controller.threshold_c(), 32);

        let hot = controller.evaluate(reading(33.0), EvalSource::Status);
        assert_eq!(hot.state, ClimateState::Hot);
        assert_eq!(hot.state.indicator(), Indicator::RED);
        assert!(hot.state.actuator_on());
        assert_eq!(
            hot.state.brightness(),
            Brightness {
                hot: 255,
                normal: 0,
                cool: 0
            }
        );

        let cool = controller.evaluate(reading(30.0), EvalSource::Status);
        assert_eq!(cool.state, ClimateState::Cool);
        assert_eq!(cool.state.indicator(), Indicator::BLUE);
        assert!(!cool.state.actuator_on());
        assert_eq!(
            cool.state.brightness(),
            Brightness {
                hot: 0,
                normal: 0,
                cool: 255
            }
        );

        let normal = controller.evaluate(reading(31.0), EvalSource::Status);
        assert_eq!(normal.state, ClimateState::Normal);
        assert_eq!(normal.state.indicator(), Indicator::GREEN);
        assert!(!normal.state.actuator_on());
        assert_eq!(
            normal.state.brightness(),
            Brightness {
                hot: 0,
                normal: 255,
                cool: 0
            }
        );
    }

    #[test]
    fn classification_holds_across_ranges() {
        for threshold in 20..=40 {
            let controller = controller_at(threshold);
            for tenths in 100..=450 {
                let temp = tenths as f32 / 10.0;
                let state = controller.classify(temp);
                let expected = if temp >= threshold as f32 {
                    ClimateState::Hot
                } else if temp < 31.0 {
                    ClimateState::Cool
                } else {
                    ClimateState::Normal
                };
                assert_eq!(state, expected, "temp {temp} threshold {threshold}");
            }
        }
    }

    #[test]
    fn normal_unreachable_when_threshold_at_or_below_split() {
        let controller = controller_at(31);
        assert_eq!(controller.classify(30.9), ClimateState::Cool);
        assert_eq!(controller.classify(31.0), ClimateState::Hot);

        let controller = controller_at(28);
        assert_eq!(controller.classify(27.0), ClimateState::Cool);
        assert_eq!(controller.classify(29.0), ClimateState::Hot);
    }

    #[test]
    fn repeated_status_does_not_log_twice() {
        let mut controller = ClimateController::new(ControlConfig::default());

        let first = controller.evaluate(reading(33.0), EvalSource::Status);
        let second = controller.evaluate(reading(33.0), EvalSource::Status);
        let third = controller.evaluate(reading(34.0), EvalSource::Status);

        assert!(first.log_line.is_some());
        assert_eq!(second.log_line, None);
        assert_eq!(third.log_line, None);
        assert_eq!(controller.last_status(), Some(ClimateState::Hot));
    }

    #[test]
    fn state_change_logs_again() {
        let mut controller = ClimateController::new(ControlConfig::default());

        controller.evaluate(reading(33.0), EvalSource::Status);
        let changed = controller.evaluate(reading(30.0), EvalSource::Status);

        assert!(changed.log_line.is_some());
        assert_eq!(controller.last_status(), Some(ClimateState::Cool));
    }

    #[test]
    fn update_always_logs() {
        let mut controller = ClimateController::new(ControlConfig::default());

        controller.evaluate(reading(33.0), EvalSource::Status);
        let update = controller.evaluate(reading(33.0), EvalSource::Update);

        assert_eq!(
            update.log_line.as_deref(),
            Some("[UPDATE] temperature: 33 C | humidity: 60% | threshold: 32 C | HOT - Fan ON | LED: RED")
        );
    }

    #[test]
    fn threshold_drop_moves_normal_to_hot() {
        let mut controller = ClimateController::new(ControlConfig::default());
        let before = controller.evaluate(reading(31.0), EvalSource::Status);
        assert_eq!(before.state, ClimateState::Normal);

        assert!(controller.set_threshold(30));
        assert!(!controller.set_threshold(30));

        let after = controller.evaluate(reading(31.0), EvalSource::Update);
        assert_eq!(after.state, ClimateState::Hot);
        assert_eq!(after.threshold_c, 30);
        assert!(after.log_line.is_some());
    }

    #[test]
    fn publications_follow_channel_order() {
        let mut controller = ClimateController::new(ControlConfig::default());
        let evaluation = controller.evaluate(
            SensorReading {
                temperature_c: 30.0,
                humidity: 55.0,
            },
            EvalSource::Status,
        );

        let published: Vec<(&str, String)> = evaluation.publications().into_iter().collect();
        assert_eq!(
            published,
            vec![
                ("V1", "30".to_string()),
                ("V2", "55".to_string()),
                ("V3", "COOL - Fan OFF".to_string()),
                ("V4", "0".to_string()),
                ("V5", "0".to_string()),
                ("V6", "255".to_string()),
            ]
        );
    }

    #[test]
    fn parses_threshold_with_truncation() {
        assert_eq!(parse_threshold("28.0"), Ok(28));
        assert_eq!(parse_threshold(" 28.9\n"), Ok(28));
        assert_eq!(parse_threshold("-3.7"), Ok(-3));
        assert_eq!(parse_threshold("35"), Ok(35));
    }

    #[test]
    fn rejects_malformed_threshold() {
        assert_eq!(
            parse_threshold("warm"),
            Err(ThresholdError::NotNumeric("warm".to_string()))
        );
        assert_eq!(parse_threshold("inf"), Err(ThresholdError::NonFinite));
        assert_eq!(parse_threshold("NaN"), Err(ThresholdError::NonFinite));
        assert!(matches!(
            parse_threshold("1e12"),
            Err(ThresholdError::OutOfRange(_))
        ));
    }
}
