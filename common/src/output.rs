use crate::types::{ClimateState, Indicator};

pub trait OutputDriver {
    fn set_indicator(&mut self, indicator: Indicator);
    fn set_actuator(&mut self, on: bool);

    fn apply_state(&mut self, state: ClimateState) {
        self.set_indicator(state.indicator());
        self.set_actuator(state.actuator_on());
    }

    fn all_off(&mut self) {
        self.set_indicator(Indicator::OFF);
        self.set_actuator(false);
    }
}
