//! Recording doubles for the hardware and transport traits.

use std::{
    cell::RefCell,
    collections::VecDeque,
    net::Ipv4Addr,
    rc::Rc,
};

use crate::{
    cloud::{HttpResponse, HttpTransport, TransportError},
    network::NetworkLink,
    output::OutputDriver,
    sensor::{ClimateSensor, SensorError},
    types::{Indicator, SensorReading},
};

#[derive(Default)]
struct TransportState {
    requests: Vec<String>,
    responses: VecDeque<HttpResponse>,
    failing: bool,
}

/// Answers queued responses in order, then `200 ""`. Clones share state.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Rc<RefCell<TransportState>>,
}

impl MockTransport {
    pub fn push_response(&self, status: u16, body: &str) {
        self.state.borrow_mut().responses.push_back(HttpResponse {
            status,
            body: body.to_string(),
        });
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.borrow_mut().failing = failing;
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.borrow().requests.clone()
    }

    pub fn clear_requests(&self) {
        self.state.borrow_mut().requests.clear();
    }
}

impl HttpTransport for MockTransport {
    fn get(&mut self, url: &str) -> Result<HttpResponse, TransportError> {
        let mut state = self.state.borrow_mut();
        state.requests.push(url.to_string());
        if state.failing {
            return Err(TransportError("connection refused".to_string()));
        }
        Ok(state.responses.pop_front().unwrap_or(HttpResponse {
            status: 200,
            body: String::new(),
        }))
    }
}

/// Replays scripted readings; the last entry repeats once the script runs out.
#[derive(Clone, Default)]
pub struct MockSensor {
    script: Rc<RefCell<VecDeque<Result<SensorReading, SensorError>>>>,
    measurements: Rc<RefCell<u32>>,
}

impl MockSensor {
    pub fn push(&self, temperature_c: f32, humidity: f32) {
        self.script.borrow_mut().push_back(Ok(SensorReading {
            temperature_c,
            humidity,
        }));
    }

    pub fn push_error(&self, err: SensorError) {
        self.script.borrow_mut().push_back(Err(err));
    }

    pub fn measurements(&self) -> u32 {
        *self.measurements.borrow()
    }
}

impl ClimateSensor for MockSensor {
    fn measure(&mut self) -> Result<SensorReading, SensorError> {
        *self.measurements.borrow_mut() += 1;
        let mut script = self.script.borrow_mut();
        if script.len() > 1 {
            return script.pop_front().unwrap_or(Err(SensorError::Unavailable));
        }
        script.front().cloned().unwrap_or(Err(SensorError::Unavailable))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCall {
    Indicator(Indicator),
    Actuator(bool),
}

#[derive(Clone, Default)]
pub struct MockOutputs {
    calls: Rc<RefCell<Vec<OutputCall>>>,
}

impl MockOutputs {
    pub fn calls(&self) -> Vec<OutputCall> {
        self.calls.borrow().clone()
    }

    pub fn indicator(&self) -> Option<Indicator> {
        self.calls.borrow().iter().rev().find_map(|call| match call {
            OutputCall::Indicator(indicator) => Some(*indicator),
            OutputCall::Actuator(_) => None,
        })
    }

    pub fn actuator(&self) -> Option<bool> {
        self.calls.borrow().iter().rev().find_map(|call| match call {
            OutputCall::Actuator(on) => Some(*on),
            OutputCall::Indicator(_) => None,
        })
    }
}

impl OutputDriver for MockOutputs {
    fn set_indicator(&mut self, indicator: Indicator) {
        self.calls.borrow_mut().push(OutputCall::Indicator(indicator));
    }

    fn set_actuator(&mut self, on: bool) {
        self.calls.borrow_mut().push(OutputCall::Actuator(on));
    }
}

/// Reports connected after `connect_after` polls; `None` never connects.
pub struct MockLink {
    pub connect_after: Option<u32>,
    pub polls: u32,
}

impl NetworkLink for MockLink {
    fn is_connected(&mut self) -> bool {
        self.polls += 1;
        self.connect_after.is_some_and(|after| self.polls > after)
    }

    fn address(&mut self) -> Option<Ipv4Addr> {
        Some(Ipv4Addr::new(192, 168, 4, 20))
    }
}
