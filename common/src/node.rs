use std::time::Duration;

use log::{info, warn};

use crate::{
    channels::CHANNEL_THRESHOLD,
    cloud::{CloudClient, HttpTransport},
    config::NodeConfig,
    control::{parse_threshold, ClimateController, Evaluation},
    output::OutputDriver,
    scheduler::PeriodicTimer,
    sensor::ClimateSensor,
    types::{EvalSource, SensorReading},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdChange {
    pub from_c: i32,
    pub to_c: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub threshold_change: Option<ThresholdChange>,
    pub evaluations: Vec<Evaluation>,
}

pub struct ClimateNode<T, S, O> {
    controller: ClimateController,
    cloud: CloudClient<T>,
    sensor: S,
    outputs: O,
    threshold_timer: PeriodicTimer,
    publish_timer: PeriodicTimer,
    idle_tick: Duration,
}

impl<T, S, O> ClimateNode<T, S, O>
where
    T: HttpTransport,
    S: ClimateSensor,
    O: OutputDriver,
{
    pub fn new(config: &NodeConfig, transport: T, sensor: S, mut outputs: O) -> Self {
        outputs.all_off();

        Self {
            controller: ClimateController::new(config.control.clone()),
            cloud: CloudClient::new(config.cloud.clone(), transport),
            sensor,
            outputs,
            threshold_timer: PeriodicTimer::new(config.schedule.threshold_poll_interval_ms),
            publish_timer: PeriodicTimer::new(config.schedule.publish_interval_ms),
            idle_tick: config.schedule.idle_tick(),
        }
    }

    pub fn controller(&self) -> &ClimateController {
        &self.controller
    }

    pub fn tick(&mut self, now_ms: u64) -> TickReport {
        let mut report = TickReport::default();

        if self.threshold_timer.is_due(now_ms) {
            self.poll_threshold(&mut report);
            self.threshold_timer.mark(now_ms);
        }

        if self.publish_timer.is_due(now_ms) {
            match self.sensor.measure() {
                Ok(reading) => {
                    report
                        .evaluations
                        .push(self.apply(reading, EvalSource::Status));
                    self.publish_timer.mark(now_ms);
                }
                Err(err) => warn!("sensor error: {err}"),
            }
        }

        report
    }

    pub fn run_until<C, D, K>(&mut self, mut clock: C, mut sleep: D, mut keep_running: K)
    where
        C: FnMut() -> u64,
        D: FnMut(Duration),
        K: FnMut() -> bool,
    {
        while keep_running() {
            let now_ms = clock();
            self.tick(now_ms);
            sleep(self.idle_tick);
        }
    }

    pub fn shutdown(&mut self) {
        self.outputs.all_off();
    }

    fn poll_threshold(&mut self, report: &mut TickReport) {
        let raw = match self.cloud.fetch(CHANNEL_THRESHOLD) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(err) => {
                warn!("threshold fetch failed: {err}");
                return;
            }
        };

        let threshold_c = match parse_threshold(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!("invalid threshold value from cloud {raw:?}: {err}");
                return;
            }
        };

        let from_c = self.controller.threshold_c();
        if !self.controller.set_threshold(threshold_c) {
            return;
        }

        info!("[UPDATE] new threshold from cloud: {threshold_c} C");
        report.threshold_change = Some(ThresholdChange {
            from_c,
            to_c: threshold_c,
        });

        match self.sensor.measure() {
            Ok(reading) => report
                .evaluations
                .push(self.apply(reading, EvalSource::Update)),
            Err(err) => warn!("sensor error during threshold update: {err}"),
        }
    }

    fn apply(&mut self, reading: SensorReading, source: EvalSource) -> Evaluation {
        let evaluation = self.controller.evaluate(reading, source);

        self.outputs.apply_state(evaluation.state);

        if let Some(line) = &evaluation.log_line {
            info!("{line}");
        }

        for (key, value) in evaluation.publications() {
            if let Err(err) = self.cloud.send(key, &value) {
                warn!("failed to publish {key}: {err}");
            }
        }

        evaluation
    }
}
