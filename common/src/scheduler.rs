#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicTimer {
    interval_ms: u64,
    last_ms: Option<u64>,
}

impl PeriodicTimer {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_ms: None,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn last_ms(&self) -> Option<u64> {
        self.last_ms
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        self.last_ms
            .map(|last| now_ms.saturating_sub(last) >= self.interval_ms)
            .unwrap_or(true)
    }

    pub fn mark(&mut self, now_ms: u64) {
        self.last_ms = Some(now_ms);
    }
}
