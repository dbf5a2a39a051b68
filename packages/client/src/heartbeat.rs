//! Leader heartbeat cadence

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Default heartbeat period
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(3000);

/// Interval timer that can be disarmed
///
/// While disarmed, [`tick`](Self::tick) never completes. Arming starts a
/// fresh period, so the first tick comes one full period after arming.
#[derive(Debug)]
pub struct HeartbeatTimer {
    period: Duration,
    interval: Option<Interval>,
}

impl HeartbeatTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    /// Start ticking; no-op if already armed
    pub fn arm(&mut self) {
        if self.interval.is_none() {
            let mut interval = interval_at(Instant::now() + self.period, self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.interval = Some(interval);
        }
    }

    pub fn disarm(&mut self) {
        self.interval = None;
    }

    /// Arm or disarm to match `armed`
    pub fn set_armed(&mut self, armed: bool) {
        if armed {
            self.arm();
        } else {
            self.disarm();
        }
    }

    /// Wait for the next tick
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending().await,
        }
    }
}

impl Default for HeartbeatTimer {
    fn default() -> Self {
        Self::new(DEFAULT_HEARTBEAT_INTERVAL)
    }
}
