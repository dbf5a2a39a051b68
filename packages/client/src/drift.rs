//! Heartbeat drift correction for followers
//!
//! A heartbeat carries the leader's position. When the local position is
//! more than [`DRIFT_THRESHOLD_SECS`] away, the follower snaps to it; there
//! is no smoothing.

/// Maximum tolerated distance from the leader, in seconds
pub const DRIFT_THRESHOLD_SECS: f64 = 0.7;

/// Decision for one heartbeat
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correction {
    /// Close enough; leave playback alone
    InSync { drift: f64 },
    /// Seek to `to`
    Snap { to: f64, drift: f64 },
}

impl Correction {
    pub fn drift(&self) -> f64 {
        match self {
            Correction::InSync { drift } | Correction::Snap { drift, .. } => *drift,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DriftCorrector {
    threshold: f64,
    last_remote_time: Option<f64>,
}

impl DriftCorrector {
    pub fn new() -> Self {
        Self::with_threshold(DRIFT_THRESHOLD_SECS)
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            last_remote_time: None,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Leader position from the most recent heartbeat
    pub fn last_remote_time(&self) -> Option<f64> {
        self.last_remote_time
    }

    /// Record a heartbeat and decide whether to snap
    ///
    /// The comparison is strict: a drift of exactly the threshold is in sync.
    pub fn observe(&mut self, local: f64, remote: f64) -> Correction {
        self.last_remote_time = Some(remote);

        let drift = (local - remote).abs();
        if drift > self.threshold {
            Correction::Snap { to: remote, drift }
        } else {
            Correction::InSync { drift }
        }
    }

    pub fn reset(&mut self) {
        self.last_remote_time = None;
    }
}

impl Default for DriftCorrector {
    fn default() -> Self {
        Self::new()
    }
}
