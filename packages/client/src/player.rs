//! Local media playback
//!
//! [`MediaPlayer`] is the seam between the sync logic and whatever actually
//! renders media. [`SimulatedPlayer`] keeps a clock-driven position and is
//! what the headless binary and the tests drive.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::time::Instant;

/// Operations the client needs from a media player
pub trait MediaPlayer: Send + 'static {
    /// Current playback position in seconds
    fn position(&self) -> f64;

    fn is_paused(&self) -> bool;

    fn play(&mut self);

    fn pause(&mut self);

    /// Move the playback position without changing play/pause state
    fn seek(&mut self, to: f64);

    fn set_muted(&mut self, muted: bool);
}

#[derive(Debug)]
struct PlayerState {
    /// Position at `started_at`, or the frozen position while paused
    base: f64,
    started_at: Option<Instant>,
    muted: bool,
}

impl PlayerState {
    fn position(&self) -> f64 {
        match self.started_at {
            Some(started) => self.base + started.elapsed().as_secs_f64(),
            None => self.base,
        }
    }
}

/// Player whose position advances with the tokio clock while playing
///
/// Cloning shares the same playback state, so a test can keep a handle
/// while the client owns another. Starts paused and muted at 0.
#[derive(Debug, Clone)]
pub struct SimulatedPlayer {
    state: Arc<Mutex<PlayerState>>,
}

impl SimulatedPlayer {
    pub fn new() -> Self {
        Self::at(0.0)
    }

    /// Paused player positioned at `position`
    pub fn at(position: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(PlayerState {
                base: position,
                started_at: None,
                muted: true,
            })),
        }
    }

    pub fn is_muted(&self) -> bool {
        self.lock().muted
    }

    fn lock(&self) -> MutexGuard<'_, PlayerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for SimulatedPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaPlayer for SimulatedPlayer {
    fn position(&self) -> f64 {
        self.lock().position()
    }

    fn is_paused(&self) -> bool {
        self.lock().started_at.is_none()
    }

    fn play(&mut self) {
        let mut state = self.lock();
        if state.started_at.is_none() {
            state.started_at = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        let mut state = self.lock();
        if state.started_at.is_some() {
            state.base = state.position();
            state.started_at = None;
        }
    }

    fn seek(&mut self, to: f64) {
        let mut state = self.lock();
        state.base = to;
        if state.started_at.is_some() {
            state.started_at = Some(Instant::now());
        }
    }

    fn set_muted(&mut self, muted: bool) {
        self.lock().muted = muted;
    }
}
