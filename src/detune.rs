//! Detune scheduler: the spread/intensity state machine at the heart of
//! the demo.
//!
//! Two cadences act on the same state. A slow cycle (every 10 s) steps the
//! spread target through 2, 3, 4, 5 and wraps. A fast tick (every 20 ms)
//! smooths the spread toward the target and derives the detune intensity:
//! while the spread sits inside the lock window the intensity accumulates
//! without bound (the longer the spread stays settled, the more shimmer
//! builds); the moment a target change pulls the spread off-lock, the
//! intensity snaps to the displacement measured in lock-window units.
//!
//! Both the oscillator bank (voice frequencies, filter center) and the
//! render driver (rotation speed, background brightness) read the result.

use std::sync::{Arc, Mutex};

use crate::params::DetuneParams;

/// Detune state mutated only by the fixed-tick scheduler
#[derive(Debug, Clone)]
pub struct DetuneState {
    /// Smoothed spread, converging toward the target (never teleports)
    pub spread: f32,

    /// Current spread target, integer cycling through [target_min, target_max]
    pub target_spread: u32,

    /// Derived shimmer scalar, >= 0, unbounded while settled
    pub detune_intensity: f32,
}

/// Snapshot of the values the other subsystems read (copied under the lock)
#[derive(Debug, Clone, Copy, Default)]
pub struct DetuneSnapshot {
    pub spread: f32,
    pub detune_intensity: f32,
}

impl DetuneState {
    /// Initial state: spread settled on the lowest target, no shimmer yet
    pub fn new(params: &DetuneParams) -> Self {
        Self {
            spread: params.target_min as f32,
            target_spread: params.target_min,
            detune_intensity: 0.0,
        }
    }

    /// Step the spread target one position through its cycle (10 s cadence)
    pub fn advance_target(&mut self, params: &DetuneParams) {
        self.target_spread += 1;
        if self.target_spread > params.target_max {
            self.target_spread = params.target_min;
        }
    }

    /// One 20 ms tick: update the intensity from the current displacement,
    /// then smooth the spread toward the target.
    ///
    /// The displacement is measured before the smoothing step, so a fresh
    /// target change is reflected at full magnitude on the very next tick.
    pub fn tick(&mut self, params: &DetuneParams) {
        let target = self.target_spread as f32;

        let diff = (target - self.spread).abs();
        if diff < params.lock_epsilon {
            self.detune_intensity += params.intensity_step;
        } else {
            self.detune_intensity = diff / params.lock_epsilon;
        }

        self.spread += (target - self.spread) * params.smoothing;
    }

    pub fn snapshot(&self) -> DetuneSnapshot {
        DetuneSnapshot {
            spread: self.spread,
            detune_intensity: self.detune_intensity,
        }
    }
}

/// Shared handle to the detune state.
///
/// The tick and target-advance threads write it; the render driver reads
/// a snapshot each frame. A snapshot may be stale by up to one tick period
/// (20 ms), which the smoothing design absorbs.
pub type SharedDetune = Arc<Mutex<DetuneState>>;

pub fn shared(params: &DetuneParams) -> SharedDetune {
    Arc::new(Mutex::new(DetuneState::new(params)))
}
