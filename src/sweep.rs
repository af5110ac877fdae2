//! Sweep sequencer: the noise-demo state machine.
//!
//! A single saw voice plays through a fixed 9-note frequency sequence.
//! A fast tick (every 1 ms) walks the low-pass cutoff down from 880 Hz in
//! 15 Hz steps; when it falls through the 30 Hz floor the cutoff resets,
//! the voice jumps to the next note, and the background flips between
//! black (first half of the sequence) and red (second half).

use std::sync::{Arc, Mutex};

use crate::params::SweepParams;

const BLACK: [f32; 3] = [0.0, 0.0, 0.0];
const RED: [f32; 3] = [1.0, 0.0, 0.0];

/// Sweep state mutated only by the fixed-tick scheduler
#[derive(Debug, Clone)]
pub struct SweepSequencer {
    params: SweepParams,

    /// Current low-pass cutoff (Hz), decaying toward the floor
    pub cutoff_hz: f32,

    /// Current voice frequency (Hz), stepped on each cutoff reset
    pub frequency_hz: f32,

    /// Next position in the note sequence
    pub step_index: usize,

    /// Current background color (black or red)
    pub background: [f32; 3],
}

/// Snapshot of the values the audio chain and render driver read
#[derive(Debug, Clone, Copy)]
pub struct SweepSnapshot {
    pub cutoff_hz: f32,
    pub frequency_hz: f32,
    pub background: [f32; 3],
}

impl SweepSequencer {
    pub fn new(params: SweepParams) -> Self {
        Self {
            cutoff_hz: params.cutoff_start_hz,
            frequency_hz: params.initial_freq_hz,
            step_index: 0,
            background: BLACK,
            params,
        }
    }

    /// One 1 ms tick: decay the cutoff, or reset it and advance the
    /// sequence.
    ///
    /// The background check uses the post-advance index against half the
    /// sequence length, so the flip to red lands when the index enters
    /// the upper half.
    pub fn tick(&mut self) {
        if self.cutoff_hz > self.params.cutoff_floor_hz {
            self.cutoff_hz -= self.params.cutoff_step_hz;
            return;
        }

        self.cutoff_hz = self.params.cutoff_start_hz;
        self.frequency_hz = self.params.sequence[self.step_index];

        self.step_index += 1;
        if self.step_index == self.params.sequence.len() {
            self.step_index = 0;
        }

        self.background = if (self.step_index as f32) < self.params.sequence.len() as f32 / 2.0 {
            BLACK
        } else {
            RED
        };
    }

    pub fn snapshot(&self) -> SweepSnapshot {
        SweepSnapshot {
            cutoff_hz: self.cutoff_hz,
            frequency_hz: self.frequency_hz,
            background: self.background,
        }
    }
}

/// Shared handle to the sweep sequencer (tick thread writes, render reads)
pub type SharedSweep = Arc<Mutex<SweepSequencer>>;

pub fn shared(params: SweepParams) -> SharedSweep {
    Arc::new(Mutex::new(SweepSequencer::new(params)))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ticks until the next cutoff reset fires (every reset moves the index)
    fn run_to_reset(seq: &mut SweepSequencer) {
        let start_index = seq.step_index;
        let mut ticks = 0;
        while seq.step_index == start_index {
            seq.tick();
            ticks += 1;
            assert!(ticks < 100, "cutoff never reset");
        }
    }

    #[test]
    fn test_initial_state() {
        let seq = SweepSequencer::new(SweepParams::default());

        assert_eq!(seq.cutoff_hz, 880.0);
        assert_eq!(seq.frequency_hz, 440.0);
        assert_eq!(seq.step_index, 0);
        assert_eq!(seq.background, BLACK);
    }

    #[test]
    fn test_cutoff_decays_by_step() {
        let mut seq = SweepSequencer::new(SweepParams::default());

        seq.tick();
        assert_eq!(seq.cutoff_hz, 865.0);
        seq.tick();
        assert_eq!(seq.cutoff_hz, 850.0);
        // The voice holds its note while the cutoff decays
        assert_eq!(seq.frequency_hz, 440.0);
        assert_eq!(seq.step_index, 0);
    }

    #[test]
    fn test_cutoff_resets_after_falling_through_floor() {
        let mut seq = SweepSequencer::new(SweepParams::default());

        // 880 decays past 30 only after dipping to 25 (40 > 30 still decays)
        for _ in 0..57 {
            seq.tick();
        }
        assert_eq!(seq.cutoff_hz, 25.0);

        seq.tick();
        assert_eq!(seq.cutoff_hz, 880.0);
        assert_eq!(seq.frequency_hz, 220.0); // sequence[0]
        assert_eq!(seq.step_index, 1);
    }

    #[test]
    fn test_sequence_order_and_wrap() {
        let mut seq = SweepSequencer::new(SweepParams::default());
        let expected = [220.0, 55.0, 440.0, 330.0, 55.0, 440.0, 110.0, 55.0, 110.0];

        for &note in &expected {
            run_to_reset(&mut seq);
            assert_eq!(seq.frequency_hz, note);
        }

        // After the 9th reset the index wraps to the start
        assert_eq!(seq.step_index, 0);
        run_to_reset(&mut seq);
        assert_eq!(seq.frequency_hz, 220.0);
    }

    #[test]
    fn test_background_flips_per_sequence_half() {
        let mut seq = SweepSequencer::new(SweepParams::default());

        // Resets 1-4 land the index in the lower half: black
        for _ in 0..4 {
            run_to_reset(&mut seq);
            assert_eq!(seq.background, BLACK);
        }

        // Resets 5-8 land it in the upper half: red
        for _ in 0..4 {
            run_to_reset(&mut seq);
            assert_eq!(seq.background, RED);
        }

        // The 9th reset wraps the index to 0: black again
        run_to_reset(&mut seq);
        assert_eq!(seq.step_index, 0);
        assert_eq!(seq.background, BLACK);
    }

    #[test]
    fn test_snapshot_copies_current_values() {
        let mut seq = SweepSequencer::new(SweepParams::default());
        seq.tick();

        let snap = seq.snapshot();
        assert_eq!(snap.cutoff_hz, seq.cutoff_hz);
        assert_eq!(snap.frequency_hz, seq.frequency_hz);
        assert_eq!(snap.background, seq.background);
    }
}
