//! One independent audio-visual pipeline instance.
//!
//! Every restart trigger creates a fresh Session with its own scheduler
//! state, synthesis chain, control threads, and rotation accumulator.
//! Sessions deliberately layer: starting a new one does not stop the
//! others. Dropping a Session tears its threads and stream down.

use crate::audio::{AudioSystem, SweepSystem};
use crate::params::{
    BankParams, DetuneParams, RecordingConfig, RenderConfig, SceneKind, SweepParams,
};
use crate::scene::{FrameParams, SceneSystem};

/// The audio engine behind a session: the detune-driven supersaw for the
/// geometric scenes, or the sweep sequencer for the noise demo
enum Engine {
    Detune(AudioSystem),
    Sweep(SweepSystem),
}

pub struct Session {
    scene: SceneSystem,
    engine: Engine,
}

impl Session {
    /// Start a new pipeline instance: audio first (the scheduler lives
    /// there), then a fresh rotation driver for the scene.
    pub fn start(
        kind: SceneKind,
        voice_count: usize,
        render_config: RenderConfig,
        recording_config: Option<RecordingConfig>,
    ) -> Result<Self, String> {
        let engine = match kind {
            SceneKind::Noise => Engine::Sweep(SweepSystem::new(
                SweepParams::default(),
                recording_config,
            )?),
            _ => {
                let detune_params = DetuneParams::default();
                let bank_params = BankParams {
                    voice_count,
                    ..Default::default()
                };
                Engine::Detune(AudioSystem::new(
                    detune_params,
                    bank_params,
                    recording_config,
                )?)
            }
        };

        let scene = SceneSystem::new(kind, render_config);

        Ok(Self { scene, engine })
    }

    /// Advance this session's render driver one animation frame
    pub fn frame(&mut self, now_s: f64) -> FrameParams {
        match &self.engine {
            Engine::Detune(audio) => {
                let snap = audio.snapshot();
                self.scene.frame(now_s, snap)
            }
            Engine::Sweep(sweep) => {
                let snap = sweep.snapshot();
                // The noise demo takes its background from the sequencer
                // halves, not the detune intensity; with no intensity the
                // rotation stays frozen
                let mut frame = self.scene.frame(now_s, Default::default());
                frame.background = snap.background;
                frame
            }
        }
    }

    /// Stop the control threads early (Drop does this too)
    pub fn stop(&self) {
        match &self.engine {
            Engine::Detune(audio) => audio.stop(),
            Engine::Sweep(sweep) => sweep.stop(),
        }
    }
}
