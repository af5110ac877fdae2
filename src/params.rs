//! Parameter definitions with physical units and documented semantics.
//!
//! All magic numbers are collected here with:
//! - Physical units (Hz, seconds, milliseconds)
//! - Documented ranges and meanings
//! - Type safety where possible

/// Detune scheduler parameters (the spread/intensity state machine)
#[derive(Debug, Clone)]
pub struct DetuneParams {
    /// Fast tick interval (milliseconds)
    /// Drives spread smoothing, intensity accumulation, and voice updates
    pub tick_interval_ms: u64,

    /// Slow target-advance interval (seconds)
    /// Each advance moves the spread target one step through its cycle
    pub target_interval_s: u64,

    /// Lowest spread target (inclusive)
    pub target_min: u32,

    /// Highest spread target (inclusive, wraps back to target_min)
    pub target_max: u32,

    /// First-order low-pass coefficient applied per tick:
    /// spread += (target - spread) * smoothing
    pub smoothing: f32,

    /// Lock window: |target - spread| below this counts as "settled"
    pub lock_epsilon: f32,

    /// Intensity gained per tick while settled (unbounded accumulation)
    pub intensity_step: f32,
}

impl Default for DetuneParams {
    fn default() -> Self {
        Self {
            tick_interval_ms: 20,
            target_interval_s: 10,
            target_min: 2,
            target_max: 5,
            smoothing: 0.03,
            lock_epsilon: 0.2,
            intensity_step: 0.02,
        }
    }
}

/// Oscillator bank parameters (the supersaw drone)
#[derive(Debug, Clone)]
pub struct BankParams {
    /// Number of saw voices (20 for the small variants, 100 for the cube)
    pub voice_count: usize,

    /// Fundamental frequency (Hz) that the chord ratios multiply
    pub fundamental_hz: f32,

    /// Chord-ratio sequence applied to the fundamental
    /// {3/2, 4/3, 3/2, 5/4}
    pub chord_ratios: [f32; 4],

    /// Low-pass cutoff (Hz), fixed for the session
    pub lowpass_hz: f32,

    /// Low-pass resonance (Q)
    pub lowpass_q: f32,

    /// Band-pass center floor (Hz): center = floor + intensity * scale
    pub bandpass_floor_hz: f32,

    /// Band-pass center scale (Hz per unit of detune intensity)
    pub bandpass_scale_hz: f32,

    /// Band-pass resonance (Q)
    pub bandpass_q: f32,

    /// Master gain applied after the filter chain
    pub master_gain: f32,
}

impl Default for BankParams {
    fn default() -> Self {
        Self {
            voice_count: 100,
            fundamental_hz: 220.0,
            chord_ratios: [3.0 / 2.0, 4.0 / 3.0, 3.0 / 2.0, 5.0 / 4.0],
            lowpass_hz: 880.0,
            lowpass_q: 0.7,
            bandpass_floor_hz: 100.0,
            bandpass_scale_hz: 100.0,
            bandpass_q: 1.0,
            master_gain: 0.3,
        }
    }
}

impl BankParams {
    /// Chord frequencies (Hz) for the current session
    pub fn base_freqs(&self) -> [f32; 4] {
        let mut freqs = [0.0; 4];
        for (f, ratio) in freqs.iter_mut().zip(self.chord_ratios) {
            *f = self.fundamental_hz * ratio;
        }
        freqs
    }
}

/// Sweep sequencer parameters (the noise-demo variant)
#[derive(Debug, Clone)]
pub struct SweepParams {
    /// Fast tick interval (milliseconds); drives the cutoff decay
    pub tick_interval_ms: u64,

    /// Cutoff the sweep resets to (Hz)
    pub cutoff_start_hz: f32,

    /// Floor (Hz): falling through it triggers the reset + note advance
    pub cutoff_floor_hz: f32,

    /// Cutoff lost per tick (Hz)
    pub cutoff_step_hz: f32,

    /// Low-pass resonance (Q)
    pub q: f32,

    /// Voice frequency before the first reset (Hz)
    pub initial_freq_hz: f32,

    /// Note sequence (Hz) stepped on each cutoff reset; the background is
    /// black over the first half and red over the second
    pub sequence: [f32; 9],

    /// Master gain applied after the filter
    pub master_gain: f32,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1,
            cutoff_start_hz: 880.0,
            cutoff_floor_hz: 30.0,
            cutoff_step_hz: 15.0,
            q: 0.7,
            initial_freq_hz: 440.0,
            sequence: [220.0, 55.0, 440.0, 330.0, 55.0, 440.0, 110.0, 55.0, 110.0],
            master_gain: 0.5,
        }
    }
}

/// Scene variant selection (mesh + topology + tuned constants)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneKind {
    /// Six-face colored cube, 100 voices, full-rate rotation
    Cube,
    /// Single colored triangle, 20 voices, half-rate rotation
    Triangle,
    /// Single point sprite, 20 voices, half-rate rotation
    Point,
    /// Point sprite driven by the sweep sequencer instead of the detune
    /// scheduler: one saw voice, background flips black/red per note half
    Noise,
}

impl SceneKind {
    /// Default voice count for this variant
    pub fn default_voices(&self) -> usize {
        match self {
            SceneKind::Cube => 100,
            SceneKind::Triangle | SceneKind::Point => 20,
            SceneKind::Noise => 1,
        }
    }

    /// Rotation divisor k: angle += dt * intensity / k
    pub fn angle_divisor(&self) -> f32 {
        match self {
            SceneKind::Cube => 1.0,
            SceneKind::Triangle | SceneKind::Point | SceneKind::Noise => 2.0,
        }
    }
}

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane
    pub near_plane: f32,

    /// Far clipping plane
    pub far_plane: f32,

    /// Base view translation along -Z so the object is visible
    pub view_distance: f32,

    /// Fraction of the Z angle applied to the second (Y axis) rotation
    pub y_angle_fraction: f32,

    /// Grayscale brightness per unit of detune intensity:
    /// value = intensity * this (deliberately unclamped)
    pub intensity_to_value: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_degrees: 45.0,
            near_plane: 0.1,
            far_plane: 100.0,
            view_distance: 6.0,
            y_angle_fraction: 0.7,
            intensity_to_value: 5.0,
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height as f32
    }
}

/// Delay before the second restart triggered by a click (seconds)
pub const RESTART_ECHO_DELAY_S: u64 = 5;

/// Audio constants (compile-time, match the output stream setup)
pub mod audio_constants {
    /// Safety limiter: hard clip to ±0.5 to prevent ear damage
    pub const CLIP_LIMIT: f32 = 0.5;
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output directory for frames and audio
    pub output_dir: String,

    /// Frame rate (FPS)
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: "recording".to_string(),
            fps: 60,
        }
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> String {
        format!("{}/frames", self.output_dir)
    }

    /// Audio file path
    pub fn audio_path(&self) -> String {
        format!("{}/audio.wav", self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_freqs_follow_chord_ratios() {
        let params = BankParams::default();
        let freqs = params.base_freqs();

        assert_eq!(freqs[0], 330.0); // 220 * 3/2
        assert_eq!(freqs[2], 330.0);
        assert!((freqs[1] - 220.0 * 4.0 / 3.0).abs() < 1e-4);
        assert_eq!(freqs[3], 275.0); // 220 * 5/4
    }

    #[test]
    fn test_scene_variant_constants() {
        assert_eq!(SceneKind::Cube.default_voices(), 100);
        assert_eq!(SceneKind::Triangle.default_voices(), 20);
        assert_eq!(SceneKind::Cube.angle_divisor(), 1.0);
        assert_eq!(SceneKind::Point.angle_divisor(), 2.0);
    }

    #[test]
    fn test_recording_config_paths() {
        let config = RecordingConfig::new(2.5);
        assert_eq!(config.total_frames(), 150);
        assert_eq!(config.frames_dir(), "recording/frames");
        assert_eq!(config.audio_path(), "recording/audio.wav");
    }
}
