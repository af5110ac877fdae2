//! Supersaw oscillator bank and filter chain.
//!
//! Topology (fixed for the session, built once at start):
//! N saw voices -> per-voice gain -> low-pass -> band-pass -> output.
//!
//! Voice frequencies and the band-pass center are rewritten every 20 ms
//! tick from the shared detune state; the sample loop only reads them.

use std::f32::consts::PI;

use crate::detune::DetuneSnapshot;
use crate::params::{BankParams, SweepParams};

/// Filter type (the two stages the demo chain uses)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Lowpass,
    Bandpass,
}

/// 2nd-order IIR filter, Direct Form II Transposed.
///
/// Coefficient formulas from the Audio EQ Cookbook, matching WebAudio
/// BiquadFilterNode behavior.
#[derive(Debug, Clone)]
pub struct Biquad {
    kind: FilterKind,
    frequency: f32,
    q: f32,
    sample_rate: f32,

    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    z1: f32,
    z2: f32,
}

impl Biquad {
    pub fn new(kind: FilterKind, frequency: f32, q: f32, sample_rate: f32) -> Self {
        let mut f = Self {
            kind,
            frequency,
            q,
            sample_rate,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
        };
        f.update_coefficients();
        f
    }

    /// Retune the center/cutoff frequency (state is kept, no reconnection)
    pub fn set_frequency(&mut self, frequency: f32) {
        // Keep the center in the representable band; the intensity feeding
        // this is unbounded by design
        self.frequency = frequency.clamp(1.0, self.sample_rate * 0.49);
        self.update_coefficients();
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    fn update_coefficients(&mut self) {
        let w0 = 2.0 * PI * self.frequency / self.sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * self.q);

        let (b0, b1, b2, a0, a1, a2) = match self.kind {
            FilterKind::Lowpass => {
                let b1 = 1.0 - cos_w0;
                let b0 = b1 / 2.0;
                (b0, b1, b0, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
            }
            FilterKind::Bandpass => {
                (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
            }
        };

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }
}

/// One saw-wave tone generator (naive phase accumulator)
#[derive(Debug, Clone)]
pub struct SawVoice {
    /// Current frequency (Hz), rewritten every tick
    pub frequency: f32,
    phase: f32,
}

impl SawVoice {
    pub fn new() -> Self {
        Self {
            frequency: 0.0,
            phase: 0.0,
        }
    }

    /// Next sample in [-1, 1]
    #[inline]
    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        let sample = 2.0 * self.phase - 1.0;
        // rem_euclid keeps the phase in [0, 1) even when the detune wobble
        // drives the frequency negative
        self.phase = (self.phase + self.frequency / sample_rate).rem_euclid(1.0);
        sample
    }
}

/// Frequency of voice `i` of `n` for the current detune state.
///
/// `spread` fans the voices out across harmonics of a quarter of the chord
/// tone (the float remainder keeps the fan ragged as the spread glides);
/// the sine term wobbles each voice on its own phase, scaled by the
/// accumulated detune intensity. Finite for all finite inputs.
pub fn voice_frequency(
    i: usize,
    n: usize,
    base_hz: f32,
    elapsed_ms: f64,
    snap: DetuneSnapshot,
) -> f32 {
    let fan = (i as f32) % (4.0 * snap.spread) / 4.0;
    let wobble = (elapsed_ms as f32 / 1000.0 + i as f32 / n as f32 * PI).sin();
    base_hz * fan + wobble * snap.detune_intensity
}

/// The oscillator bank: voices, gains, and the filter chain
pub struct OscillatorBank {
    voices: Vec<SawVoice>,
    /// Per-voice gain (equal share so the sum stays bounded)
    voice_gain: f32,
    lowpass: Biquad,
    bandpass: Biquad,
    base_freqs: [f32; 4],
    /// Chord step into base_freqs. The tick loop deliberately never
    /// advances it; the drone holds the first chord tone.
    step_index: usize,
    bandpass_floor_hz: f32,
    bandpass_scale_hz: f32,
    master_gain: f32,
    sample_rate: f32,
}

impl OscillatorBank {
    pub fn new(params: &BankParams, sample_rate: f32) -> Self {
        let voices = vec![SawVoice::new(); params.voice_count];
        Self {
            voice_gain: 1.0 / params.voice_count as f32,
            voices,
            lowpass: Biquad::new(
                FilterKind::Lowpass,
                params.lowpass_hz,
                params.lowpass_q,
                sample_rate,
            ),
            bandpass: Biquad::new(
                FilterKind::Bandpass,
                params.bandpass_floor_hz,
                params.bandpass_q,
                sample_rate,
            ),
            base_freqs: params.base_freqs(),
            step_index: 0,
            bandpass_floor_hz: params.bandpass_floor_hz,
            bandpass_scale_hz: params.bandpass_scale_hz,
            master_gain: params.master_gain,
            sample_rate,
        }
    }

    /// Per-tick update: rewrite every voice frequency and the band-pass
    /// center from the freshly-ticked detune state.
    pub fn update(&mut self, elapsed_ms: f64, snap: DetuneSnapshot) {
        let n = self.voices.len();
        let base = self.base_freqs[self.step_index];

        for (i, voice) in self.voices.iter_mut().enumerate() {
            voice.frequency = voice_frequency(i, n, base, elapsed_ms, snap);
        }

        self.bandpass
            .set_frequency(self.bandpass_floor_hz + snap.detune_intensity * self.bandpass_scale_hz);
    }

    /// Current band-pass center (Hz)
    pub fn bandpass_hz(&self) -> f32 {
        self.bandpass.frequency()
    }

    pub fn voices(&self) -> &[SawVoice] {
        &self.voices
    }

    /// Next mono output sample (pre-limiter)
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let mut mix = 0.0;
        for voice in &mut self.voices {
            mix += voice.next_sample(self.sample_rate) * self.voice_gain;
        }
        let filtered = self.bandpass.process(self.lowpass.process(mix));
        filtered * self.master_gain
    }
}

/// The noise-demo chain: one saw voice into a swept low-pass
pub struct SweepChain {
    voice: SawVoice,
    lowpass: Biquad,
    master_gain: f32,
    sample_rate: f32,
}

impl SweepChain {
    pub fn new(params: &SweepParams, sample_rate: f32) -> Self {
        let mut voice = SawVoice::new();
        voice.frequency = params.initial_freq_hz;
        Self {
            voice,
            lowpass: Biquad::new(
                FilterKind::Lowpass,
                params.cutoff_start_hz,
                params.q,
                sample_rate,
            ),
            master_gain: params.master_gain,
            sample_rate,
        }
    }

    /// Per-tick update from the sweep sequencer
    pub fn update(&mut self, frequency_hz: f32, cutoff_hz: f32) {
        self.voice.frequency = frequency_hz;
        self.lowpass.set_frequency(cutoff_hz);
    }

    pub fn cutoff_hz(&self) -> f32 {
        self.lowpass.frequency()
    }

    /// Next mono output sample (pre-limiter)
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        self.lowpass.process(self.voice.next_sample(self.sample_rate)) * self.master_gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(spread: f32, intensity: f32) -> DetuneSnapshot {
        DetuneSnapshot {
            spread,
            detune_intensity: intensity,
        }
    }

    #[test]
    fn test_voice_frequency_fan() {
        // spread 2.0 -> fan period 8: voice 0 sits at DC, voice 4 at base
        let f0 = voice_frequency(0, 20, 330.0, 0.0, snap(2.0, 0.0));
        let f4 = voice_frequency(4, 20, 330.0, 0.0, snap(2.0, 0.0));
        let f8 = voice_frequency(8, 20, 330.0, 0.0, snap(2.0, 0.0));

        assert_eq!(f0, 0.0);
        assert_eq!(f4, 330.0);
        assert_eq!(f8, 0.0); // wrapped by the modulo
    }

    #[test]
    fn test_voice_frequency_wobble_scales_with_intensity() {
        let quiet = voice_frequency(3, 20, 330.0, 1234.0, snap(2.0, 0.0));
        let loud = voice_frequency(3, 20, 330.0, 1234.0, snap(2.0, 10.0));

        // Same fan term; the difference is exactly the scaled sine
        let wobble = (1.234f32 + 3.0 / 20.0 * PI).sin();
        assert!((loud - quiet - 10.0 * wobble).abs() < 1e-3);
    }

    #[test]
    fn test_voice_frequency_finite_for_extreme_intensity() {
        for i in 0..100 {
            let f = voice_frequency(i, 100, 330.0, 1e9, snap(4.7, 1e6));
            assert!(f.is_finite());
        }
    }

    #[test]
    fn test_bank_update_moves_bandpass_center() {
        let params = BankParams::default();
        let mut bank = OscillatorBank::new(&params, 44100.0);

        bank.update(0.0, snap(2.0, 3.0));
        assert!((bank.bandpass_hz() - 400.0).abs() < 1e-3); // 100 + 3 * 100

        bank.update(20.0, snap(2.0, 0.0));
        assert!((bank.bandpass_hz() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_bandpass_center_clamps_at_nyquist_not_panics() {
        let params = BankParams::default();
        let mut bank = OscillatorBank::new(&params, 44100.0);

        // Unbounded intensity drives the center above Nyquist; the filter
        // pins it rather than blowing up
        bank.update(0.0, snap(2.0, 1e9));
        assert!(bank.bandpass_hz() <= 44100.0 * 0.5);
        assert!(bank.next_sample().is_finite());
    }

    #[test]
    fn test_saw_voice_output_range() {
        let mut voice = SawVoice::new();
        voice.frequency = 330.0;

        for _ in 0..4410 {
            let s = voice.next_sample(44100.0);
            assert!((-1.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn test_saw_voice_handles_negative_frequency() {
        // The wobble term can push a low-fan voice below 0 Hz
        let mut voice = SawVoice::new();
        voice.frequency = -15.0;

        for _ in 0..4410 {
            let s = voice.next_sample(44100.0);
            assert!((-1.0..=1.0).contains(&s));
        }
    }

    #[test]
    fn test_bank_output_is_finite_and_bounded() {
        let params = BankParams {
            voice_count: 20,
            ..Default::default()
        };
        let mut bank = OscillatorBank::new(&params, 44100.0);
        bank.update(0.0, snap(2.0, 0.5));

        for _ in 0..44100 {
            let s = bank.next_sample();
            assert!(s.is_finite());
            assert!(s.abs() < 4.0, "filter chain went unstable: {}", s);
        }
    }

    #[test]
    fn test_step_index_is_never_advanced_by_ticks() {
        let params = BankParams::default();
        let mut bank = OscillatorBank::new(&params, 44100.0);

        for t in 0..1000 {
            bank.update(t as f64 * 20.0, snap(2.0, 0.1));
        }
        // The chord step is static: ticking alone never moves it
        assert_eq!(bank.step_index, 0);
    }

    #[test]
    fn test_sweep_chain_follows_sequencer_updates() {
        let params = SweepParams::default();
        let mut chain = SweepChain::new(&params, 44100.0);

        assert_eq!(chain.cutoff_hz(), 880.0);

        chain.update(220.0, 865.0);
        assert_eq!(chain.voice.frequency, 220.0);
        assert_eq!(chain.cutoff_hz(), 865.0);
    }

    #[test]
    fn test_sweep_chain_output_is_finite_across_the_sweep() {
        let params = SweepParams::default();
        let mut chain = SweepChain::new(&params, 44100.0);

        // Walk the cutoff all the way down to the floor while sampling
        let mut cutoff = params.cutoff_start_hz;
        while cutoff > params.cutoff_floor_hz {
            chain.update(220.0, cutoff);
            for _ in 0..64 {
                let s = chain.next_sample();
                assert!(s.is_finite());
                assert!(s.abs() < 4.0, "sweep chain went unstable: {}", s);
            }
            cutoff -= params.cutoff_step_hz;
        }
    }

    #[test]
    fn test_lowpass_attenuates_high_frequencies() {
        let mut lp = Biquad::new(FilterKind::Lowpass, 880.0, 0.7, 44100.0);

        // Feed a 10 kHz sine, well above cutoff
        let mut peak: f32 = 0.0;
        for n in 0..44100 {
            let x = (2.0 * PI * 10_000.0 * n as f32 / 44100.0).sin();
            let y = lp.process(x);
            if n > 1000 {
                peak = peak.max(y.abs());
            }
        }
        assert!(peak < 0.05, "10 kHz leaked through at {}", peak);
    }
}
