//! Audio systems: output streams plus their control cadences.
//!
//! The synthesis chains run inside the cpal output callbacks. Dedicated
//! control threads own the wall-clock cadences — for the supersaw, a
//! 20 ms tick (detune smoothing + voice/filter update, in that order
//! within one tick body) and a 10 s target advance; for the noise demo,
//! a 1 ms cutoff-sweep tick. All exit when the owning session is torn
//! down.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::detune::{self, DetuneSnapshot, SharedDetune};
use crate::params::{
    audio_constants::CLIP_LIMIT, BankParams, DetuneParams, RecordingConfig, SweepParams,
};
use crate::sweep::{self, SharedSweep, SweepSnapshot};
use crate::synth::{OscillatorBank, SweepChain};

type SharedWavWriter = Arc<Mutex<hound::WavWriter<std::io::BufWriter<std::fs::File>>>>;

/// Acquire the default output device and its configuration
fn output_device() -> Result<(cpal::Device, cpal::SupportedStreamConfig), String> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or("No audio output device found")?;

    let config = device
        .default_output_config()
        .map_err(|e| format!("Failed to get audio config: {}", e))?;

    Ok((device, config))
}

/// Create the recording WAV writer if recording mode is enabled
fn create_wav_writer(
    recording_config: Option<&RecordingConfig>,
    sample_rate: u32,
) -> Result<Option<SharedWavWriter>, String> {
    match recording_config {
        Some(rec) => {
            let spec = hound::WavSpec {
                channels: 2,
                sample_rate,
                bits_per_sample: 32,
                sample_format: hound::SampleFormat::Float,
            };
            let writer = hound::WavWriter::create(rec.audio_path(), spec)
                .map_err(|e| format!("Failed to create WAV writer: {}", e))?;
            Ok(Some(Arc::new(Mutex::new(writer))))
        }
        None => Ok(None),
    }
}

/// Audio system managing synthesis and the detune scheduler
pub struct AudioSystem {
    /// Shared detune state (written by the tick threads, read per frame)
    detune: SharedDetune,

    /// Audio output stream (kept alive)
    _stream: cpal::Stream,

    /// Cleared on teardown; the control threads poll it
    running: Arc<AtomicBool>,

    _tick_thread: thread::JoinHandle<()>,
    _target_thread: thread::JoinHandle<()>,
}

impl AudioSystem {
    /// Create and start the audio system: build the bank, open the output
    /// stream, and spawn both control threads.
    pub fn new(
        detune_params: DetuneParams,
        bank_params: BankParams,
        recording_config: Option<RecordingConfig>,
    ) -> Result<Self, String> {
        let (device, config) = output_device()?;
        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        println!(
            "Audio: {} @ {}Hz, {} voices",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate,
            bank_params.voice_count
        );

        let wav_writer = create_wav_writer(recording_config.as_ref(), sample_rate as u32)?;

        let bank = Arc::new(Mutex::new(OscillatorBank::new(&bank_params, sample_rate)));
        let bank_for_callback = Arc::clone(&bank);

        // Build audio output stream: the bank synthesizes mono, duplicated
        // across however many channels the device wants
        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut bank = bank_for_callback.lock().unwrap();

                    for frame in data.chunks_mut(channels) {
                        let sample = bank.next_sample().clamp(-CLIP_LIMIT, CLIP_LIMIT);
                        for out in frame.iter_mut() {
                            *out = sample;
                        }

                        if let Some(ref writer) = wav_writer {
                            if let Ok(mut w) = writer.lock() {
                                let _ = w.write_sample(sample);
                                let _ = w.write_sample(sample);
                            }
                        }
                    }
                },
                |err| eprintln!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| format!("Failed to build audio stream: {}", e))?;

        stream
            .play()
            .map_err(|e| format!("Failed to start audio stream: {}", e))?;

        let detune = detune::shared(&detune_params);
        let running = Arc::new(AtomicBool::new(true));

        let tick_thread = spawn_tick_thread(
            detune_params.clone(),
            Arc::clone(&detune),
            bank,
            Arc::clone(&running),
        );
        let target_thread =
            spawn_target_thread(detune_params, Arc::clone(&detune), Arc::clone(&running));

        Ok(Self {
            detune,
            _stream: stream,
            running,
            _tick_thread: tick_thread,
            _target_thread: target_thread,
        })
    }

    /// Current detune snapshot (may be stale by up to one 20 ms tick)
    pub fn snapshot(&self) -> DetuneSnapshot {
        self.detune.lock().unwrap().snapshot()
    }

    /// Stop the control threads; the stream dies with the struct
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawn the 20 ms tick thread.
///
/// Within one tick body the detune state is fully updated before the bank
/// reads it: the ordering guarantee is the sequential code, not a lock.
fn spawn_tick_thread(
    params: DetuneParams,
    detune: SharedDetune,
    bank: Arc<Mutex<OscillatorBank>>,
    running: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let start = Instant::now();
        let interval = Duration::from_millis(params.tick_interval_ms);

        while running.load(Ordering::Relaxed) {
            thread::sleep(interval);

            let snap = {
                let mut state = detune.lock().unwrap();
                state.tick(&params);
                state.snapshot()
            };

            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
            bank.lock().unwrap().update(elapsed_ms, snap);
        }
    })
}

/// Audio system for the noise demo: one saw voice, a swept low-pass, and
/// the 1 ms sweep-sequencer tick
pub struct SweepSystem {
    /// Shared sequencer state (tick thread writes, render driver reads)
    sequencer: SharedSweep,

    /// Audio output stream (kept alive)
    _stream: cpal::Stream,

    /// Cleared on teardown; the tick thread polls it
    running: Arc<AtomicBool>,

    _tick_thread: thread::JoinHandle<()>,
}

impl SweepSystem {
    /// Create and start the sweep system: build the chain, open the output
    /// stream, and spawn the sweep tick thread.
    pub fn new(
        params: SweepParams,
        recording_config: Option<RecordingConfig>,
    ) -> Result<Self, String> {
        let (device, config) = output_device()?;
        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        println!(
            "Audio: {} @ {}Hz, sweep sequencer",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate
        );

        let wav_writer = create_wav_writer(recording_config.as_ref(), sample_rate as u32)?;

        let chain = Arc::new(Mutex::new(SweepChain::new(&params, sample_rate)));
        let chain_for_callback = Arc::clone(&chain);

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut chain = chain_for_callback.lock().unwrap();

                    for frame in data.chunks_mut(channels) {
                        let sample = chain.next_sample().clamp(-CLIP_LIMIT, CLIP_LIMIT);
                        for out in frame.iter_mut() {
                            *out = sample;
                        }

                        if let Some(ref writer) = wav_writer {
                            if let Ok(mut w) = writer.lock() {
                                let _ = w.write_sample(sample);
                                let _ = w.write_sample(sample);
                            }
                        }
                    }
                },
                |err| eprintln!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| format!("Failed to build audio stream: {}", e))?;

        stream
            .play()
            .map_err(|e| format!("Failed to start audio stream: {}", e))?;

        let running = Arc::new(AtomicBool::new(true));
        let sequencer = sweep::shared(params.clone());

        let tick_thread = spawn_sweep_thread(
            params,
            Arc::clone(&sequencer),
            chain,
            Arc::clone(&running),
        );

        Ok(Self {
            sequencer,
            _stream: stream,
            running,
            _tick_thread: tick_thread,
        })
    }

    /// Current sweep snapshot (may be stale by up to one 1 ms tick)
    pub fn snapshot(&self) -> SweepSnapshot {
        self.sequencer.lock().unwrap().snapshot()
    }

    /// Stop the tick thread; the stream dies with the struct
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

impl Drop for SweepSystem {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawn the 1 ms sweep tick thread.
///
/// Same shape as the supersaw tick: the sequencer is fully updated before
/// the chain reads it in the same loop body.
fn spawn_sweep_thread(
    params: SweepParams,
    sequencer: SharedSweep,
    chain: Arc<Mutex<SweepChain>>,
    running: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let interval = Duration::from_millis(params.tick_interval_ms);

        while running.load(Ordering::Relaxed) {
            thread::sleep(interval);

            let snap = {
                let mut seq = sequencer.lock().unwrap();
                seq.tick();
                seq.snapshot()
            };

            chain.lock().unwrap().update(snap.frequency_hz, snap.cutoff_hz);
        }
    })
}

/// Spawn the 10 s target-advance thread
fn spawn_target_thread(
    params: DetuneParams,
    detune: SharedDetune,
    running: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        // Sleep in small steps so teardown is not delayed by up to 10 s
        let step = Duration::from_millis(100);
        let steps_per_advance = params.target_interval_s * 10;

        let mut elapsed_steps = 0u64;
        while running.load(Ordering::Relaxed) {
            thread::sleep(step);
            elapsed_steps += 1;
            if elapsed_steps >= steps_per_advance {
                elapsed_steps = 0;
                detune.lock().unwrap().advance_target(&params);
            }
        }
    })
}
