//! Test helpers and fixtures for voxshift integration tests
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations
//! - `SILENCE_RMS` (1e-3): Noise floor for "silent" vocoder output
//! - `VOCODER_BIN_HZ` (23.4): One analysis bin at 2048 / 48kHz

#![allow(dead_code)]

pub mod tolerances;

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use voxshift::dsp::fft::{self, FftDirection};
use voxshift::prelude::*;
use voxshift::VoicePipeline;

/// Default test sample rate (matches the voice codec)
pub const TEST_SAMPLE_RATE: f64 = 48000.0;

/// 10ms voice frame at 48kHz
pub const FRAME_SAMPLES: usize = 480;

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
        })
        .collect()
}

/// Generate silence (zero samples).
pub fn generate_silence(num_samples: usize) -> Vec<f32> {
    vec![0.0; num_samples]
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Frequency of the strongest spectral peak, in Hz.
///
/// Uses the crate's own FFT over the largest power-of-two prefix of
/// `samples`, Hann windowed, with parabolic interpolation around the peak.
pub fn dominant_frequency(samples: &[f32], sample_rate: f64) -> f64 {
    let n = if samples.len().is_power_of_two() {
        samples.len()
    } else {
        samples.len().next_power_of_two() / 2
    };
    assert!(n >= 64, "need at least 64 samples, got {}", samples.len());

    let mut buffer = vec![0.0f64; 2 * n];
    for (i, &s) in samples[..n].iter().enumerate() {
        let window = 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / n as f64).cos();
        buffer[2 * i] = s as f64 * window;
    }
    fft::transform(&mut buffer, n, FftDirection::Forward);

    let magnitude = |k: usize| buffer[2 * k].hypot(buffer[2 * k + 1]);
    let peak_bin = (1..n / 2)
        .max_by(|&a, &b| magnitude(a).total_cmp(&magnitude(b)))
        .unwrap_or(1);

    let (left, centre, right) = (
        magnitude(peak_bin - 1),
        magnitude(peak_bin),
        magnitude(peak_bin + 1),
    );
    let denominator = left - 2.0 * centre + right;
    let offset = if denominator.abs() > f64::EPSILON {
        0.5 * (left - right) / denominator
    } else {
        0.0
    };

    (peak_bin as f64 + offset) * sample_rate / n as f64
}

/// Decode little-endian 16-bit PCM back to floats.
pub fn decode_pcm16(bytes: &[u8]) -> Vec<f32> {
    let mut pcm = vec![0.0; bytes.len() / 2];
    let written = Pcm16Codec
        .decode(bytes, &mut pcm)
        .expect("valid PCM16 payload");
    pcm.truncate(written);
    pcm
}

/// Sink that records everything sent downstream, in order.
#[derive(Clone, Default)]
pub struct RecordingSink {
    sent: Arc<Mutex<Vec<(ActorId, VoiceMessage)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn messages(&self) -> Vec<(ActorId, VoiceMessage)> {
        self.sent.lock().clone()
    }

    /// Payloads sent for one actor, in delivery order.
    pub fn payloads_for(&self, actor: ActorId) -> Vec<Vec<u8>> {
        self.sent
            .lock()
            .iter()
            .filter(|(a, _)| *a == actor)
            .map(|(_, m)| m.data.clone())
            .collect()
    }
}

impl VoiceSink for RecordingSink {
    fn send(&self, actor: ActorId, message: VoiceMessage) {
        self.sent.lock().push((actor, message));
    }
}

/// Create an engine with default configuration that records into `sink`.
pub fn test_engine(sink: &RecordingSink) -> VoxEngine {
    VoxEngine::builder()
        .sink(sink.clone())
        .build()
        .expect("Failed to create test engine")
}

/// Open a PCM16 session for `actor`.
pub fn open_pcm16_session(engine: &VoxEngine, actor: ActorId) {
    engine
        .open_session(actor, shared_decoder(Pcm16Codec), shared_encoder(Pcm16Codec))
        .expect("Failed to open session");
}

/// Drive `tick` until `condition` holds, like a server frame loop would.
pub fn tick_until(engine: &VoxEngine, max_wait_ms: u64, condition: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    let timeout = Duration::from_millis(max_wait_ms);

    while start.elapsed() < timeout {
        engine.tick();
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    false
}

/// Same as [`tick_until`] for a bare pipeline.
pub fn tick_pipeline_until(
    pipeline: &VoicePipeline,
    max_wait_ms: u64,
    condition: impl Fn() -> bool,
) -> bool {
    let start = Instant::now();
    let timeout = Duration::from_millis(max_wait_ms);

    while start.elapsed() < timeout {
        pipeline.tick();
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    false
}

/// Route worker logs to the test output. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
