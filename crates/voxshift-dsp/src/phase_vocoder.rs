//! Streaming phase vocoder for pitch shifting.
//!
//! ## Algorithm Overview
//!
//! Samples flow through a sliding input FIFO of one FFT frame. Every
//! `hop_size` samples a full analysis/synthesis cycle runs:
//!
//! 1. **Analysis**: Hann-window the FIFO, forward FFT, then estimate each
//!    bin's true frequency from the phase advance since the previous frame
//! 2. **Remap**: move bin `k` to `round(k * ratio)` and scale its frequency;
//!    bins pushed past Nyquist are discarded
//! 3. **Synthesis**: turn frequencies back into phase increments, accumulate,
//!    rebuild the positive half spectrum and inverse FFT
//! 4. **Overlap-add**: window, normalize, accumulate and emit `hop_size` samples
//!
//! Output lags input by exactly `fft_size - hop_size` samples.
//!
//! ## RT-Safety
//!
//! All buffers are allocated in [`PhaseVocoder::new`]. [`PhaseVocoder::shift`]
//! performs no allocations. Phase math runs in `f64` because phase error
//! compounds from frame to frame.

use std::f64::consts::{PI, TAU};

use crate::fft::{self, FftDirection};
use crate::{Result, VocoderConfig};

/// Per-stream phase-vocoder state.
///
/// One instance belongs to one voice stream for its whole lifetime; the
/// overlap-add windows only line up if every frame of the stream passes
/// through the same instance in order.
#[derive(Clone)]
pub struct PhaseVocoder {
    config: VocoderConfig,

    window: Vec<f64>,

    input_fifo: Vec<f32>,
    output_fifo: Vec<f32>,
    /// Interleaved re/im, `2 * fft_size`.
    workspace: Vec<f64>,
    output_accumulator: Vec<f64>,

    last_phase: Vec<f64>,
    phase_sum: Vec<f64>,

    analysis_magnitude: Vec<f64>,
    analysis_frequency: Vec<f64>,
    synthesis_magnitude: Vec<f64>,
    synthesis_frequency: Vec<f64>,

    /// Write offset into the FIFOs. Always in `latency..fft_size`.
    rotation: usize,
}

impl PhaseVocoder {
    /// Allocate a vocoder for `config`.
    pub fn new(config: VocoderConfig) -> Result<Self> {
        config.validate()?;

        let size = config.fft_size();
        let bins = config.bins();

        Ok(Self {
            config,
            window: Self::create_hann_window(size),
            input_fifo: vec![0.0; size],
            output_fifo: vec![0.0; config.hop_size()],
            workspace: vec![0.0; 2 * size],
            output_accumulator: vec![0.0; size],
            last_phase: vec![0.0; bins],
            phase_sum: vec![0.0; bins],
            analysis_magnitude: vec![0.0; bins],
            analysis_frequency: vec![0.0; bins],
            synthesis_magnitude: vec![0.0; bins],
            synthesis_frequency: vec![0.0; bins],
            rotation: config.latency(),
        })
    }

    /// `0.5 - 0.5 * cos(2πk / size)`, shared by analysis and synthesis.
    fn create_hann_window(size: usize) -> Vec<f64> {
        (0..size)
            .map(|k| 0.5 - 0.5 * (2.0 * PI * k as f64 / size as f64).cos())
            .collect()
    }

    pub fn config(&self) -> VocoderConfig {
        self.config
    }

    /// Delay in samples between input and output.
    pub fn latency(&self) -> usize {
        self.config.latency()
    }

    /// Return to the freshly constructed state.
    pub fn reset(&mut self) {
        self.input_fifo.fill(0.0);
        self.output_fifo.fill(0.0);
        self.workspace.fill(0.0);
        self.output_accumulator.fill(0.0);
        self.last_phase.fill(0.0);
        self.phase_sum.fill(0.0);
        self.analysis_magnitude.fill(0.0);
        self.analysis_frequency.fill(0.0);
        self.synthesis_magnitude.fill(0.0);
        self.synthesis_frequency.fill(0.0);
        self.rotation = self.config.latency();
    }

    /// Pitch-shift `samples` in place by `pitch_ratio`.
    ///
    /// Each output sample is the shifted signal from `latency()` samples
    /// earlier in the stream. A ratio of 1.0 still runs the full
    /// analysis/synthesis path, so the result is a near-identity
    /// reconstruction rather than a copy.
    pub fn shift(&mut self, pitch_ratio: f32, sample_rate: f64, samples: &mut [f32]) {
        let size = self.config.fft_size();
        let latency = self.config.latency();
        let ratio = pitch_ratio as f64;
        let bin_hz = sample_rate / size as f64;

        for sample in samples.iter_mut() {
            self.input_fifo[self.rotation] = *sample;
            *sample = self.output_fifo[self.rotation - latency];
            self.rotation += 1;

            if self.rotation >= size {
                self.rotation = latency;
                self.process_frame(ratio, bin_hz);
            }
        }
    }

    /// Run one analysis/synthesis cycle over the full input FIFO.
    fn process_frame(&mut self, ratio: f64, bin_hz: f64) {
        let size = self.config.fft_size();
        let half = size / 2;
        let hop = self.config.hop_size();
        let oversampling = self.config.oversampling() as f64;
        let expected_advance = TAU * hop as f64 / size as f64;

        // 1. Window into the workspace
        for (k, (&sample, &w)) in self.input_fifo.iter().zip(&self.window).enumerate() {
            self.workspace[2 * k] = sample as f64 * w;
            self.workspace[2 * k + 1] = 0.0;
        }

        fft::transform(&mut self.workspace, size, FftDirection::Forward);

        // 2. Analysis: magnitude and true frequency per bin
        for k in 0..=half {
            let re = self.workspace[2 * k];
            let im = self.workspace[2 * k + 1];

            let magnitude = 2.0 * re.hypot(im);
            let phase = im.atan2(re);

            let mut deviation = phase - self.last_phase[k];
            self.last_phase[k] = phase;

            deviation -= k as f64 * expected_advance;
            deviation = wrap_phase(deviation);

            let bin_offset = oversampling * deviation / TAU;

            self.analysis_magnitude[k] = magnitude;
            self.analysis_frequency[k] = (k as f64 + bin_offset) * bin_hz;
        }

        // 3. Remap bins; anything shifted past Nyquist is dropped
        self.synthesis_magnitude.fill(0.0);
        self.synthesis_frequency.fill(0.0);
        for k in 0..=half {
            let index = (k as f64 * ratio).round() as usize;
            if index <= half {
                self.synthesis_magnitude[index] += self.analysis_magnitude[k];
                self.synthesis_frequency[index] = self.analysis_frequency[k] * ratio;
            }
        }

        // 4. Synthesis: frequency back to phase increment, accumulate, rebuild
        for k in 0..=half {
            let magnitude = self.synthesis_magnitude[k];

            let bin_offset = self.synthesis_frequency[k] / bin_hz - k as f64;
            let advance = TAU * bin_offset / oversampling + k as f64 * expected_advance;

            self.phase_sum[k] = (self.phase_sum[k] + advance).rem_euclid(TAU);
            let phase = self.phase_sum[k];

            self.workspace[2 * k] = magnitude * phase.cos();
            self.workspace[2 * k + 1] = magnitude * phase.sin();
        }
        // negative frequencies
        self.workspace[size + 2..].fill(0.0);

        fft::transform(&mut self.workspace, size, FftDirection::Inverse);

        // 5. Overlap-add
        let scale = 2.0 / (half as f64 * oversampling);
        for k in 0..size {
            self.output_accumulator[k] += self.window[k] * self.workspace[2 * k] * scale;
        }

        for (out, &acc) in self.output_fifo.iter_mut().zip(&self.output_accumulator[..hop]) {
            *out = acc as f32;
        }

        self.output_accumulator.copy_within(hop.., 0);
        self.output_accumulator[size - hop..].fill(0.0);
        self.input_fifo.copy_within(hop.., 0);
    }
}

/// Wrap a phase difference into [-π, π] by removing the nearest even
/// multiple of π.
#[inline]
fn wrap_phase(phase: f64) -> f64 {
    let mut multiple = (phase / PI) as i64;
    if multiple >= 0 {
        multiple += multiple & 1;
    } else {
        multiple -= multiple & 1;
    }
    phase - PI * multiple as f64
}
