//! Pitch-shifting DSP for voice frames.
//!
//! Provides an in-place radix-2 FFT over interleaved complex buffers and a
//! streaming phase vocoder that shifts pitch without changing duration.
//!
//! # Example
//!
//! ```ignore
//! use voxshift_dsp::{PhaseVocoder, VocoderConfig};
//!
//! let mut vocoder = PhaseVocoder::new(VocoderConfig::default())?;
//!
//! // One 10 ms frame at 48 kHz, shifted up a fifth
//! let mut frame = vec![0.0f32; 480];
//! vocoder.shift(1.5, 48000.0, &mut frame);
//! ```
//!
//! Output lags input by [`VocoderConfig::latency`] samples. The vocoder keeps
//! its FIFOs and phase accumulators between calls, so successive frames of
//! one stream must go through the same instance, in order.

mod error;
pub use error::{Error, Result};

pub mod fft;
pub use fft::FftDirection;

mod types;
pub use types::{VocoderConfig, DEFAULT_FFT_SIZE, DEFAULT_OVERSAMPLING};

mod phase_vocoder;
pub use phase_vocoder::PhaseVocoder;
