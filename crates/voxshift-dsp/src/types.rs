//! Phase-vocoder configuration.

use crate::{fft, Error, Result};
use serde::{Deserialize, Serialize};

/// Default analysis frame (FFT) size.
pub const DEFAULT_FFT_SIZE: usize = 2048;

/// Default number of overlapping analysis frames per FFT frame.
pub const DEFAULT_OVERSAMPLING: usize = 10;

/// Frame size and overlap of the phase vocoder.
///
/// Larger FFT sizes give finer frequency resolution at the cost of latency:
///
/// - **1024**: ~19ms latency @ 48kHz with 10x oversampling
/// - **2048**: default, ~38ms latency @ 48kHz
/// - **4096**: ~77ms latency @ 48kHz
///
/// The hop size uses integer division (`2048 / 10 = 204`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocoderConfig {
    fft_size: usize,
    oversampling: usize,
}

impl VocoderConfig {
    /// Create a validated configuration.
    pub fn new(fft_size: usize, oversampling: usize) -> Result<Self> {
        let config = Self {
            fft_size,
            oversampling,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the FFT and the FIFOs rely on.
    ///
    /// Configurations coming from serde are not validated on load; call this
    /// before building a vocoder from them.
    pub fn validate(&self) -> Result<()> {
        if !fft::is_valid_frame_size(self.fft_size) {
            return Err(Error::InvalidFftSize(self.fft_size));
        }
        if self.oversampling == 0 || self.oversampling > self.fft_size {
            return Err(Error::InvalidOversampling {
                fft_size: self.fft_size,
                oversampling: self.oversampling,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    #[inline]
    pub fn oversampling(&self) -> usize {
        self.oversampling
    }

    /// Samples advanced between successive analysis frames.
    #[inline]
    pub fn hop_size(&self) -> usize {
        self.fft_size / self.oversampling
    }

    /// Fixed delay between an input sample and its output sample.
    #[inline]
    pub fn latency(&self) -> usize {
        self.fft_size - self.hop_size()
    }

    /// Number of non-negative frequency bins.
    #[inline]
    pub fn bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Latency in milliseconds at a given sample rate.
    pub fn latency_ms(&self, sample_rate: f64) -> f64 {
        self.latency() as f64 / sample_rate * 1000.0
    }
}

impl Default for VocoderConfig {
    fn default() -> Self {
        Self {
            fft_size: DEFAULT_FFT_SIZE,
            oversampling: DEFAULT_OVERSAMPLING,
        }
    }
}
