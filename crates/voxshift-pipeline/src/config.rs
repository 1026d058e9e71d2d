//! Pipeline configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use voxshift_dsp::VocoderConfig;

/// Configuration for the voice pipeline and its worker thread.
///
/// Loadable from TOML; missing keys fall back to the defaults:
///
/// ```toml
/// sample_rate = 48000.0
/// frame_samples = 480
/// max_packet_bytes = 4000
///
/// [vocoder]
/// fft_size = 2048
/// oversampling = 10
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sample rate of decoded voice frames (default: 48000.0)
    pub sample_rate: f64,
    /// PCM samples per decoded frame, sizes the worker's scratch buffer (default: 480, 10ms @ 48kHz)
    pub frame_samples: usize,
    /// Phase-vocoder frame size and overlap (default: 2048 / 10)
    pub vocoder: VocoderConfig,
    /// Upper bound for compressed packets, in and out (default: 4000)
    pub max_packet_bytes: usize,
    /// Worker sleep between empty queue drains in milliseconds (default: 1)
    pub idle_sleep_ms: u64,
    /// Raise the worker thread to maximum priority (default: false)
    pub elevate_worker_priority: bool,
    /// Worker thread name (default: "voxshift-worker")
    pub thread_name: String,
    /// Packets allocated up front in the pool (default: 32)
    pub preallocated_packets: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            frame_samples: 480,
            vocoder: VocoderConfig::default(),
            max_packet_bytes: 4000,
            idle_sleep_ms: 1,
            elevate_worker_priority: false,
            thread_name: "voxshift-worker".to_string(),
            preallocated_packets: 32,
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "sample_rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if self.frame_samples == 0 {
            return Err(Error::InvalidConfig("frame_samples must be > 0".into()));
        }
        if self.max_packet_bytes == 0 {
            return Err(Error::InvalidConfig("max_packet_bytes must be > 0".into()));
        }
        if self.thread_name.is_empty() {
            return Err(Error::InvalidConfig("thread_name must not be empty".into()));
        }
        self.vocoder.validate()?;
        Ok(())
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_frame_samples(mut self, frame_samples: usize) -> Self {
        self.frame_samples = frame_samples;
        self
    }

    pub fn with_vocoder(mut self, vocoder: VocoderConfig) -> Self {
        self.vocoder = vocoder;
        self
    }

    pub fn with_max_packet_bytes(mut self, bytes: usize) -> Self {
        self.max_packet_bytes = bytes;
        self
    }

    pub fn idle_sleep(&self) -> Duration {
        Duration::from_millis(self.idle_sleep_ms)
    }
}
