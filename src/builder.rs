//! Builder for configuring and constructing a `VoxEngine`.

use crate::{Error, Result, VoiceSink, VoxEngine};
use std::sync::Arc;
use voxshift_core::PitchTable;
use voxshift_dsp::VocoderConfig;
use voxshift_pipeline::{PipelineConfig, VoicePipeline};

/// The worker thread is started by [`build`](Self::build) unless
/// [`manual_start`](Self::manual_start) is set.
///
/// # Example
///
/// ```ignore
/// use voxshift::prelude::*;
///
/// let engine = VoxEngine::builder()
///     .config(PipelineConfig::from_toml_str(&std::fs::read_to_string("voice.toml")?)?)
///     .elevate_worker_priority(true)
///     .sink(network_sink)
///     .build()?;
/// ```
pub struct VoxEngineBuilder {
    config: PipelineConfig,
    sink: Option<Arc<dyn VoiceSink>>,
    pitch: Option<Arc<PitchTable>>,
    auto_start: bool,
}

impl Default for VoxEngineBuilder {
    fn default() -> Self {
        Self {
            config: PipelineConfig::default(),
            sink: None,
            pitch: None,
            auto_start: true,
        }
    }
}

impl VoxEngineBuilder {
    /// Replace the whole pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 48000.0
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Default: 480 (10ms @ 48kHz)
    pub fn frame_samples(mut self, frame_samples: usize) -> Self {
        self.config.frame_samples = frame_samples;
        self
    }

    /// Default: 2048 / 10
    pub fn vocoder(mut self, vocoder: VocoderConfig) -> Self {
        self.config.vocoder = vocoder;
        self
    }

    /// Default: 4000
    pub fn max_packet_bytes(mut self, bytes: usize) -> Self {
        self.config.max_packet_bytes = bytes;
        self
    }

    /// Default: false
    pub fn elevate_worker_priority(mut self, elevate: bool) -> Self {
        self.config.elevate_worker_priority = elevate;
        self
    }

    /// Where outgoing voice frames go. Required.
    pub fn sink(mut self, sink: impl VoiceSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    pub fn shared_sink(mut self, sink: Arc<dyn VoiceSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Share pitch knobs with other parts of the host (e.g. an admin command).
    pub fn pitch_table(mut self, pitch: Arc<PitchTable>) -> Self {
        self.pitch = Some(pitch);
        self
    }

    /// Leave the worker stopped until [`VoxEngine::start`] is called.
    pub fn manual_start(mut self) -> Self {
        self.auto_start = false;
        self
    }

    pub fn build(self) -> Result<VoxEngine> {
        let sink = self.sink.ok_or(Error::MissingSink)?;
        let pitch = self.pitch.unwrap_or_default();

        let mut pipeline = VoicePipeline::new(self.config)?;
        if self.auto_start {
            pipeline.start()?;
        }

        Ok(VoxEngine::from_parts(pipeline, pitch, sink))
    }
}
