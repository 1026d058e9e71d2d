//! VoxEngine: sessions, pitch routing and the per-tick dispatcher hook.

use crate::{Error, Result};
use dashmap::DashMap;
use std::sync::Arc;
use voxshift_core::{ActorId, PitchTable, VoiceChannel};
use voxshift_pipeline::{
    PacketRequest, PipelineConfig, PipelineHandle, PipelineMetricsSnapshot, SharedDecoder,
    SharedEncoder, VoicePipeline,
};

/// A compressed voice frame as it arrives from, and leaves to, the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceMessage {
    pub channel: VoiceChannel,
    pub data: Vec<u8>,
}

impl VoiceMessage {
    pub fn new(channel: VoiceChannel, data: impl Into<Vec<u8>>) -> Self {
        Self {
            channel,
            data: data.into(),
        }
    }
}

/// Downstream collaborator that receives outgoing voice frames.
///
/// Bypassed frames are sent from the caller of
/// [`VoxEngine::process_message`]; shifted frames are sent from the thread
/// that calls [`VoxEngine::tick`].
pub trait VoiceSink: Send + Sync {
    fn send(&self, actor: ActorId, message: VoiceMessage);
}

impl<F> VoiceSink for F
where
    F: Fn(ActorId, VoiceMessage) + Send + Sync,
{
    fn send(&self, actor: ActorId, message: VoiceMessage) {
        self(actor, message)
    }
}

/// How [`VoxEngine::process_message`] handled a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// No shift applied; the frame went straight to the sink.
    Bypassed,
    /// Queued for the worker; the sink receives it on a later tick.
    Queued,
}

/// Codec handles owned by an actor's voice session.
struct VoiceSession {
    decoder: SharedDecoder,
    encoder: SharedEncoder,
}

/// Voice pitch-shifting engine.
///
/// Owns the pipeline and its worker thread, the pitch knobs and the open
/// voice sessions.
///
/// # Example
///
/// ```ignore
/// use voxshift::prelude::*;
///
/// let engine = VoxEngine::builder()
///     .sink(|actor, message| network.send(actor, message))
///     .build()?;
///
/// engine.open_session(actor, shared_decoder(Pcm16Codec), shared_encoder(Pcm16Codec))?;
/// engine.set_actor_pitch(actor, 1.25)?;
///
/// // network receive thread
/// engine.process_message(actor, message)?;
///
/// // once per server frame
/// engine.tick();
/// ```
pub struct VoxEngine {
    pipeline: VoicePipeline,
    handle: PipelineHandle,
    pitch: Arc<PitchTable>,
    sessions: DashMap<ActorId, VoiceSession>,
    sink: Arc<dyn VoiceSink>,
}

impl VoxEngine {
    /// Create a new engine builder
    pub fn builder() -> crate::VoxEngineBuilder {
        crate::VoxEngineBuilder::default()
    }

    pub(crate) fn from_parts(
        pipeline: VoicePipeline,
        pitch: Arc<PitchTable>,
        sink: Arc<dyn VoiceSink>,
    ) -> Self {
        let handle = pipeline.handle();
        Self {
            pipeline,
            handle,
            pitch,
            sessions: DashMap::new(),
            sink,
        }
    }

    // --- Sessions ---

    /// Register `actor`'s codec and start fresh vocoder state.
    ///
    /// Reopening an existing session replaces its codec and resets its
    /// vocoder after the actor's already-queued frames.
    pub fn open_session(
        &self,
        actor: ActorId,
        decoder: SharedDecoder,
        encoder: SharedEncoder,
    ) -> Result<()> {
        self.handle.open_session(actor)?;
        if self
            .sessions
            .insert(actor, VoiceSession { decoder, encoder })
            .is_some()
        {
            tracing::info!("Reopened voice session for {}", actor);
        } else {
            tracing::info!("Opened voice session for {}", actor);
        }
        Ok(())
    }

    /// End `actor`'s session.
    ///
    /// The codec handles are released immediately, so frames still in flight
    /// for this actor are dropped by the worker. Vocoder state is freed once
    /// the worker reaches this point in the queue. The actor's own pitch is
    /// forgotten too; the global override is left alone.
    pub fn close_session(&self, actor: ActorId) -> Result<()> {
        if self.sessions.remove(&actor).is_none() {
            return Err(Error::UnknownSession(actor));
        }
        self.pitch.clear_actor(actor);
        self.handle.close_session(actor)?;
        tracing::info!("Closed voice session for {}", actor);
        Ok(())
    }

    pub fn has_session(&self, actor: ActorId) -> bool {
        self.sessions.contains_key(&actor)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    // --- Routing ---

    /// Route one incoming voice frame from `actor`.
    ///
    /// When no shift applies the frame is forwarded to the sink untouched,
    /// without touching the pipeline. Otherwise it is queued for the
    /// worker and reaches the sink on a later [`tick`](Self::tick), on the
    /// same channel. A frame that fails processing never reaches the sink.
    pub fn process_message(&self, actor: ActorId, message: VoiceMessage) -> Result<Route> {
        let ratio = self.pitch.effective(actor);
        if ratio == voxshift_core::NO_SHIFT {
            self.handle.record_bypass();
            self.sink.send(actor, message);
            return Ok(Route::Bypassed);
        }

        let session = self
            .sessions
            .get(&actor)
            .ok_or(Error::UnknownSession(actor))?;
        let sink = Arc::clone(&self.sink);
        let channel = message.channel;

        self.handle.submit(
            PacketRequest::new(&message.data, channel)
                .pitch_shift(ratio, actor, &session.decoder, &session.encoder)
                .on_processed(move |packet| {
                    sink.send(actor, VoiceMessage::new(channel, packet.data()));
                }),
        )?;
        Ok(Route::Queued)
    }

    /// Scheduler hook: deliver every frame the worker has finished.
    ///
    /// Call exactly once per server frame, on the thread allowed to send.
    pub fn tick(&self) -> usize {
        self.pipeline.tick()
    }

    // --- Pitch ---

    pub fn pitch_table(&self) -> &Arc<PitchTable> {
        &self.pitch
    }

    /// Server-wide override. Any value other than 1.0 supersedes every
    /// actor's own pitch.
    pub fn set_global_pitch(&self, ratio: f32) -> Result<()> {
        self.pitch.set_global(ratio)?;
        tracing::debug!("Global pitch override set to {}", ratio);
        Ok(())
    }

    pub fn set_global_semitones(&self, semitones: f32) -> Result<()> {
        Ok(self.pitch.set_global_semitones(semitones)?)
    }

    pub fn reset_global_pitch(&self) {
        self.pitch.reset_global();
    }

    pub fn set_actor_pitch(&self, actor: ActorId, ratio: f32) -> Result<()> {
        Ok(self.pitch.set_actor(actor, ratio)?)
    }

    pub fn set_actor_semitones(&self, actor: ActorId, semitones: f32) -> Result<()> {
        Ok(self.pitch.set_actor_semitones(actor, semitones)?)
    }

    pub fn clear_actor_pitch(&self, actor: ActorId) {
        self.pitch.clear_actor(actor);
    }

    /// Ratio that will be applied to `actor`'s next frame.
    pub fn effective_pitch(&self, actor: ActorId) -> f32 {
        self.pitch.effective(actor)
    }

    // --- Lifecycle ---

    pub fn start(&mut self) -> Result<()> {
        Ok(self.pipeline.start()?)
    }

    /// Finish queued frames and stop the worker. Finished frames are still
    /// delivered by subsequent ticks.
    pub fn stop(&mut self) {
        self.pipeline.stop();
    }

    pub fn is_running(&self) -> bool {
        self.pipeline.is_running()
    }

    pub fn metrics(&self) -> PipelineMetricsSnapshot {
        self.pipeline.metrics()
    }

    pub fn config(&self) -> &PipelineConfig {
        self.pipeline.config()
    }

    /// Sample delay added to shifted voices.
    pub fn latency_samples(&self) -> usize {
        self.pipeline.config().vocoder.latency()
    }

    /// Submission handle for hosts that drive the pipeline directly.
    pub fn pipeline_handle(&self) -> PipelineHandle {
        self.handle.clone()
    }
}
