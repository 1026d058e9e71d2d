//! Pooled unit of work moving through the pipeline.

use crate::codec::{WeakDecoder, WeakEncoder};
use crate::{Error, ProcessError, Result, SharedDecoder, SharedEncoder};
use std::fmt;
use std::sync::Arc;
use voxshift_core::{ActorId, VoiceChannel, NO_SHIFT};

/// Completion callback, invoked at most once on the dispatcher thread.
pub type ProcessedCallback = Box<dyn FnOnce(&Packet) + Send + 'static>;

/// Caller-supplied processing step run on the worker thread.
///
/// Returning an error drops the packet without invoking its callback.
pub trait PacketModifier: Send + Sync {
    fn modify(&self, packet: &mut Packet) -> std::result::Result<(), ProcessError>;
}

impl<F> PacketModifier for F
where
    F: Fn(&mut Packet) -> std::result::Result<(), ProcessError> + Send + Sync,
{
    fn modify(&self, packet: &mut Packet) -> std::result::Result<(), ProcessError> {
        self(packet)
    }
}

/// What the worker does with a packet.
#[derive(Clone)]
pub enum PacketAction {
    /// Decode, run the speaker's phase vocoder at the packet's pitch, re-encode.
    PitchShift,
    /// Run a caller-supplied modifier.
    Custom(Arc<dyn PacketModifier>),
}

impl PacketAction {
    pub fn custom(modifier: impl PacketModifier + 'static) -> Self {
        PacketAction::Custom(Arc::new(modifier))
    }

    /// Custom action from a closure.
    pub fn from_fn<F>(modify: F) -> Self
    where
        F: Fn(&mut Packet) -> std::result::Result<(), ProcessError> + Send + Sync + 'static,
    {
        PacketAction::Custom(Arc::new(modify))
    }
}

impl fmt::Debug for PacketAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketAction::PitchShift => f.write_str("PitchShift"),
            PacketAction::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// A voice frame in flight.
///
/// Owned by exactly one pipeline stage at a time. `data()` is the valid
/// payload; the underlying allocation is kept when the packet returns to
/// the pool.
pub struct Packet {
    pub(crate) action: Option<PacketAction>,
    pub(crate) buffer: Vec<u8>,
    pub(crate) pitch: f32,
    pub(crate) speaker: Option<ActorId>,
    pub(crate) decoder: Option<WeakDecoder>,
    pub(crate) encoder: Option<WeakEncoder>,
    pub(crate) on_processed: Option<ProcessedCallback>,
    pub(crate) channel: VoiceChannel,
}

impl Packet {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            action: None,
            buffer: Vec::with_capacity(capacity),
            pitch: NO_SHIFT,
            speaker: None,
            decoder: None,
            encoder: None,
            on_processed: None,
            channel: VoiceChannel::default(),
        }
    }

    /// Valid payload bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    /// Payload for custom actions to rewrite in place.
    #[inline]
    pub fn buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buffer
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Allocated payload capacity, always `>= len()`.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    #[inline]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    #[inline]
    pub fn speaker(&self) -> Option<ActorId> {
        self.speaker
    }

    #[inline]
    pub fn channel(&self) -> VoiceChannel {
        self.channel
    }

    pub fn action(&self) -> Option<&PacketAction> {
        self.action.as_ref()
    }

    /// Copy a request into this packet. The request's bytes are copied so
    /// the caller may reuse its buffer as soon as `submit` returns.
    pub(crate) fn fill(&mut self, request: PacketRequest<'_>) {
        self.buffer.clear();
        self.buffer.extend_from_slice(request.data);
        self.action = request.action;
        self.pitch = request.pitch;
        self.speaker = request.speaker;
        self.decoder = request.decoder;
        self.encoder = request.encoder;
        self.on_processed = request.on_processed;
        self.channel = request.channel;
    }

    /// Drop everything the caller supplied, keeping the buffer allocation.
    pub(crate) fn clear(&mut self) {
        self.action = None;
        self.buffer.clear();
        self.pitch = NO_SHIFT;
        self.speaker = None;
        self.decoder = None;
        self.encoder = None;
        self.on_processed = None;
        self.channel = VoiceChannel::default();
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("action", &self.action)
            .field("len", &self.buffer.len())
            .field("pitch", &self.pitch)
            .field("speaker", &self.speaker)
            .field("channel", &self.channel)
            .field("has_callback", &self.on_processed.is_some())
            .finish()
    }
}

/// Everything a caller hands to [`PipelineHandle::submit`](crate::PipelineHandle::submit).
///
/// # Example
///
/// ```ignore
/// let request = PacketRequest::new(&frame, VoiceChannel(1))
///     .pitch_shift(1.25, actor, &decoder, &encoder)
///     .on_processed(move |packet| sink.send(packet.data()));
/// ```
pub struct PacketRequest<'a> {
    data: &'a [u8],
    channel: VoiceChannel,
    action: Option<PacketAction>,
    pitch: f32,
    speaker: Option<ActorId>,
    decoder: Option<WeakDecoder>,
    encoder: Option<WeakEncoder>,
    on_processed: Option<ProcessedCallback>,
}

impl<'a> PacketRequest<'a> {
    pub fn new(data: &'a [u8], channel: VoiceChannel) -> Self {
        Self {
            data,
            channel,
            action: None,
            pitch: NO_SHIFT,
            speaker: None,
            decoder: None,
            encoder: None,
            on_processed: None,
        }
    }

    /// Standard pitch-shift action for `speaker`'s stream.
    pub fn pitch_shift(
        self,
        ratio: f32,
        speaker: ActorId,
        decoder: &SharedDecoder,
        encoder: &SharedEncoder,
    ) -> Self {
        self.action(PacketAction::PitchShift)
            .pitch(ratio)
            .speaker(speaker)
            .codec(decoder, encoder)
    }

    pub fn action(mut self, action: PacketAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn pitch(mut self, ratio: f32) -> Self {
        self.pitch = ratio;
        self
    }

    pub fn speaker(mut self, speaker: ActorId) -> Self {
        self.speaker = Some(speaker);
        self
    }

    /// Borrow the session's codec for the duration of processing.
    pub fn codec(mut self, decoder: &SharedDecoder, encoder: &SharedEncoder) -> Self {
        self.decoder = Some(Arc::downgrade(decoder));
        self.encoder = Some(Arc::downgrade(encoder));
        self
    }

    pub fn on_processed(mut self, callback: impl FnOnce(&Packet) + Send + 'static) -> Self {
        self.on_processed = Some(Box::new(callback));
        self
    }

    /// Reject requests the worker could never process.
    pub(crate) fn validate(&self, max_packet_bytes: usize) -> Result<()> {
        if self.data.len() > max_packet_bytes {
            return Err(Error::InvalidArgument(format!(
                "payload of {} bytes exceeds max_packet_bytes {}",
                self.data.len(),
                max_packet_bytes
            )));
        }
        if !self.pitch.is_finite() || self.pitch <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "pitch ratio must be finite and > 0, got {}",
                self.pitch
            )));
        }
        if let Some(PacketAction::PitchShift) = self.action {
            if self.speaker.is_none() {
                return Err(Error::InvalidArgument(
                    "pitch-shift request requires a speaker".into(),
                ));
            }
            if self.decoder.is_none() || self.encoder.is_none() {
                return Err(Error::InvalidArgument(
                    "pitch-shift request requires codec handles".into(),
                ));
            }
        }
        Ok(())
    }
}
