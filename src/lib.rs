//! # Voxshift - Real-time Voice Pitch Shifting
//!
//! Shifts the pitch of live voice streams without stalling the thread that
//! receives them.
//!
//! ## Architecture
//!
//! Voxshift is an umbrella crate that coordinates:
//! - **voxshift-core** - Actor/channel ids, lock-free atomics, pitch resolution
//! - **voxshift-dsp** - Radix-2 FFT and the phase-vocoder pitch shifter
//! - **voxshift-pipeline** - Packet pool, worker thread, frame dispatcher
//!
//! ## Quick Start
//!
//! ```ignore
//! use voxshift::prelude::*;
//!
//! let engine = VoxEngine::builder()
//!     .sink(|actor, message| network.broadcast(actor, message))
//!     .build()?;
//!
//! engine.open_session(actor, shared_decoder(codec.clone()), shared_encoder(codec))?;
//! engine.set_actor_semitones(actor, 4.0)?;
//!
//! // On the network thread, for every incoming voice frame
//! engine.process_message(actor, VoiceMessage::new(channel, payload))?;
//!
//! // Once per server frame
//! engine.tick();
//! ```
//!
//! Frames from actors whose effective pitch is 1.0 are forwarded to the sink
//! immediately. Shifted frames arrive `latency_samples()` later and only on
//! `tick()`. Frames that fail to decode or encode are logged and dropped.

pub mod error;
pub use error::{Error, Result};

/// Re-export of voxshift-core for direct access
pub use voxshift_core as core;

/// Re-export of voxshift-dsp for direct access
pub use voxshift_dsp as dsp;

/// Re-export of voxshift-pipeline for direct access
pub use voxshift_pipeline as pipeline;

// Core types
pub use voxshift_core::{
    ratio_to_semitones, semitones_to_ratio, ActorId, PitchTable, VoiceChannel, NO_SHIFT,
};

// DSP
pub use voxshift_dsp::{PhaseVocoder, VocoderConfig};

// Pipeline
pub use voxshift_pipeline::{
    pcm16_bytes, shared_decoder, shared_encoder, CodecError, FrameDispatcher, Packet,
    PacketAction, PacketModifier, PacketPool, PacketRequest, Pcm16Codec, PipelineConfig,
    PipelineHandle, PipelineMetrics, PipelineMetricsSnapshot, ProcessError, SharedDecoder,
    SharedEncoder, VoiceDecoder, VoiceEncoder, VoicePipeline,
};

mod builder;
mod engine;

pub use builder::VoxEngineBuilder;
pub use engine::{Route, VoiceMessage, VoiceSink, VoxEngine};

/// Convenience prelude for common imports
pub mod prelude {
    // Main engine
    pub use crate::{Route, VoiceMessage, VoiceSink, VoxEngine, VoxEngineBuilder};

    // Identity
    pub use crate::{ActorId, VoiceChannel};

    // Codec boundary
    pub use crate::{
        shared_decoder, shared_encoder, CodecError, Pcm16Codec, VoiceDecoder, VoiceEncoder,
    };

    // Configuration
    pub use crate::{PipelineConfig, VocoderConfig};
}
