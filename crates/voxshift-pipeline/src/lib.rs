//! Concurrent voice-packet pipeline with a dedicated pitch-shift worker.
//!
//! # Data flow
//!
//! ```text
//! submit() ──► PacketPool::acquire ──► pending queue ──► worker thread
//!                                                        (decode → shift → encode)
//!                                                              │
//!  PacketPool::release ◄── FrameDispatcher::drain ◄── output queue
//!                          (runs on_processed once per tick)
//! ```
//!
//! Packets are moved between stages, never shared: at any instant a packet
//! sits in exactly one of the free pool, the pending queue, the worker, or
//! the output queue.
//!
//! # Error model
//!
//! Submission validates its arguments synchronously and returns [`Error`].
//! Everything after that is fire-and-forget: a packet whose action fails is
//! logged and returned to the pool *without* its callback being invoked, so
//! callers must not assume every submission produces a callback.
//!
//! # Example
//!
//! ```ignore
//! use voxshift_pipeline::{PacketRequest, PipelineConfig, VoicePipeline};
//!
//! let mut pipeline = VoicePipeline::new(PipelineConfig::default())?;
//! pipeline.start()?;
//!
//! let handle = pipeline.handle();
//! handle.submit(
//!     PacketRequest::new(&frame, channel)
//!         .pitch_shift(1.5, actor, &decoder, &encoder)
//!         .on_processed(|packet| network.send(packet.data())),
//! )?;
//!
//! // Once per server tick, on the thread allowed to send
//! pipeline.tick();
//! ```

pub mod error;
pub use error::{Error, ProcessError, Result};

mod config;
pub use config::PipelineConfig;

mod codec;
pub use codec::{
    pcm16_bytes, shared_decoder, shared_encoder, CodecError, Pcm16Codec, SharedDecoder,
    SharedEncoder, VoiceDecoder, VoiceEncoder,
};

mod packet;
pub use packet::{Packet, PacketAction, PacketModifier, PacketRequest, ProcessedCallback};

mod pool;
pub use pool::PacketPool;

mod metrics;
pub use metrics::{PipelineMetrics, PipelineMetricsSnapshot};

mod bank;
mod worker;

mod dispatcher;
pub use dispatcher::FrameDispatcher;

mod pipeline;
pub use pipeline::{PipelineHandle, VoicePipeline};
