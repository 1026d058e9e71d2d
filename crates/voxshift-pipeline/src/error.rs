//! Error types.

use crate::CodecError;
use thiserror::Error;
use voxshift_core::ActorId;

/// Errors reported synchronously to the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid pipeline configuration.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Invalid vocoder configuration.
    #[error("DSP: {0}")]
    Dsp(#[from] voxshift_dsp::Error),

    /// A submission was rejected before entering the pipeline.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The worker thread could not be spawned.
    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(String),

    /// The worker's queue is gone (worker thread died).
    #[error("Pipeline worker is gone")]
    WorkerGone,
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure while applying a packet's action on the worker thread.
///
/// Never returned to the submitter: the worker logs it and drops the packet.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// Pitch-shift packet without an actor to look up vocoder state for.
    #[error("Packet has no speaker")]
    MissingSpeaker,

    /// Pitch-shift packet without codec handles.
    #[error("Packet has no codec handles")]
    MissingCodec,

    /// The session owning the codec ended while the packet was in flight.
    #[error("Codec handle for {0} was released")]
    HandleReleased(ActorId),

    /// The codec adapter failed.
    #[error("Codec: {0}")]
    Codec(#[from] CodecError),

    /// Vocoder state could not be created.
    #[error("DSP: {0}")]
    Dsp(#[from] voxshift_dsp::Error),

    /// A custom action reported a failure.
    #[error("Action failed: {0}")]
    Action(String),

    /// The action panicked; the panic was contained.
    #[error("Action panicked: {0}")]
    Panicked(String),
}

impl ProcessError {
    pub fn action(message: impl Into<String>) -> Self {
        ProcessError::Action(message.into())
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
