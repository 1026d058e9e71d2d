//! Centralized error type for the voxshift umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;
use voxshift_core::ActorId;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] voxshift_core::Error),

    #[error("DSP: {0}")]
    Dsp(#[from] voxshift_dsp::Error),

    #[error("Pipeline: {0}")]
    Pipeline(#[from] voxshift_pipeline::Error),

    /// Shifted frames need the actor's codec, which lives in its session.
    #[error("No voice session open for {0}")]
    UnknownSession(ActorId),

    #[error("No voice sink configured")]
    MissingSink,
}

pub type Result<T> = std::result::Result<T, Error>;
