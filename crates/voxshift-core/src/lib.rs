//! Shared building blocks for the voxshift voice pipeline.
//!
//! - [`ActorId`] / [`VoiceChannel`]: identity and routing tags carried with every voice frame
//! - [`PitchTable`]: global override plus per-actor pitch ratios

pub mod error;
pub use error::{Error, Result};

mod ids;
pub use ids::{ActorId, VoiceChannel};

mod lockfree;

pub mod pitch;
pub use pitch::{ratio_to_semitones, semitones_to_ratio, PitchTable, NO_SHIFT};
