//! Identifiers attached to voice frames.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Lookup key for the actor (player) a voice frame belongs to.
///
/// Only used for attribution and for finding per-actor state; it never
/// keeps anything alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl ActorId {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for ActorId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Routing tag of a voice message (proximity, radio, intercom...).
///
/// The pipeline never interprets it, it is handed back unchanged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct VoiceChannel(pub u8);

impl From<u8> for VoiceChannel {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

impl fmt::Display for VoiceChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel {}", self.0)
    }
}
