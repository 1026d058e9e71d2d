//! Pitch resolution: one server-wide override plus one ratio per actor.
//!
//! The effective ratio for an actor is the global override whenever it is
//! not [`NO_SHIFT`], otherwise the actor's own ratio. A non-default global
//! value therefore supersedes every actor's setting.

use crate::lockfree::PitchKnob;
use crate::{ActorId, Error, Result};
use dashmap::DashMap;

/// Ratio meaning "leave the voice untouched".
pub const NO_SHIFT: f32 = 1.0;

/// Convert a shift in semitones to a frequency ratio: `2^(semitones/12)`.
#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    2.0_f32.powf(semitones / 12.0)
}

/// Convert a frequency ratio back to semitones.
#[inline]
pub fn ratio_to_semitones(ratio: f32) -> f32 {
    12.0 * ratio.log2()
}

fn validate(ratio: f32) -> Result<f32> {
    if ratio.is_finite() && ratio > 0.0 {
        Ok(ratio)
    } else {
        Err(Error::InvalidPitch(ratio))
    }
}

/// Global and per-actor pitch knobs.
///
/// Setters may be called from any thread. Readers use relaxed loads; the
/// values are advisory and a change becomes visible on the next submission.
#[derive(Debug)]
pub struct PitchTable {
    global: PitchKnob,
    actors: DashMap<ActorId, PitchKnob>,
}

impl PitchTable {
    pub fn new() -> Self {
        Self {
            global: PitchKnob::unshifted(),
            actors: DashMap::new(),
        }
    }

    /// Current global override (1.0 when unset).
    #[inline]
    pub fn global(&self) -> f32 {
        self.global.ratio()
    }

    pub fn set_global(&self, ratio: f32) -> Result<()> {
        self.global.store(validate(ratio)?);
        Ok(())
    }

    pub fn set_global_semitones(&self, semitones: f32) -> Result<()> {
        self.set_global(semitones_to_ratio(semitones))
    }

    /// Drop the global override so actor ratios apply again.
    pub fn reset_global(&self) {
        self.global.store(NO_SHIFT);
    }

    /// Ratio configured for `actor` (1.0 when never set).
    pub fn actor(&self, actor: ActorId) -> f32 {
        self.actors
            .get(&actor)
            .map(|knob| knob.ratio())
            .unwrap_or(NO_SHIFT)
    }

    pub fn set_actor(&self, actor: ActorId, ratio: f32) -> Result<()> {
        let ratio = validate(ratio)?;
        self.actors
            .entry(actor)
            .or_insert_with(PitchKnob::unshifted)
            .store(ratio);
        Ok(())
    }

    pub fn set_actor_semitones(&self, actor: ActorId, semitones: f32) -> Result<()> {
        self.set_actor(actor, semitones_to_ratio(semitones))
    }

    /// Forget the actor's ratio, e.g. when the actor leaves.
    pub fn clear_actor(&self, actor: ActorId) {
        self.actors.remove(&actor);
    }

    /// Number of actors with their own ratio.
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Ratio that governs processing for `actor`.
    #[inline]
    pub fn effective(&self, actor: ActorId) -> f32 {
        let global = self.global.ratio();
        if global != NO_SHIFT {
            global
        } else {
            self.actor(actor)
        }
    }

    /// True when frames from `actor` skip the pipeline entirely.
    #[inline]
    pub fn is_bypassed(&self, actor: ActorId) -> bool {
        self.effective(actor) == NO_SHIFT
    }
}

impl Default for PitchTable {
    fn default() -> Self {
        Self::new()
    }
}
