//! Relaxed atomic storage for pitch ratios.

use crate::pitch::NO_SHIFT;
use atomic_float::AtomicF32;
use std::sync::atomic::Ordering;

/// One pitch ratio, written by whoever turns the knob and read by every
/// submitting thread.
///
/// Nothing else is published through the knob, so loads and stores are
/// relaxed. A reader may see a new ratio one frame late.
#[derive(Debug)]
#[repr(align(64))]
pub(crate) struct PitchKnob(AtomicF32);

impl PitchKnob {
    pub(crate) fn unshifted() -> Self {
        Self(AtomicF32::new(NO_SHIFT))
    }

    #[inline]
    pub(crate) fn ratio(&self) -> f32 {
        self.0.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn store(&self, ratio: f32) {
        self.0.store(ratio, Ordering::Relaxed);
    }
}
