//! Per-speaker vocoder state, owned by the worker thread.

use std::collections::HashMap;
use voxshift_core::ActorId;
use voxshift_dsp::{PhaseVocoder, VocoderConfig};

/// One phase vocoder per speaking actor.
///
/// Speakers must not share state: each has its own FIFOs, phase
/// accumulators and overlap-add buffer.
pub(crate) struct VocoderBank {
    config: VocoderConfig,
    vocoders: HashMap<ActorId, PhaseVocoder>,
}

impl VocoderBank {
    pub(crate) fn new(config: VocoderConfig) -> Self {
        Self {
            config,
            vocoders: HashMap::new(),
        }
    }

    /// Start a fresh stream for `actor`, discarding any previous state.
    pub(crate) fn open(&mut self, actor: ActorId) -> Result<(), voxshift_dsp::Error> {
        self.vocoders.insert(actor, PhaseVocoder::new(self.config)?);
        tracing::debug!("Opened vocoder state for {}", actor);
        Ok(())
    }

    pub(crate) fn close(&mut self, actor: ActorId) -> bool {
        let removed = self.vocoders.remove(&actor).is_some();
        if removed {
            tracing::debug!("Released vocoder state for {}", actor);
        }
        removed
    }

    /// State for `actor`, created on first use.
    pub(crate) fn get_or_create(
        &mut self,
        actor: ActorId,
    ) -> Result<&mut PhaseVocoder, voxshift_dsp::Error> {
        use std::collections::hash_map::Entry;

        match self.vocoders.entry(actor) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                tracing::debug!("Created vocoder state for {} on first packet", actor);
                Ok(entry.insert(PhaseVocoder::new(self.config)?))
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.vocoders.len()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, actor: ActorId) -> bool {
        self.vocoders.contains_key(&actor)
    }
}
