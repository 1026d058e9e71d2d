//! Codec adapter boundary.
//!
//! The pipeline never interprets compressed voice data. Each actor's session
//! owns a decoder and an encoder behind shared handles; packets only carry
//! weak references to them, so ending a session mid-flight turns into a
//! per-packet processing error instead of keeping the codec alive.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use thiserror::Error;

/// Failure reported by a codec adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct CodecError(pub String);

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Decodes compressed voice frames to mono PCM.
pub trait VoiceDecoder: Send {
    /// Decode `compressed` into `pcm`, returning the number of samples written.
    fn decode(&mut self, compressed: &[u8], pcm: &mut [f32]) -> Result<usize, CodecError>;
}

/// Encodes mono PCM back to compressed voice frames.
pub trait VoiceEncoder: Send {
    /// Encode `pcm` into `compressed`, returning the number of bytes written.
    fn encode(&mut self, pcm: &[f32], compressed: &mut [u8]) -> Result<usize, CodecError>;
}

pub type SharedDecoder = Arc<Mutex<dyn VoiceDecoder>>;
pub type SharedEncoder = Arc<Mutex<dyn VoiceEncoder>>;
pub(crate) type WeakDecoder = Weak<Mutex<dyn VoiceDecoder>>;
pub(crate) type WeakEncoder = Weak<Mutex<dyn VoiceEncoder>>;

pub fn shared_decoder(decoder: impl VoiceDecoder + 'static) -> SharedDecoder {
    Arc::new(Mutex::new(decoder))
}

pub fn shared_encoder(encoder: impl VoiceEncoder + 'static) -> SharedEncoder {
    Arc::new(Mutex::new(encoder))
}

/// Uncompressed little-endian signed 16-bit PCM.
///
/// Useful for hosts that carry raw voice and as a deterministic stand-in for
/// a real codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pcm16Codec;

impl VoiceDecoder for Pcm16Codec {
    fn decode(&mut self, compressed: &[u8], pcm: &mut [f32]) -> Result<usize, CodecError> {
        if compressed.len() % 2 != 0 {
            return Err(CodecError::new(format!(
                "PCM16 payload has odd length {}",
                compressed.len()
            )));
        }
        let count = compressed.len() / 2;
        if count > pcm.len() {
            return Err(CodecError::new(format!(
                "PCM16 payload holds {} samples, frame fits {}",
                count,
                pcm.len()
            )));
        }
        for (out, bytes) in pcm.iter_mut().zip(compressed.chunks_exact(2)) {
            *out = i16::from_le_bytes([bytes[0], bytes[1]]) as f32 / 32768.0;
        }
        Ok(count)
    }
}

impl VoiceEncoder for Pcm16Codec {
    fn encode(&mut self, pcm: &[f32], compressed: &mut [u8]) -> Result<usize, CodecError> {
        let needed = pcm.len() * 2;
        if compressed.len() < needed {
            return Err(CodecError::new(format!(
                "PCM16 output needs {} bytes, have {}",
                needed,
                compressed.len()
            )));
        }
        for (bytes, &sample) in compressed.chunks_exact_mut(2).zip(pcm) {
            let value = (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16;
            bytes.copy_from_slice(&value.to_le_bytes());
        }
        Ok(needed)
    }
}

/// Encode a PCM frame with [`Pcm16Codec`].
pub fn pcm16_bytes(pcm: &[f32]) -> Vec<u8> {
    pcm.iter()
        .flat_map(|&s| ((s.clamp(-1.0, 1.0) * 32767.0).round() as i16).to_le_bytes())
        .collect()
}
