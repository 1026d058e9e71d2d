//! In-place radix-2 FFT over interleaved complex buffers.
//!
//! Buffers hold `2 * frame_size` values laid out as `[re0, im0, re1, im1, ...]`.
//! The transform is unnormalized in both directions: `inverse(forward(x))`
//! yields `frame_size * x`, and dividing by `frame_size` is left to the caller.

use std::f64::consts::PI;

/// Transform direction. Selects the sign of the twiddle factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftDirection {
    /// `e^{-2πi kn/N}`
    Forward,
    /// `e^{+2πi kn/N}`
    Inverse,
}

impl FftDirection {
    #[inline]
    fn sign(self) -> f64 {
        match self {
            FftDirection::Forward => -1.0,
            FftDirection::Inverse => 1.0,
        }
    }
}

/// Smallest frame the vocoder can run: two real bins plus one hop.
pub const MIN_FRAME_SIZE: usize = 4;

/// True if `frame_size` can be transformed by [`transform`] and analysed by
/// the vocoder.
#[inline]
pub fn is_valid_frame_size(frame_size: usize) -> bool {
    frame_size >= MIN_FRAME_SIZE && frame_size.is_power_of_two()
}

/// Transform `buffer[..2 * frame_size]` in place.
///
/// `frame_size` must be a power of two. This is checked once when a
/// [`VocoderConfig`](crate::VocoderConfig) is built; here it is only a debug
/// assertion, and a bad size produces garbage rather than an error.
pub fn transform(buffer: &mut [f64], frame_size: usize, direction: FftDirection) {
    debug_assert!(is_valid_frame_size(frame_size));
    debug_assert!(buffer.len() >= 2 * frame_size);

    bit_reverse(buffer, frame_size);

    let sign = direction.sign();
    let mut len = 2;
    while len <= frame_size {
        let half = len / 2;
        let angle = sign * 2.0 * PI / len as f64;
        let (step_re, step_im) = (angle.cos(), angle.sin());

        for start in (0..frame_size).step_by(len) {
            let mut w_re = 1.0;
            let mut w_im = 0.0;
            for k in 0..half {
                let a = 2 * (start + k);
                let b = 2 * (start + k + half);

                let t_re = buffer[b] * w_re - buffer[b + 1] * w_im;
                let t_im = buffer[b] * w_im + buffer[b + 1] * w_re;

                buffer[b] = buffer[a] - t_re;
                buffer[b + 1] = buffer[a + 1] - t_im;
                buffer[a] += t_re;
                buffer[a + 1] += t_im;

                let next_re = w_re * step_re - w_im * step_im;
                w_im = w_re * step_im + w_im * step_re;
                w_re = next_re;
            }
        }
        len <<= 1;
    }
}

/// Reorder complex pairs into bit-reversed index order.
fn bit_reverse(buffer: &mut [f64], frame_size: usize) {
    let mut j = 0;
    for i in 1..frame_size {
        let mut bit = frame_size >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j |= bit;

        if i < j {
            buffer.swap(2 * i, 2 * j);
            buffer.swap(2 * i + 1, 2 * j + 1);
        }
    }
}
