//! Tolerance constants for voice DSP testing.

/// Floating point rounding errors.
pub const FLOAT_EPSILON: f32 = 1e-6;

/// FFT round trip error in double precision.
pub const FFT_EPSILON: f64 = 1e-9;

/// RMS below which vocoder output counts as silent.
pub const SILENCE_RMS: f32 = 1e-3;

/// Width of one analysis bin with the default 2048-point frame at 48kHz.
pub const VOCODER_BIN_HZ: f64 = 48000.0 / 2048.0;

/// Pre-latency leakage allowed at unity pitch, relative to steady-state RMS.
pub const ONSET_LEAKAGE_RATIO: f32 = 0.02;

/// 16-bit quantization step size.
pub const INT16_EPSILON: f32 = 1.0 / 32768.0;
