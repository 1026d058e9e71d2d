//! Error types for voxshift-dsp.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid FFT size: {0}. Must be a power of two >= 4")]
    InvalidFftSize(usize),

    #[error("Invalid oversampling factor {oversampling} for FFT size {fft_size}")]
    InvalidOversampling { fft_size: usize, oversampling: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
