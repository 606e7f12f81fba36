//! Closed-set configuration types for the engine.
//!
//! Averaging, window, and smoothing kinds are plain `Copy` enums with a
//! free dispatch function each, rather than trait objects — the set of
//! variants is fixed and per-bin virtual dispatch would be wasted cost
//! in the hot path (spec.md §9).

use crate::error::EngineError;

/// Smallest FFT size the engine will accept.
pub const MIN_FFT_SIZE: usize = 64;
/// Largest FFT size the engine will accept.
pub const MAX_FFT_SIZE: usize = 32768;

/// How the spectral accumulator combines successive instantaneous blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AveragingKind {
    /// Accumulator is overwritten by each new block; no history.
    None,
    /// Exponential moving average with time constant `averaging_count`.
    Exponential,
    /// Arithmetic mean over the most recent `averaging_count` blocks.
    Linear,
    /// Running mean over all blocks since the last reset.
    Infinite,
}

/// Analysis window applied before each forward FFT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    Rectangular,
    Hann,
    Hamming,
    BlackmanHarris4,
    FlatTop,
}

/// Fractional-octave smoothing applied to a dB magnitude spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothingKind {
    /// No smoothing; input returned unchanged.
    None,
    /// 1/1 octave.
    OneOverOne,
    /// 1/3 octave.
    OneOverThird,
    /// 1/6 octave.
    OneOverSixth,
    /// 1/12 octave.
    OneOverTwelfth,
    /// 1/24 octave.
    OneOverTwentyFourth,
    /// 1/48 octave.
    OneOverFortyEighth,
}

impl SmoothingKind {
    /// The octave-fraction denominator `k` (e.g. 3 for 1/3-octave), or
    /// `None` when no smoothing is requested.
    pub fn fraction(self) -> Option<f64> {
        match self {
            SmoothingKind::None => None,
            SmoothingKind::OneOverOne => Some(1.0),
            SmoothingKind::OneOverThird => Some(3.0),
            SmoothingKind::OneOverSixth => Some(6.0),
            SmoothingKind::OneOverTwelfth => Some(12.0),
            SmoothingKind::OneOverTwentyFourth => Some(24.0),
            SmoothingKind::OneOverFortyEighth => Some(48.0),
        }
    }
}

pub(crate) fn validate_fft_size(size: usize) -> Result<(), EngineError> {
    if size < MIN_FFT_SIZE || size > MAX_FFT_SIZE || !size.is_power_of_two() {
        return Err(EngineError::InvalidFftSize {
            size,
            min: MIN_FFT_SIZE,
            max: MAX_FFT_SIZE,
        });
    }
    Ok(())
}

pub(crate) fn validate_averaging_count(kind: AveragingKind, count: i64) -> Result<(), EngineError> {
    match kind {
        AveragingKind::Exponential | AveragingKind::Linear if count <= 0 => {
            Err(EngineError::InvalidAveragingCount { count })
        }
        _ => Ok(()),
    }
}

/// Validated construction parameters for an [`crate::engine::Engine`].
///
/// Immutable once built: changing the sample rate or buffer capacity
/// after construction is not supported (spec.md §1 — single fixed rate).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f64,
    pub buffer_capacity: usize,
    pub primary_fft_size: usize,
}

impl EngineConfig {
    pub fn new(
        sample_rate: f64,
        buffer_capacity: usize,
        primary_fft_size: usize,
    ) -> Result<Self, EngineError> {
        validate_fft_size(primary_fft_size)?;
        Ok(Self {
            sample_rate,
            buffer_capacity,
            primary_fft_size,
        })
    }
}
