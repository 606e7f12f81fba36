//! Error types surfaced by the engine's public API.
//!
//! Per the propagation policy: configuration and contract violations are
//! surfaced here. Data-shape and numerical degeneracies (insufficient
//! samples, near-zero denominators) are recovered internally — empty
//! arrays, `false`, or zeroed results — and never produce an `EngineError`.

use thiserror::Error;

/// Errors the engine can return from its public, fallible entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    /// `push_samples` was called with reference and measurement blocks
    /// of differing length.
    #[error("channel length mismatch: ref has {ref_len} samples, meas has {meas_len}")]
    ChannelLengthMismatch { ref_len: usize, meas_len: usize },

    /// An FFT size was requested that is not a power of two, or falls
    /// outside the supported range.
    #[error("invalid FFT size {size}: must be a power of two in [{min}, {max}]")]
    InvalidFftSize {
        size: usize,
        min: usize,
        max: usize,
    },

    /// A non-positive averaging count was supplied for a policy that
    /// requires one (`Exponential`'s time constant, `Linear`'s FIFO
    /// depth).
    #[error("invalid averaging count {count}: must be positive")]
    InvalidAveragingCount { count: i64 },
}
