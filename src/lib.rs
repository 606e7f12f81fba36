//! Dual-channel real-time acoustic measurement engine.
//!
//! A single-threaded library core: ring buffers accept interleaved
//! real/measurement sample blocks from a host-supplied producer, a
//! cached windowed FFT turns them into instantaneous cross-spectra, an
//! averaging accumulator smooths those over time, and a transfer
//! function / GCC-PHAT delay finder / acoustic-metrics layer derive the
//! measurement results a room-acoustics or loudspeaker-alignment tool
//! actually wants. See [`Engine`] for the facade.
//!
//! No audio I/O, no UI, no persistence: the host drives everything
//! through [`Engine::push_samples`] and the `process_*`/`get_*` family.

mod logging;

pub mod buffer;
pub mod config;
pub mod delay;
pub mod dsp;
mod engine;
pub mod error;
pub mod metrics;
pub mod spectral;
pub mod transfer;

pub use config::{AveragingKind, EngineConfig, SmoothingKind, WindowKind};
pub use delay::DelayResult;
pub use engine::Engine;
pub use error::EngineError;
pub use metrics::AcousticMetrics;
pub use transfer::TransferFunctionResult;
