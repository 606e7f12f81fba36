//! Windowed FFT processing and spectral averaging.
//!
//! [`SpectralProcessor`] owns one [`SpectralAccumulator`] per FFT size in
//! use (the primary size, plus the three Multi-Time-Window sizes), and
//! turns ring-buffer contents into averaged Sxx/Syy/Sxy spectra on
//! demand.

mod accumulator;
mod processor;

pub use accumulator::{compute_instantaneous, InstantaneousSpectra, SpectralAccumulator};
pub use processor::SpectralProcessor;

/// Multi-Time-Window FFT sizes, largest (lowest-frequency band) first.
pub const MTW_LOW_FFT_SIZE: usize = 16384;
pub const MTW_MID_FFT_SIZE: usize = 4096;
pub const MTW_HIGH_FFT_SIZE: usize = 1024;

/// Upper frequency bound, in Hz, of the low and mid MTW bands.
pub const MTW_LOW_BAND_MAX_HZ: f64 = 200.0;
pub const MTW_MID_BAND_MAX_HZ: f64 = 2000.0;

pub const MTW_SIZES: [usize; 3] = [MTW_LOW_FFT_SIZE, MTW_MID_FFT_SIZE, MTW_HIGH_FFT_SIZE];

/// Number of non-negative-frequency bins for an `n`-point real FFT.
pub fn bins_for(n: usize) -> usize {
    n / 2 + 1
}
