//! Low-level signal-processing primitives shared by every higher-level
//! service: the cached FFT core, the cached window family, and the
//! fractional-octave smoothing operator.

pub mod fft;
pub mod smoothing;
pub mod window;

pub use fft::{Complex, FftCore};
pub use smoothing::smooth;
pub use window::{create_window, WindowCache};
