//! GCC-PHAT delay estimation with parabolic sub-sample refinement.

mod gcc_phat;

pub use gcc_phat::{find_delay, DelayOutcome, DELAY_FFT_SIZE};

/// Delay estimate returned from [`crate::engine::Engine::compute_auto_delay`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayResult {
    pub ms: f64,
    pub meters: f64,
}
