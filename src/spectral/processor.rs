//! Drives windowed FFTs of the ring-buffer pair into per-size accumulators.

use super::{bins_for, compute_instantaneous, SpectralAccumulator};
use crate::buffer::RingBuffer;
use crate::config::{AveragingKind, WindowKind};
use crate::dsp::{Complex, FftCore, WindowCache};
use std::collections::HashMap;

/// Owns one [`SpectralAccumulator`] per FFT size that has been processed
/// at least once, created lazily.
#[derive(Default)]
pub struct SpectralProcessor {
    accumulators: HashMap<usize, SpectralAccumulator>,
}

impl SpectralProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulator(&self, n: usize) -> Option<&SpectralAccumulator> {
        self.accumulators.get(&n)
    }

    /// All accumulators created so far, keyed by FFT size.
    pub fn accumulators(&self) -> &HashMap<usize, SpectralAccumulator> {
        &self.accumulators
    }

    pub fn reset(&mut self) {
        for acc in self.accumulators.values_mut() {
            acc.reset();
        }
    }

    /// Attempts one windowed-FFT block update for FFT size `n`.
    ///
    /// Returns `false` without mutating any accumulator if either ring
    /// buffer holds fewer than `n` samples (spec.md §4.3).
    #[allow(clippy::too_many_arguments)]
    pub fn process_block(
        &mut self,
        ring_ref: &RingBuffer,
        ring_meas: &RingBuffer,
        fft: &mut FftCore,
        windows: &mut WindowCache,
        n: usize,
        window_kind: WindowKind,
        averaging_kind: AveragingKind,
        averaging_count: i64,
    ) -> bool {
        if ring_ref.available() < n || ring_meas.available() < n {
            return false;
        }

        let mut ref_time = vec![0.0f32; n];
        let mut meas_time = vec![0.0f32; n];
        // `process_block` is only reached once both reads are known to
        // succeed, so these can't fail.
        ring_ref.read_last(&mut ref_time).expect("checked availability above");
        ring_meas.read_last(&mut meas_time).expect("checked availability above");

        let window = windows.get(n, window_kind);

        let mut x: Vec<Complex> = ref_time
            .iter()
            .zip(window.iter())
            .map(|(&s, &w)| Complex::new(s as f64 * w, 0.0))
            .collect();
        let mut y: Vec<Complex> = meas_time
            .iter()
            .zip(window.iter())
            .map(|(&s, &w)| Complex::new(s as f64 * w, 0.0))
            .collect();

        fft.forward(&mut x);
        fft.forward(&mut y);

        let bins = bins_for(n);
        let inst = compute_instantaneous(&x, &y, bins);

        let acc = self
            .accumulators
            .entry(n)
            .or_insert_with(|| SpectralAccumulator::new(bins));
        acc.update(inst, averaging_kind, averaging_count);
        true
    }
}
