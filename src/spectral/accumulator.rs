//! Per-FFT-size spectral accumulator and averaging policies.

use crate::config::AveragingKind;

/// Instantaneous (single-block) spectral quantities for one FFT size.
///
/// Every array has length `bins = n/2 + 1`.
#[derive(Debug, Clone)]
pub struct InstantaneousSpectra {
    pub sxx: Vec<f64>,
    pub syy: Vec<f64>,
    pub sxy_re: Vec<f64>,
    pub sxy_im: Vec<f64>,
    pub rta_ref: Vec<f64>,
    pub rta_meas: Vec<f64>,
}

impl InstantaneousSpectra {
    fn zeroed(bins: usize) -> Self {
        Self {
            sxx: vec![0.0; bins],
            syy: vec![0.0; bins],
            sxy_re: vec![0.0; bins],
            sxy_im: vec![0.0; bins],
            rta_ref: vec![0.0; bins],
            rta_meas: vec![0.0; bins],
        }
    }
}

/// Running average of spectral quantities for a single FFT size, under
/// one of four averaging policies (spec.md §4.3).
#[derive(Debug, Clone)]
pub struct SpectralAccumulator {
    bins: usize,
    pub sxx: Vec<f64>,
    pub syy: Vec<f64>,
    pub sxy_re: Vec<f64>,
    pub sxy_im: Vec<f64>,
    pub rta_ref: Vec<f64>,
    pub rta_meas: Vec<f64>,
    count: u64,
    fifo: Vec<InstantaneousSpectra>,
}

impl SpectralAccumulator {
    pub fn new(bins: usize) -> Self {
        Self {
            bins,
            sxx: vec![0.0; bins],
            syy: vec![0.0; bins],
            sxy_re: vec![0.0; bins],
            sxy_im: vec![0.0; bins],
            rta_ref: vec![0.0; bins],
            rta_meas: vec![0.0; bins],
            count: 0,
            fifo: Vec::new(),
        }
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn reset(&mut self) {
        self.sxx.iter_mut().for_each(|v| *v = 0.0);
        self.syy.iter_mut().for_each(|v| *v = 0.0);
        self.sxy_re.iter_mut().for_each(|v| *v = 0.0);
        self.sxy_im.iter_mut().for_each(|v| *v = 0.0);
        self.rta_ref.iter_mut().for_each(|v| *v = 0.0);
        self.rta_meas.iter_mut().for_each(|v| *v = 0.0);
        self.count = 0;
        self.fifo.clear();
    }

    /// Folds a new instantaneous block into the accumulator under `kind`.
    pub fn update(&mut self, inst: InstantaneousSpectra, kind: AveragingKind, averaging_count: i64) {
        debug_assert_eq!(inst.sxx.len(), self.bins);

        match kind {
            AveragingKind::None => {
                self.sxx.copy_from_slice(&inst.sxx);
                self.syy.copy_from_slice(&inst.syy);
                self.sxy_re.copy_from_slice(&inst.sxy_re);
                self.sxy_im.copy_from_slice(&inst.sxy_im);
                self.rta_ref.copy_from_slice(&inst.rta_ref);
                self.rta_meas.copy_from_slice(&inst.rta_meas);
                self.count = 1;
            }
            AveragingKind::Exponential => {
                if self.count == 0 {
                    self.sxx.copy_from_slice(&inst.sxx);
                    self.syy.copy_from_slice(&inst.syy);
                    self.sxy_re.copy_from_slice(&inst.sxy_re);
                    self.sxy_im.copy_from_slice(&inst.sxy_im);
                    self.rta_ref.copy_from_slice(&inst.rta_ref);
                    self.rta_meas.copy_from_slice(&inst.rta_meas);
                } else {
                    let alpha = 2.0 / (averaging_count as f64 + 1.0);
                    ema(&mut self.sxx, &inst.sxx, alpha);
                    ema(&mut self.syy, &inst.syy, alpha);
                    ema(&mut self.sxy_re, &inst.sxy_re, alpha);
                    ema(&mut self.sxy_im, &inst.sxy_im, alpha);
                    ema(&mut self.rta_ref, &inst.rta_ref, alpha);
                    ema(&mut self.rta_meas, &inst.rta_meas, alpha);
                }
                self.count += 1;
            }
            AveragingKind::Linear => {
                self.fifo.push(inst);
                let depth = averaging_count.max(1) as usize;
                while self.fifo.len() > depth {
                    self.fifo.remove(0);
                }
                self.recompute_linear_mean();
                self.count = self.fifo.len() as u64;
            }
            AveragingKind::Infinite => {
                let n = self.count as f64;
                running_mean(&mut self.sxx, &inst.sxx, n);
                running_mean(&mut self.syy, &inst.syy, n);
                running_mean(&mut self.sxy_re, &inst.sxy_re, n);
                running_mean(&mut self.sxy_im, &inst.sxy_im, n);
                running_mean(&mut self.rta_ref, &inst.rta_ref, n);
                running_mean(&mut self.rta_meas, &inst.rta_meas, n);
                self.count += 1;
            }
        }
    }

    fn recompute_linear_mean(&mut self) {
        let n = self.fifo.len() as f64;
        for v in [
            &mut self.sxx,
            &mut self.syy,
            &mut self.sxy_re,
            &mut self.sxy_im,
            &mut self.rta_ref,
            &mut self.rta_meas,
        ] {
            v.iter_mut().for_each(|x| *x = 0.0);
        }
        for entry in &self.fifo {
            for (acc, val) in self.sxx.iter_mut().zip(&entry.sxx) {
                *acc += val;
            }
            for (acc, val) in self.syy.iter_mut().zip(&entry.syy) {
                *acc += val;
            }
            for (acc, val) in self.sxy_re.iter_mut().zip(&entry.sxy_re) {
                *acc += val;
            }
            for (acc, val) in self.sxy_im.iter_mut().zip(&entry.sxy_im) {
                *acc += val;
            }
            for (acc, val) in self.rta_ref.iter_mut().zip(&entry.rta_ref) {
                *acc += val;
            }
            for (acc, val) in self.rta_meas.iter_mut().zip(&entry.rta_meas) {
                *acc += val;
            }
        }
        for v in [
            &mut self.sxx,
            &mut self.syy,
            &mut self.sxy_re,
            &mut self.sxy_im,
            &mut self.rta_ref,
            &mut self.rta_meas,
        ] {
            v.iter_mut().for_each(|x| *x /= n);
        }
    }
}

fn ema(acc: &mut [f64], inst: &[f64], alpha: f64) {
    for (a, i) in acc.iter_mut().zip(inst) {
        *a = alpha * i + (1.0 - alpha) * *a;
    }
}

fn running_mean(acc: &mut [f64], inst: &[f64], n: f64) {
    for (a, i) in acc.iter_mut().zip(inst) {
        *a = (*a * n + i) / (n + 1.0);
    }
}

/// Computes the instantaneous spectra from a pair of windowed, forward-FFT'd
/// channel buffers of length `bins = n/2 + 1` (only the non-negative
/// frequencies are retained; a real input signal's spectrum is conjugate
/// symmetric).
pub fn compute_instantaneous(x: &[crate::dsp::Complex], y: &[crate::dsp::Complex], bins: usize) -> InstantaneousSpectra {
    let mut inst = InstantaneousSpectra::zeroed(bins);
    for i in 0..bins {
        let xi = x[i];
        let yi = y[i];
        inst.sxx[i] = xi.norm_sqr();
        inst.syy[i] = yi.norm_sqr();
        // conj(X) * Y
        inst.sxy_re[i] = xi.re * yi.re + xi.im * yi.im;
        inst.sxy_im[i] = xi.re * yi.im - xi.im * yi.re;
        inst.rta_ref[i] = inst.sxx[i];
        inst.rta_meas[i] = inst.syy[i];
    }
    inst
}
