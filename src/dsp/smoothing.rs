//! Fractional-octave smoothing of dB magnitude spectra.
//!
//! Smoothing operates in the linear-power domain: each output bin is an
//! arithmetic mean of linear power over a frequency-proportional window,
//! converted back to dB. Below 20 Hz the input bin is passed through
//! unchanged — fractional-octave windows below that frequency would
//! otherwise span a negative or degenerate bin range.

use crate::config::SmoothingKind;

/// Smooths a dB magnitude spectrum by `kind`.
///
/// `sample_rate` and the FFT size `n` (spectrum.len() == n/2 + 1) locate
/// each bin's center frequency. Returns the input unchanged when `kind`
/// is [`SmoothingKind::None`].
pub fn smooth(spectrum_db: &[f64], kind: SmoothingKind, sample_rate: f64, n: usize) -> Vec<f64> {
    let Some(k) = kind.fraction() else {
        return spectrum_db.to_vec();
    };

    let bins = spectrum_db.len();
    let power: Vec<f64> = spectrum_db.iter().map(|&db| 10f64.powf(db / 10.0)).collect();
    let ratio = 2f64.powf(1.0 / (2.0 * k));

    (0..bins)
        .map(|i| {
            let f_i = i as f64 * sample_rate / n as f64;
            if f_i < 20.0 {
                return spectrum_db[i];
            }
            let f_low = f_i / ratio;
            let f_high = f_i * ratio;
            let lo = ((f_low * n as f64 / sample_rate).round() as isize)
                .clamp(0, bins as isize - 1) as usize;
            let hi = ((f_high * n as f64 / sample_rate).round() as isize)
                .clamp(0, bins as isize - 1) as usize;
            let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
            let mean = power[lo..=hi].iter().sum::<f64>() / (hi - lo + 1) as f64;
            10.0 * mean.log10()
        })
        .collect()
}
