use crate::config::SmoothingKind;
use crate::dsp::smooth;
use crate::spectral::{
    bins_for, SpectralAccumulator, MTW_HIGH_FFT_SIZE, MTW_LOW_BAND_MAX_HZ, MTW_LOW_FFT_SIZE,
    MTW_MID_BAND_MAX_HZ, MTW_MID_FFT_SIZE,
};
use std::collections::HashMap;

const SXX_FLOOR: f64 = 1e-30;
const MAG_FLOOR_DB: f64 = -120.0;

/// Magnitude, phase, coherence, and group delay derived from a transfer
/// function `H = Sxy / Sxx` (spec.md §4.4).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferFunctionResult {
    pub magnitude_db: Vec<f32>,
    pub phase_deg: Vec<f32>,
    pub coherence: Vec<f32>,
    pub group_delay_ms: Vec<f32>,
}

/// Extracts a [`TransferFunctionResult`] from the accumulator at the
/// primary FFT size. Returns empty arrays if the accumulator has never
/// been updated.
pub fn extract(
    acc: &SpectralAccumulator,
    sample_rate: f64,
    fft_size: usize,
    smoothing: SmoothingKind,
    tau_total_seconds: f64,
) -> TransferFunctionResult {
    if acc.count() == 0 {
        return TransferFunctionResult::default();
    }
    compute_from_raw(
        &acc.sxx,
        &acc.syy,
        &acc.sxy_re,
        &acc.sxy_im,
        sample_rate,
        fft_size,
        smoothing,
        tau_total_seconds,
    )
}

fn band_source_fft_size(freq_hz: f64) -> usize {
    if freq_hz < MTW_LOW_BAND_MAX_HZ {
        MTW_LOW_FFT_SIZE
    } else if freq_hz < MTW_MID_BAND_MAX_HZ {
        MTW_MID_FFT_SIZE
    } else {
        MTW_HIGH_FFT_SIZE
    }
}

/// Extracts a composite [`TransferFunctionResult`] at the primary FFT
/// resolution, sourcing each bin's cross-spectrum from whichever
/// Multi-Time-Window accumulator covers that bin's frequency band
/// (spec.md §4.5).
pub fn extract_mtw(
    accumulators: &HashMap<usize, SpectralAccumulator>,
    sample_rate: f64,
    primary_fft_size: usize,
    smoothing: SmoothingKind,
    tau_total_seconds: f64,
) -> TransferFunctionResult {
    let bins = bins_for(primary_fft_size);
    let mut sxx = vec![0.0; bins];
    let mut syy = vec![0.0; bins];
    let mut sxy_re = vec![0.0; bins];
    let mut sxy_im = vec![0.0; bins];

    for i in 0..bins {
        let f_i = i as f64 * sample_rate / primary_fft_size as f64;
        let source_n = band_source_fft_size(f_i);
        let Some(source_acc) = accumulators.get(&source_n) else {
            continue;
        };
        if source_acc.count() == 0 {
            continue;
        }
        let source_bins = source_acc.bins();
        let j = ((f_i * source_n as f64 / sample_rate).round() as isize)
            .clamp(0, source_bins as isize - 1) as usize;
        sxx[i] = source_acc.sxx[j];
        syy[i] = source_acc.syy[j];
        sxy_re[i] = source_acc.sxy_re[j];
        sxy_im[i] = source_acc.sxy_im[j];
    }

    compute_from_raw(
        &sxx,
        &syy,
        &sxy_re,
        &sxy_im,
        sample_rate,
        primary_fft_size,
        smoothing,
        tau_total_seconds,
    )
}

fn compute_from_raw(
    sxx: &[f64],
    syy: &[f64],
    sxy_re: &[f64],
    sxy_im: &[f64],
    sample_rate: f64,
    fft_size: usize,
    smoothing: SmoothingKind,
    tau_total_seconds: f64,
) -> TransferFunctionResult {
    let bins = sxx.len();
    let mut magnitude_db = vec![0.0f64; bins];
    let mut phase_raw = vec![0.0f64; bins];
    let mut coherence = vec![0.0f64; bins];

    for i in 0..bins {
        if sxx[i] < SXX_FLOOR {
            magnitude_db[i] = MAG_FLOOR_DB;
            phase_raw[i] = 0.0;
            coherence[i] = 0.0;
            continue;
        }
        let h_re = sxy_re[i] / sxx[i];
        let h_im = sxy_im[i] / sxx[i];
        let h_mag_sqr = h_re * h_re + h_im * h_im;
        magnitude_db[i] = if h_mag_sqr < SXX_FLOOR {
            MAG_FLOOR_DB
        } else {
            10.0 * h_mag_sqr.log10()
        };
        phase_raw[i] = h_im.atan2(h_re).to_degrees();

        let denom = sxx[i] * syy[i];
        coherence[i] = if denom < SXX_FLOOR {
            0.0
        } else {
            (sxy_re[i] * sxy_re[i] + sxy_im[i] * sxy_im[i]) / denom
        }
        .min(1.0);
    }

    let unwrapped = unwrap_degrees(&phase_raw);

    let compensated: Vec<f64> = unwrapped
        .iter()
        .enumerate()
        .map(|(i, &phase)| {
            let f_i = i as f64 * sample_rate / fft_size as f64;
            phase + 360.0 * f_i * tau_total_seconds
        })
        .collect();

    let group_delay_ms = group_delay(&compensated, sample_rate, fft_size);

    let phase_deg: Vec<f32> = compensated.iter().map(|&p| wrap_pm_180(p) as f32).collect();

    let magnitude_db: Vec<f32> = if matches!(smoothing, SmoothingKind::None) {
        magnitude_db.iter().map(|&v| v as f32).collect()
    } else {
        smooth(&magnitude_db, smoothing, sample_rate, fft_size)
            .iter()
            .map(|&v| v as f32)
            .collect()
    };

    TransferFunctionResult {
        magnitude_db,
        phase_deg,
        coherence: coherence.iter().map(|&v| v as f32).collect(),
        group_delay_ms,
    }
}

/// Unwraps a phase sequence (degrees) by adding/subtracting 360° whenever
/// consecutive samples jump by more than 180°.
fn unwrap_degrees(phase: &[f64]) -> Vec<f64> {
    if phase.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; phase.len()];
    out[0] = phase[0];
    let mut offset = 0.0;
    for i in 1..phase.len() {
        let diff = phase[i] - phase[i - 1];
        if diff > 180.0 {
            offset -= 360.0;
        } else if diff < -180.0 {
            offset += 360.0;
        }
        out[i] = phase[i] + offset;
    }
    out
}

fn wrap_pm_180(deg: f64) -> f64 {
    let mut w = (deg + 180.0).rem_euclid(360.0) - 180.0;
    if w == -180.0 {
        w = 180.0;
    }
    w
}

/// Central-difference group delay (ms) over the continuous
/// (unwrapped + delay-compensated) phase in degrees. Endpoints copy their
/// neighbor.
fn group_delay(phase_deg: &[f64], sample_rate: f64, fft_size: usize) -> Vec<f32> {
    let bins = phase_deg.len();
    let mut out = vec![0.0f64; bins];
    if bins < 3 {
        return out.iter().map(|&v| v as f32).collect();
    }
    let delta_f = sample_rate / fft_size as f64;
    for i in 1..bins - 1 {
        let mut delta_phase = phase_deg[i + 1] - phase_deg[i - 1];
        // Normalize any residual two-step wrap excursion back into
        // [-180, 180] before converting to a rate.
        while delta_phase > 180.0 {
            delta_phase -= 360.0;
        }
        while delta_phase < -180.0 {
            delta_phase += 360.0;
        }
        out[i] = -(delta_phase / (2.0 * delta_f)) * (1.0 / 360.0) * 1000.0;
    }
    out[0] = out[1];
    out[bins - 1] = out[bins - 2];
    out.iter().map(|&v| v as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectral::compute_instantaneous;

    #[test]
    fn empty_accumulator_returns_empty_arrays() {
        let acc = SpectralAccumulator::new(9);
        let result = extract(&acc, 48000.0, 16, SmoothingKind::None, 0.0);
        assert!(result.magnitude_db.is_empty());
        assert!(result.phase_deg.is_empty());
        assert!(result.coherence.is_empty());
        assert!(result.group_delay_ms.is_empty());
    }

    #[test]
    fn identical_channels_give_zero_db_full_coherence_zero_phase() {
        use crate::config::AveragingKind;
        use crate::dsp::Complex;

        let n = 16usize;
        let bins = n / 2 + 1;
        let x: Vec<Complex> = (0..n)
            .map(|i| Complex::new((i as f64 * 0.3).sin(), 0.0))
            .collect();
        let inst = compute_instantaneous(&x, &x, bins);
        let mut acc = SpectralAccumulator::new(bins);
        acc.update(inst, AveragingKind::None, 0);

        let result = extract(&acc, 48000.0, n, SmoothingKind::None, 0.0);
        for i in 0..bins {
            if acc.sxx[i] > 1e-20 {
                assert!(result.magnitude_db[i].abs() < 0.01, "bin {i}");
                assert!(result.coherence[i] > 0.999, "bin {i}");
            }
        }
    }

    #[test]
    fn unwrap_removes_large_jumps() {
        let phase = vec![170.0, -170.0, 170.0, -170.0];
        let unwrapped = unwrap_degrees(&phase);
        for w in unwrapped.windows(2) {
            assert!((w[1] - w[0]).abs() < 180.0 + 1e-9);
        }
    }

    #[test]
    fn wrap_pm_180_stays_in_range() {
        for deg in [-540.0, -181.0, -180.0, 0.0, 179.0, 180.0, 181.0, 720.5] {
            let w = wrap_pm_180(deg);
            assert!(w > -180.0 - 1e-9 && w <= 180.0 + 1e-9, "{deg} -> {w}");
        }
    }

    #[test]
    fn group_delay_endpoints_copy_neighbors() {
        let phase = vec![0.0, -10.0, -25.0, -42.0, -55.0];
        let gd = group_delay(&phase, 48000.0, 8);
        assert_eq!(gd[0], gd[1]);
        assert_eq!(gd[gd.len() - 1], gd[gd.len() - 2]);
    }
}
