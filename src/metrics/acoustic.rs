//! C80 clarity, D50 definition, and RT60 (T20, Schroeder backward
//! integration) from an impulse response (spec.md §4.7).

const ENERGY_FLOOR: f64 = 1e-20;
const RT60_FIT_FLOOR_DB: f64 = -100.0;
const RT60_FIT_UPPER_DB: f64 = -5.0;
const RT60_FIT_LOWER_DB: f64 = -25.0;
const RT60_MIN_FIT_SAMPLES: usize = 10;
const RT60_MAX_SECONDS: f64 = 10.0;
const C80_CAP_DB: f64 = 99.0;

/// Reverberation and clarity metrics derived from a direct-arrival-aligned
/// impulse response. Only meaningful after a successful delay computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcousticMetrics {
    pub c80_db: f64,
    pub d50_percent: f64,
    pub rt60_seconds: f64,
}

impl AcousticMetrics {
    fn zero() -> Self {
        Self {
            c80_db: 0.0,
            d50_percent: 0.0,
            rt60_seconds: 0.0,
        }
    }
}

/// Computes acoustic metrics from `impulse_response`, using
/// `peak_samples` as the direct-arrival index `d`.
pub fn compute(impulse_response: &[f32], peak_samples: usize, sample_rate: f64) -> AcousticMetrics {
    let energy: Vec<f64> = impulse_response.iter().map(|&v| (v as f64).powi(2)).collect();
    let len = energy.len();
    let d = peak_samples.min(len.saturating_sub(1));

    if d >= len {
        return AcousticMetrics::zero();
    }

    let e_tot: f64 = energy[d..].iter().sum();
    if e_tot < ENERGY_FLOOR {
        return AcousticMetrics::zero();
    }

    let c80_db = compute_c80(&energy, d, sample_rate);
    let d50_percent = compute_d50(&energy, d, sample_rate, e_tot);
    let rt60_seconds = compute_rt60(&energy, d, sample_rate);

    AcousticMetrics {
        c80_db: round_to(c80_db, 1),
        d50_percent: round_to(d50_percent, 0),
        rt60_seconds: round_to(rt60_seconds, 2),
    }
}

fn compute_c80(energy: &[f64], d: usize, sample_rate: f64) -> f64 {
    let n80 = (0.080 * sample_rate).round() as usize;
    let early_end = (d + n80).min(energy.len());
    let e_early: f64 = energy[d..early_end].iter().sum();
    let e_late: f64 = energy[early_end..].iter().sum();
    if e_late < ENERGY_FLOOR {
        return C80_CAP_DB;
    }
    10.0 * (e_early / e_late).log10()
}

fn compute_d50(energy: &[f64], d: usize, sample_rate: f64, e_tot: f64) -> f64 {
    let n50 = (0.050 * sample_rate).round() as usize;
    let early_end = (d + n50).min(energy.len());
    let e_early: f64 = energy[d..early_end].iter().sum();
    100.0 * e_early / e_tot
}

fn compute_rt60(energy: &[f64], d: usize, sample_rate: f64) -> f64 {
    let tail = &energy[d..];
    let len = tail.len();
    if len == 0 {
        return 0.0;
    }

    // Schroeder backward integration: S[t] = sum_{u >= t} e[u].
    let mut s = vec![0.0; len];
    let mut running = 0.0;
    for i in (0..len).rev() {
        running += tail[i];
        s[i] = running;
    }

    let s0 = s[0];
    if s0 < ENERGY_FLOOR {
        return 0.0;
    }

    let l: Vec<f64> = s
        .iter()
        .map(|&v| (10.0 * (v / s0).log10()).max(RT60_FIT_FLOOR_DB))
        .collect();

    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (t, &level) in l.iter().enumerate() {
        if level <= RT60_FIT_UPPER_DB && level >= RT60_FIT_LOWER_DB {
            xs.push((d + t) as f64 / sample_rate);
            ys.push(level);
        }
    }

    if xs.len() < RT60_MIN_FIT_SAMPLES {
        return 0.0;
    }

    let (slope, _intercept) = ordinary_least_squares(&xs, &ys);
    if slope >= 0.0 {
        return 0.0;
    }

    (-60.0 / slope).clamp(0.0, RT60_MAX_SECONDS)
}

/// Fits `y = a + b*x` by ordinary least squares, returning `(b, a)`.
fn ordinary_least_squares(xs: &[f64], ys: &[f64]) -> (f64, f64) {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    for (&x, &y) in xs.iter().zip(ys) {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
    }
    if var_x < 1e-30 {
        return (0.0, mean_y);
    }
    let b = cov / var_x;
    let a = mean_y - b * mean_x;
    (b, a)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
