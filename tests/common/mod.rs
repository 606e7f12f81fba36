//! Shared helpers for integration tests.

/// Deterministic pseudo-white-noise generator (xorshift-style LCG), so
/// tests stay reproducible without pulling in a `rand` dependency just
/// for test fixtures.
pub fn white_noise(n: usize, seed: u64) -> Vec<f32> {
    let mut state = seed.wrapping_mul(2685821657736338717).wrapping_add(1);
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}

pub fn sine(n: usize, freq_hz: f64, sample_rate: f64, start_sample: usize) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let t = (start_sample + i) as f64 / sample_rate;
            (2.0 * std::f64::consts::PI * freq_hz * t).sin() as f32
        })
        .collect()
}
