//! Cached analysis windows.
//!
//! Coefficients for the 4-term Blackman-Harris and 5-term Flat-Top
//! windows aren't available from `apodize`, so all five families are
//! hand-written here, matching the teacher's own practice of deriving
//! Hann/Hamming/Blackman windows inline rather than depending on a
//! window crate. Each `(size, kind)` pair is computed once and cached
//! behind an `Arc` so repeated calls at steady-state block sizes are
//! free.

use crate::config::WindowKind;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::{Arc, Mutex, OnceLock};

fn rectangular(size: usize) -> Vec<f64> {
    vec![1.0; size]
}

fn hann(size: usize) -> Vec<f64> {
    if size == 1 {
        return vec![1.0];
    }
    let n = (size - 1) as f64;
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / n).cos()))
        .collect()
}

fn hamming(size: usize) -> Vec<f64> {
    if size == 1 {
        return vec![1.0];
    }
    let n = (size - 1) as f64;
    (0..size)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / n).cos())
        .collect()
}

fn blackman_harris_4(size: usize) -> Vec<f64> {
    if size == 1 {
        return vec![1.0];
    }
    const A0: f64 = 0.35875;
    const A1: f64 = 0.48829;
    const A2: f64 = 0.14128;
    const A3: f64 = 0.01168;
    let n = (size - 1) as f64;
    (0..size)
        .map(|i| {
            let x = 2.0 * PI * i as f64 / n;
            A0 - A1 * x.cos() + A2 * (2.0 * x).cos() - A3 * (3.0 * x).cos()
        })
        .collect()
}

fn flat_top(size: usize) -> Vec<f64> {
    if size == 1 {
        return vec![1.0];
    }
    const A0: f64 = 0.21557895;
    const A1: f64 = 0.41663158;
    const A2: f64 = 0.277263158;
    const A3: f64 = 0.083578947;
    const A4: f64 = 0.006947368;
    let n = (size - 1) as f64;
    (0..size)
        .map(|i| {
            let x = 2.0 * PI * i as f64 / n;
            A0 - A1 * x.cos() + A2 * (2.0 * x).cos() - A3 * (3.0 * x).cos() + A4 * (4.0 * x).cos()
        })
        .collect()
}

fn generate(size: usize, kind: WindowKind) -> Vec<f64> {
    match kind {
        WindowKind::Rectangular => rectangular(size),
        WindowKind::Hann => hann(size),
        WindowKind::Hamming => hamming(size),
        WindowKind::BlackmanHarris4 => blackman_harris_4(size),
        WindowKind::FlatTop => flat_top(size),
    }
}

/// Caches generated window coefficients per `(size, kind)`.
#[derive(Default)]
pub struct WindowCache {
    cache: HashMap<(usize, WindowKind), Arc<Vec<f64>>>,
}

impl WindowCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached coefficient vector for `size` samples of
    /// `kind`, generating and caching it on first use.
    pub fn get(&mut self, size: usize, kind: WindowKind) -> Arc<Vec<f64>> {
        self.cache
            .entry((size, kind))
            .or_insert_with(|| Arc::new(generate(size, kind)))
            .clone()
    }
}

/// Process-wide cache backing the free-function [`create_window`]. Kept
/// separate from [`WindowCache`] (the per-engine cache an `Engine`
/// threads through its own calls) so callers reaching for the
/// spec-named entry point outside of an `Engine` still get memoized
/// coefficients, matching spec.md §9's "immutable-after-populate" cache
/// sharing allowance.
fn global_cache() -> &'static Mutex<HashMap<(usize, WindowKind), Arc<Vec<f64>>>> {
    static CACHE: OnceLock<Mutex<HashMap<(usize, WindowKind), Arc<Vec<f64>>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Returns the window coefficients for `size` samples of `kind`,
/// generating and caching them per `(size, kind)` on first use
/// (spec.md §4.2: "returns a precomputed window cached per `(size,
/// kind)`").
///
/// Backed by a process-wide cache shared across every caller. An
/// `Engine` should prefer its own [`WindowCache`] instead, to avoid
/// contending on the global lock in the per-block hot path.
pub fn create_window(size: usize, kind: WindowKind) -> Vec<f64> {
    let mut cache = global_cache().lock().unwrap_or_else(|e| e.into_inner());
    cache
        .entry((size, kind))
        .or_insert_with(|| Arc::new(generate(size, kind)))
        .as_ref()
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZES: [usize; 3] = [64, 1024, 4096];

    #[test]
    fn rectangular_is_all_ones() {
        let w = create_window(128, WindowKind::Rectangular);
        assert!(w.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn hann_endpoints_are_near_zero() {
        for &n in &SIZES {
            let w = create_window(n, WindowKind::Hann);
            assert!(w[0] < 1e-9);
            assert!(w[n - 1] < 1e-9);
        }
    }

    #[test]
    fn hann_is_symmetric() {
        for &n in &SIZES {
            let w = create_window(n, WindowKind::Hann);
            for i in 0..n {
                assert!((w[i] - w[n - 1 - i]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn hamming_endpoints_are_nonzero() {
        let w = create_window(1024, WindowKind::Hamming);
        assert!((w[0] - 0.08).abs() < 1e-6);
    }

    #[test]
    fn all_windows_stay_within_unit_range() {
        for &kind in &[
            WindowKind::Rectangular,
            WindowKind::Hann,
            WindowKind::Hamming,
            WindowKind::BlackmanHarris4,
            WindowKind::FlatTop,
        ] {
            let w = create_window(2048, kind);
            for &v in &w {
                assert!((-0.1..=1.0 + 1e-9).contains(&v), "{kind:?} out of range: {v}");
            }
        }
    }

    #[test]
    fn cache_returns_identical_data_on_repeat_lookup() {
        let mut cache = WindowCache::new();
        let a = cache.get(512, WindowKind::Hann);
        let b = cache.get(512, WindowKind::Hann);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn create_window_is_itself_cached_across_calls() {
        let size = 777;
        let a = global_cache().lock().unwrap().len();
        let _ = create_window(size, WindowKind::BlackmanHarris4);
        let b = global_cache().lock().unwrap().len();
        assert_eq!(b, a + 1, "first call should populate the global cache");
        let _ = create_window(size, WindowKind::BlackmanHarris4);
        let c = global_cache().lock().unwrap().len();
        assert_eq!(c, b, "second call at the same (size, kind) should not grow the cache");
    }

    #[test]
    fn cache_distinguishes_size_and_kind() {
        let mut cache = WindowCache::new();
        let hann_512 = cache.get(512, WindowKind::Hann);
        let hamming_512 = cache.get(512, WindowKind::Hamming);
        let hann_1024 = cache.get(1024, WindowKind::Hann);
        assert_ne!(*hann_512, *hamming_512);
        assert_ne!(hann_512.len(), hann_1024.len());
    }

    #[test]
    fn single_sample_window_is_unity() {
        for &kind in &[
            WindowKind::Rectangular,
            WindowKind::Hann,
            WindowKind::Hamming,
            WindowKind::BlackmanHarris4,
            WindowKind::FlatTop,
        ] {
            assert_eq!(create_window(1, kind), vec![1.0]);
        }
    }
}
