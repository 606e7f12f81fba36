//! The public facade: owns every subsystem and exposes the engine's
//! single library-level API (spec.md §5, §6).

use crate::buffer::RingBuffer;
use crate::config::{
    validate_averaging_count, validate_fft_size, AveragingKind, EngineConfig, SmoothingKind,
    WindowKind,
};
use crate::delay::{self, DelayResult};
use crate::dsp::{smooth, FftCore, WindowCache};
use crate::error::EngineError;
use crate::logging::{log_debug, log_warn};
use crate::metrics::{self, AcousticMetrics};
use crate::spectral::{self, bins_for, SpectralProcessor};
use crate::transfer::{self, TransferFunctionResult};

const RTA_FLOOR_DB: f64 = -150.0;

/// Owns the ring buffer pair, the cached FFT/window resources, and every
/// per-FFT-size spectral accumulator. Single-threaded: a caller splitting
/// producer and consumer across threads must serialize all access to an
/// `Engine` behind one mutex (spec.md §5).
pub struct Engine {
    sample_rate: f64,
    primary_fft_size: usize,

    ring_ref: RingBuffer,
    ring_meas: RingBuffer,

    fft: FftCore,
    windows: WindowCache,
    spectral: SpectralProcessor,

    averaging_kind: AveragingKind,
    averaging_count: i64,
    window_kind: WindowKind,

    /// Direct-arrival delay, in samples, as found by the last successful
    /// [`Self::compute_auto_delay`] call (or set manually). Readable and
    /// writable; feeds the transfer function's delay compensation.
    pub current_delay_samples: f64,
    /// Manual phase-offset correction, in milliseconds, added on top of
    /// `current_delay_samples` during delay compensation.
    pub phase_offset_ms: f64,

    last_impulse_response: Vec<f32>,
    acoustic_metrics: Option<AcousticMetrics>,

    sweep_peak: Option<Vec<f32>>,
}

impl Engine {
    /// Constructs a new engine. Fails if `primary_fft_size` is not a
    /// power of two in `[MIN_FFT_SIZE, MAX_FFT_SIZE]`.
    pub fn new(
        sample_rate: f64,
        buffer_capacity: usize,
        primary_fft_size: usize,
    ) -> Result<Self, EngineError> {
        let config = EngineConfig::new(sample_rate, buffer_capacity, primary_fft_size)?;
        Ok(Self {
            sample_rate: config.sample_rate,
            primary_fft_size: config.primary_fft_size,
            ring_ref: RingBuffer::new(config.buffer_capacity),
            ring_meas: RingBuffer::new(config.buffer_capacity),
            fft: FftCore::new(),
            windows: WindowCache::new(),
            spectral: SpectralProcessor::new(),
            averaging_kind: AveragingKind::None,
            averaging_count: 1,
            window_kind: WindowKind::Hann,
            current_delay_samples: 0.0,
            phase_offset_ms: 0.0,
            last_impulse_response: Vec::new(),
            acoustic_metrics: None,
            sweep_peak: None,
        })
    }

    // -- configuration -----------------------------------------------

    pub fn set_averaging(&mut self, kind: AveragingKind, count: i64) -> Result<(), EngineError> {
        validate_averaging_count(kind, count)?;
        self.averaging_kind = kind;
        self.averaging_count = count;
        log_debug!("set_averaging: kind={kind:?} count={count}");
        Ok(())
    }

    pub fn set_window(&mut self, kind: WindowKind) {
        self.window_kind = kind;
        log_debug!("set_window: kind={kind:?}");
    }

    pub fn set_primary_fft_size(&mut self, size: usize) -> Result<(), EngineError> {
        validate_fft_size(size)?;
        self.primary_fft_size = size;
        log_debug!("set_primary_fft_size: size={size}");
        Ok(())
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn primary_fft_size(&self) -> usize {
        self.primary_fft_size
    }

    pub fn averaging(&self) -> (AveragingKind, i64) {
        (self.averaging_kind, self.averaging_count)
    }

    pub fn window(&self) -> WindowKind {
        self.window_kind
    }

    // -- producer side -------------------------------------------------

    /// Appends equal-length ref/meas blocks to the ring buffers.
    ///
    /// Fails with [`EngineError::ChannelLengthMismatch`] if the two
    /// slices differ in length; no state is mutated in that case.
    pub fn push_samples(&mut self, ref_samples: &[f32], meas_samples: &[f32]) -> Result<(), EngineError> {
        if ref_samples.len() != meas_samples.len() {
            return Err(EngineError::ChannelLengthMismatch {
                ref_len: ref_samples.len(),
                meas_len: meas_samples.len(),
            });
        }
        self.ring_ref.push(ref_samples);
        self.ring_meas.push(meas_samples);
        if self.sweep_peak.is_some() {
            self.refresh_sweep_peak();
        }
        Ok(())
    }

    /// Copies the most recent `n` measurement samples, zero-padding the
    /// front if fewer than `n` are available.
    pub fn read_meas_samples(&self, n: usize) -> Vec<f32> {
        let mut out = vec![0.0f32; n];
        let avail = self.ring_meas.available().min(n);
        if avail > 0 {
            let mut tail = vec![0.0f32; avail];
            self.ring_meas
                .read_last(&mut tail)
                .expect("avail is capped at available()");
            out[n - avail..].copy_from_slice(&tail);
        }
        out
    }

    // -- processing ------------------------------------------------------

    /// Attempts one windowed-FFT block update at FFT size `n`. Returns
    /// `false` without mutating state if either channel holds fewer
    /// than `n` samples.
    pub fn process_block(&mut self, n: usize) -> bool {
        let ok = self.spectral.process_block(
            &self.ring_ref,
            &self.ring_meas,
            &mut self.fft,
            &mut self.windows,
            n,
            self.window_kind,
            self.averaging_kind,
            self.averaging_count,
        );
        if !ok {
            log_warn!("process_block({n}) skipped: insufficient samples");
        }
        ok
    }

    /// Processes every Multi-Time-Window FFT size, plus the primary size
    /// if it falls outside that set.
    pub fn process_all_mtw(&mut self) {
        for &n in &spectral::MTW_SIZES {
            self.process_block(n);
        }
        if !spectral::MTW_SIZES.contains(&self.primary_fft_size) {
            self.process_block(self.primary_fft_size);
        }
    }

    // -- spectra -----------------------------------------------------

    /// RTA output in dB, smoothed as requested. Empty if the primary
    /// accumulator has never been updated.
    pub fn rta(&self, smoothing: SmoothingKind, is_ref: bool, visual_gain_db: f64) -> Vec<f32> {
        let Some(acc) = self.spectral.accumulator(self.primary_fft_size) else {
            return Vec::new();
        };
        if acc.count() == 0 {
            return Vec::new();
        }
        let source = if is_ref { &acc.rta_ref } else { &acc.rta_meas };
        let db: Vec<f64> = source
            .iter()
            .map(|&p| {
                let floor = if p < 1e-30 { RTA_FLOOR_DB } else { 10.0 * p.log10() };
                floor + visual_gain_db
            })
            .collect();
        smooth(&db, smoothing, self.sample_rate, self.primary_fft_size)
            .iter()
            .map(|&v| v as f32)
            .collect()
    }

    /// Transfer function at the primary FFT size.
    pub fn transfer_function(&self, smoothing: SmoothingKind) -> TransferFunctionResult {
        match self.spectral.accumulator(self.primary_fft_size) {
            Some(acc) => transfer::extract(
                acc,
                self.sample_rate,
                self.primary_fft_size,
                smoothing,
                self.tau_total_seconds(),
            ),
            None => TransferFunctionResult::default(),
        }
    }

    /// Composite Multi-Time-Window transfer function at the primary
    /// FFT resolution.
    pub fn transfer_function_mtw(&self, smoothing: SmoothingKind) -> TransferFunctionResult {
        transfer::extract_mtw(
            self.spectral.accumulators(),
            self.sample_rate,
            self.primary_fft_size,
            smoothing,
            self.tau_total_seconds(),
        )
    }

    fn tau_total_seconds(&self) -> f64 {
        self.current_delay_samples / self.sample_rate + self.phase_offset_ms / 1000.0
    }

    // -- delay & acoustic metrics --------------------------------------

    /// Runs GCC-PHAT on the most recent samples of both channels.
    ///
    /// On success, updates `current_delay_samples`, the stored impulse
    /// response, and the acoustic metrics. On failure (insufficient
    /// samples), leaves all of that state untouched and returns a zero
    /// result.
    pub fn compute_auto_delay(&mut self) -> DelayResult {
        match delay::find_delay(&self.ring_ref, &self.ring_meas, &mut self.fft, &mut self.windows, self.sample_rate) {
            Some(outcome) => {
                self.current_delay_samples = outcome.peak_samples as f64 + outcome.fractional_samples;
                self.acoustic_metrics = Some(metrics::compute(
                    &outcome.impulse_response,
                    outcome.peak_samples,
                    self.sample_rate,
                ));
                let result = DelayResult {
                    ms: outcome.ms,
                    meters: outcome.meters,
                };
                self.last_impulse_response = outcome.impulse_response;
                result
            }
            None => {
                log_warn!("compute_auto_delay skipped: insufficient samples");
                DelayResult { ms: 0.0, meters: 0.0 }
            }
        }
    }

    pub fn last_impulse_response(&self) -> &[f32] {
        &self.last_impulse_response
    }

    pub fn acoustic_metrics(&self) -> Option<AcousticMetrics> {
        self.acoustic_metrics
    }

    // -- sweep peak-hold -----------------------------------------------

    pub fn start_sweep_capture(&mut self) {
        let bins = bins_for(self.primary_fft_size);
        self.sweep_peak = Some(vec![RTA_FLOOR_DB as f32; bins]);
    }

    /// Exits capture mode and returns the peak buffer. Empty if capture
    /// was never started.
    pub fn stop_sweep_capture(&mut self) -> Vec<f32> {
        self.sweep_peak.take().unwrap_or_default()
    }

    fn refresh_sweep_peak(&mut self) {
        let rta_meas_db = self.rta(SmoothingKind::None, false, 0.0);
        if rta_meas_db.is_empty() {
            return;
        }
        let peak = self
            .sweep_peak
            .get_or_insert_with(|| vec![RTA_FLOOR_DB as f32; rta_meas_db.len()]);
        if peak.len() != rta_meas_db.len() {
            *peak = vec![RTA_FLOOR_DB as f32; rta_meas_db.len()];
        }
        for (p, v) in peak.iter_mut().zip(&rta_meas_db) {
            *p = p.max(*v);
        }
    }

    // -- lifecycle ----------------------------------------------------

    /// Zeroes every accumulator and FIFO, clears the impulse response
    /// and acoustic metrics, and resets the delay/phase-offset fields.
    /// Ring-buffer contents are untouched.
    pub fn reset_averaging(&mut self) {
        self.spectral.reset();
        self.last_impulse_response.clear();
        self.acoustic_metrics = None;
        self.current_delay_samples = 0.0;
        self.phase_offset_ms = 0.0;
        log_debug!("reset_averaging");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_non_power_of_two_fft_size() {
        let result = Engine::new(48000.0, 4096, 1000);
        assert!(matches!(result, Err(EngineError::InvalidFftSize { .. })));
    }

    #[test]
    fn push_samples_rejects_length_mismatch() {
        let mut engine = Engine::new(48000.0, 4096, 1024).unwrap();
        let err = engine.push_samples(&[0.0; 10], &[0.0; 5]).unwrap_err();
        assert!(matches!(err, EngineError::ChannelLengthMismatch { ref_len: 10, meas_len: 5 }));
    }

    #[test]
    fn process_block_false_before_enough_samples_pushed() {
        let mut engine = Engine::new(48000.0, 4096, 1024).unwrap();
        engine.push_samples(&[0.0; 100], &[0.0; 100]).unwrap();
        assert!(!engine.process_block(1024));
    }

    #[test]
    fn rta_is_empty_before_any_processing() {
        let engine = Engine::new(48000.0, 4096, 1024).unwrap();
        assert!(engine.rta(SmoothingKind::None, false, 0.0).is_empty());
    }

    #[test]
    fn full_tick_produces_nonempty_rta_and_transfer_function() {
        let mut engine = Engine::new(48000.0, 8192, 1024).unwrap();
        let samples: Vec<f32> = (0..2048).map(|i| (i as f32 * 0.05).sin()).collect();
        engine.push_samples(&samples, &samples).unwrap();
        assert!(engine.process_block(1024));

        let rta = engine.rta(SmoothingKind::OneOverThird, false, 0.0);
        assert_eq!(rta.len(), 1024 / 2 + 1);

        let tf = engine.transfer_function(SmoothingKind::None);
        assert_eq!(tf.magnitude_db.len(), 1024 / 2 + 1);
        for db in &tf.magnitude_db {
            assert!(db.abs() < 0.5, "identical channels should give ~0dB: {db}");
        }
    }

    #[test]
    fn reset_averaging_clears_derived_state_but_keeps_ring_buffers() {
        let mut engine = Engine::new(48000.0, 8192, 1024).unwrap();
        let samples: Vec<f32> = (0..1024).map(|i| (i as f32 * 0.1).sin()).collect();
        engine.push_samples(&samples, &samples).unwrap();
        engine.process_block(1024);
        engine.current_delay_samples = 12.5;
        engine.phase_offset_ms = 3.0;

        engine.reset_averaging();

        assert_eq!(engine.current_delay_samples, 0.0);
        assert_eq!(engine.phase_offset_ms, 0.0);
        assert!(engine.acoustic_metrics().is_none());
        assert!(engine.rta(SmoothingKind::None, false, 0.0).is_empty());
        assert_eq!(engine.read_meas_samples(1024).len(), 1024);
    }

    #[test]
    fn read_meas_samples_zero_pads_on_underrun() {
        let mut engine = Engine::new(48000.0, 4096, 1024).unwrap();
        engine.push_samples(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        let out = engine.read_meas_samples(5);
        assert_eq!(out, vec![0.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn sweep_capture_tracks_peak_and_stop_without_start_is_empty() {
        let mut engine = Engine::new(48000.0, 8192, 1024).unwrap();
        assert!(engine.stop_sweep_capture().is_empty());

        engine.start_sweep_capture();
        let samples: Vec<f32> = (0..1024).map(|i| (i as f32 * 0.2).sin()).collect();
        engine.push_samples(&samples, &samples).unwrap();
        engine.process_block(1024);
        engine.push_samples(&samples, &samples).unwrap();

        let peak = engine.stop_sweep_capture();
        assert_eq!(peak.len(), 1024 / 2 + 1);
        assert!(engine.stop_sweep_capture().is_empty());
    }

    #[test]
    fn compute_auto_delay_without_enough_samples_returns_zero_and_leaves_state() {
        let mut engine = Engine::new(48000.0, 32768, 1024).unwrap();
        let result = engine.compute_auto_delay();
        assert_eq!(result.ms, 0.0);
        assert_eq!(result.meters, 0.0);
        assert_eq!(engine.current_delay_samples, 0.0);
        assert!(engine.acoustic_metrics().is_none());
    }
}
