//! Linear predictive coding over one analysis window.
//!
//! ## Algorithm Overview
//!
//! 1. **Spectrum**: forward FFT of the window.
//! 2. **Autocovariance**: inverse FFT of `|X|²` (circular, real part).
//! 3. **Prediction filter**: Levinson solve of `Toeplitz(r[0..=P]) · a = e₀`,
//!    normalized so `a[0] = 1`.
//! 4. **Envelope**: `1/|A(f)|` where `A` is the FFT of the zero-padded filter.
//!    Non-finite values become zero.
//! 5. **Residual**: `|X(f)·A(f)|`, the spectrum with the envelope divided out.
//!
//! ## RT-Safety
//!
//! All buffers are sized at construction. `load_sample()` performs no allocations.

use crate::error::{Error, Result};
use crate::fft::{Complex32, Fft, FftCache, FftInput};
use crate::linalg::ToeplitzSolver;

const ZERO: Complex32 = Complex32::new(0.0, 0.0);

/// Per-window LPC analyzer with window size `N` and model order `P`.
#[derive(Debug, Clone)]
pub struct Lpc {
    order: usize,
    fft: Fft,
    spectrum: Vec<Complex32>,
    scratch: Vec<Complex32>,
    autocovariance: Vec<f32>,
    rhs: Vec<f32>,
    coefficients: Vec<f32>,
    filter: Vec<Complex32>,
    envelope: Vec<f32>,
    residual: Vec<f32>,
    solver: ToeplitzSolver,
}

impl Lpc {
    /// Create an analyzer for windows of `window_size` samples.
    ///
    /// `order` must be smaller than `window_size`.
    pub fn new(window_size: usize, order: usize, cache: &mut FftCache) -> Result<Self> {
        if window_size == 0 {
            return Err(Error::config("LPC window size must be positive"));
        }
        if order == 0 || order >= window_size {
            return Err(Error::config(format!(
                "LPC order {} must be in 1..{}",
                order, window_size
            )));
        }

        let mut rhs = vec![0.0; order + 1];
        rhs[0] = 1.0;

        Ok(Self {
            order,
            fft: cache.fft(window_size),
            spectrum: vec![ZERO; window_size],
            scratch: vec![ZERO; window_size],
            autocovariance: vec![0.0; window_size],
            rhs,
            coefficients: vec![0.0; order + 1],
            filter: vec![ZERO; window_size],
            envelope: vec![0.0; window_size],
            residual: vec![0.0; window_size],
            solver: ToeplitzSolver::new(order + 1),
        })
    }

    /// Analyze one window. Samples past `window_size` are ignored; missing
    /// samples are treated as zero.
    ///
    /// On a degenerate window (silence, or a singular autocovariance) the
    /// spectrum and autocovariance are still valid, while the coefficients,
    /// envelope and residual are zeroed and the solver error is returned.
    pub fn load_sample<I: FftInput + ?Sized>(&mut self, window: &I) -> Result<()> {
        self.fft.transform(window, &mut self.spectrum);

        for (power, bin) in self.scratch.iter_mut().zip(&self.spectrum) {
            *power = Complex32::new(bin.norm_sqr(), 0.0);
        }
        // The filter buffer doubles as scratch until the coefficients are known.
        self.fft.inverse_transform(&self.scratch[..], &mut self.filter);
        for (lag, value) in self.autocovariance.iter_mut().zip(&self.filter) {
            *lag = value.re;
        }

        let lags = &self.autocovariance[..=self.order];
        if let Err(err) = self.solver.solve(lags, &self.rhs, &mut self.coefficients) {
            self.clear_model();
            return Err(err);
        }

        let lead = self.coefficients[0];
        if lead == 0.0 || !lead.is_finite() {
            self.clear_model();
            return Err(Error::SingularToeplitz { order: 0 });
        }
        for coefficient in &mut self.coefficients {
            *coefficient /= lead;
        }

        self.fft.transform(&self.coefficients[..], &mut self.filter);

        for ((envelope, residual), (filter, bin)) in self
            .envelope
            .iter_mut()
            .zip(self.residual.iter_mut())
            .zip(self.filter.iter().zip(&self.spectrum))
        {
            let gain = filter.norm();
            let inverse = 1.0 / gain;
            *envelope = if inverse.is_finite() { inverse } else { 0.0 };
            *residual = (bin * filter).norm();
        }

        Ok(())
    }

    fn clear_model(&mut self) {
        self.coefficients.fill(0.0);
        self.filter.fill(ZERO);
        self.envelope.fill(0.0);
        self.residual.fill(0.0);
    }

    pub fn window_size(&self) -> usize {
        self.fft.size()
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Spectrum of the last window.
    pub fn spectrum(&self) -> &[Complex32] {
        &self.spectrum
    }

    /// Circular autocovariance of the last window.
    pub fn autocovariance(&self) -> &[f32] {
        &self.autocovariance
    }

    /// Prediction-error filter `a`, with `a[0] = 1`.
    pub fn coefficients(&self) -> &[f32] {
        &self.coefficients
    }

    /// Spectral envelope `1/|A(f)|`.
    pub fn envelope(&self) -> &[f32] {
        &self.envelope
    }

    /// Residual magnitude `|X(f)·A(f)|`.
    pub fn residual(&self) -> &[f32] {
        &self.residual
    }

    /// Transform shared by the analysis, for callers that resynthesize.
    pub fn fft(&mut self) -> &mut Fft {
        &mut self.fft
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring_buffer::RingBuffer;
    use approx::assert_abs_diff_eq;

    /// Deterministic white-ish noise in [-1, 1).
    fn noise(len: usize, seed: u32) -> Vec<f32> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 8) as f32 / (1u32 << 23) as f32 - 1.0
            })
            .collect()
    }

    fn ar1(len: usize, pole: f32) -> Vec<f32> {
        let excitation = noise(len, 7);
        let mut out = Vec::with_capacity(len);
        let mut prev = 0.0;
        for e in excitation {
            prev = pole * prev + e;
            out.push(prev);
        }
        out
    }

    #[test]
    fn test_rejects_bad_order() {
        let mut cache = FftCache::new();
        assert!(Lpc::new(64, 0, &mut cache).is_err());
        assert!(Lpc::new(64, 64, &mut cache).is_err());
        assert!(Lpc::new(0, 4, &mut cache).is_err());
    }

    #[test]
    fn test_recovers_ar1_pole() {
        let mut cache = FftCache::new();
        let mut lpc = Lpc::new(1024, 2, &mut cache).unwrap();
        lpc.load_sample(&ar1(1024, 0.9)[..]).unwrap();

        let a = lpc.coefficients();
        assert_eq!(a[0], 1.0);
        assert!((a[1] + 0.9).abs() < 0.1, "a[1] = {}", a[1]);
        assert!(a[2].abs() < 0.1, "a[2] = {}", a[2]);
    }

    #[test]
    fn test_residual_is_spectrum_over_envelope() {
        let mut cache = FftCache::new();
        let mut lpc = Lpc::new(512, 12, &mut cache).unwrap();
        lpc.load_sample(&ar1(512, 0.7)[..]).unwrap();

        for i in 0..512 {
            let envelope = lpc.envelope()[i];
            assert!(envelope.is_finite() && envelope >= 0.0);
            if envelope > 0.0 {
                let expected = lpc.spectrum()[i].norm() / envelope;
                assert_abs_diff_eq!(lpc.residual()[i], expected, epsilon = 1e-3 * expected.max(1.0));
            }
        }
    }

    #[test]
    fn test_envelope_peaks_at_resonance() {
        let bin = 40;
        let noise = noise(512, 3);
        let window: Vec<f32> = (0..512)
            .map(|i| {
                let phase = std::f32::consts::TAU * bin as f32 * i as f32 / 512.0;
                phase.sin() + 0.05 * noise[i]
            })
            .collect();

        let mut cache = FftCache::new();
        let mut lpc = Lpc::new(512, 10, &mut cache).unwrap();
        lpc.load_sample(&window[..]).unwrap();

        let peak = lpc.envelope()[..256]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert!(peak.abs_diff(bin) <= 3, "envelope peak at {}, expected {}", peak, bin);
    }

    #[test]
    fn test_silence_is_degenerate() {
        let mut cache = FftCache::new();
        let mut lpc = Lpc::new(256, 8, &mut cache).unwrap();
        let err = lpc.load_sample(&[0.0f32; 256][..]).unwrap_err();

        assert!(matches!(err, Error::SingularToeplitz { .. }));
        assert!(lpc.envelope().iter().all(|&e| e == 0.0));
        assert!(lpc.residual().iter().all(|&r| r == 0.0));
        assert!(lpc.coefficients().iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_ring_buffer_window() {
        let samples = ar1(600, 0.5);
        let ring: RingBuffer<f32> = samples.iter().copied().collect();

        let mut cache = FftCache::new();
        let mut from_ring = Lpc::new(512, 6, &mut cache).unwrap();
        let mut from_slice = Lpc::new(512, 6, &mut cache).unwrap();
        from_ring.load_sample(&ring).unwrap();
        from_slice.load_sample(&samples[..512]).unwrap();

        assert_eq!(from_ring.envelope(), from_slice.envelope());
        assert_eq!(cache.len(), 1);
    }
}
