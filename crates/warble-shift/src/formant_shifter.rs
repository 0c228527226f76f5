//! LPC formant shifter.
//!
//! ## Algorithm Overview
//!
//! Each window is split by LPC into a spectral envelope (the formants) and
//! everything else (the harmonics). The spectrum is re-weighted by the ratio of
//! the envelope read at `i / shift` to the envelope at `i`, which moves the
//! formants by `shift` while the harmonics stay where they are.
//!
//! 1. Forward FFT and LPC envelope of a `window_size` window.
//! 2. `X[i] *= env[i / shift] / env[i]` for the lower half of the spectrum.
//! 3. One-sided inverse FFT (upper half zeroed, bins `1..N/2` doubled).
//! 4. Rescale to the input window's RMS, so shifting neither boosts nor
//!    drops loudness.
//! 5. Hamming cross-fade into the output and advance by three fifths of the
//!    window.
//!
//! ## RT-Safety
//!
//! All buffers are sized at construction.

use warble_core::math::rms;
use warble_core::window::{hamming_window, mix_and_extend};
use warble_core::{
    drain_ready, Complex32, Effect, Error, FftCache, Lpc, PropertyDesc, PropertyPayload, Result,
    RingBuffer,
};

use crate::config::FormantShifterConfig;
use crate::factor::ShiftFactor;

const ZERO: Complex32 = Complex32::new(0.0, 0.0);

/// Formant shifter driven by an LPC spectral envelope.
#[derive(Debug, Clone)]
pub struct LpcFormantShifter {
    window_size: usize,
    hop: usize,
    overlap: usize,
    shift: ShiftFactor,

    raw: RingBuffer<f32>,
    transformed: RingBuffer<f32>,

    lpc: Lpc,
    window: Vec<f32>,
    shifted: Vec<Complex32>,
    time_domain: Vec<Complex32>,
    frame: Vec<f32>,
}

impl LpcFormantShifter {
    pub fn new(config: FormantShifterConfig, cache: &mut FftCache) -> Result<Self> {
        config.validate()?;

        let window_size = config.window_size;
        let overlap = config.overlap();
        tracing::debug!(
            window_size,
            hop = config.hop(),
            lpc_order = config.lpc_order,
            "creating LPC formant shifter"
        );

        Ok(Self {
            window_size,
            hop: config.hop(),
            overlap,
            shift: ShiftFactor::default(),
            raw: RingBuffer::with_capacity(2 * window_size),
            transformed: RingBuffer::from_value(overlap, 0.0),
            lpc: Lpc::new(window_size, config.lpc_order, cache)?,
            window: vec![0.0; window_size],
            shifted: vec![ZERO; window_size],
            time_domain: vec![ZERO; window_size],
            frame: vec![0.0; window_size],
        })
    }

    /// Set the formant ratio. Values outside 0.5..=2.0 are clamped.
    pub fn set_shift_factor(&mut self, factor: f32) {
        self.shift = ShiftFactor::new(factor);
    }

    pub fn shift_factor(&self) -> f32 {
        self.shift.get()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Formant-shift one window in isolation.
    ///
    /// Both slices must be exactly [`window_size`](Self::window_size) long.
    /// Streaming state is untouched.
    pub fn shift_window(&mut self, input: &[f32], output: &mut [f32]) -> Result<()> {
        if input.len() != self.window_size {
            return Err(Error::LengthMismatch {
                expected: self.window_size,
                actual: input.len(),
            });
        }
        if output.len() != self.window_size {
            return Err(Error::LengthMismatch {
                expected: self.window_size,
                actual: output.len(),
            });
        }

        self.window.copy_from_slice(input);
        self.shift_frame();
        output.copy_from_slice(&self.frame);
        Ok(())
    }

    /// `self.window` to `self.frame`.
    fn shift_frame(&mut self) {
        let half = self.window_size / 2;
        let shift = self.shift.get();

        if let Err(err) = self.lpc.load_sample(&self.window[..]) {
            tracing::trace!(%err, "degenerate formant shifter window");
        }

        self.shifted.fill(ZERO);
        let envelope = self.lpc.envelope();
        for (i, (out, bin)) in self.shifted[..half]
            .iter_mut()
            .zip(self.lpc.spectrum())
            .enumerate()
        {
            let source = (i as f32 / shift) as usize;
            let gain = if source < half {
                envelope[source] / envelope[i]
            } else {
                0.0
            };
            let gain = if gain.is_finite() { gain } else { 0.0 };
            let weight = if i == 0 { 1.0 } else { 2.0 };
            *out = *bin * (gain * weight);
        }

        self.lpc
            .fft()
            .inverse_transform(&self.shifted[..], &mut self.time_domain);
        for (sample, value) in self.frame.iter_mut().zip(&self.time_domain) {
            *sample = value.re;
        }

        let gain = rms(&self.window) / rms(&self.frame);
        if gain.is_finite() {
            for sample in &mut self.frame {
                *sample *= gain;
            }
        }
    }
}

impl Effect for LpcFormantShifter {
    fn push_signal(&mut self, input: &[f32]) {
        self.raw.extend_back(input);
    }

    fn pop_transformed_signal(&mut self, output: &mut [f32]) -> usize {
        while self.n_transformed_ready() < output.len() && self.raw.len() >= self.window_size {
            self.raw.to_slice(&mut self.window, self.window_size);
            self.shift_frame();
            mix_and_extend(&mut self.transformed, &self.frame, self.overlap, hamming_window);
            self.raw.pop_front_many(None, self.hop);
        }

        let ready = self.n_transformed_ready();
        drain_ready(&mut self.transformed, ready, output)
    }

    fn n_transformed_ready(&self) -> usize {
        self.transformed.len().saturating_sub(self.overlap)
    }

    fn reset(&mut self) {
        self.raw.clear();
        self.transformed.clear();
        self.transformed.resize(self.overlap);
    }

    fn property_descs(&self) -> Vec<PropertyDesc> {
        vec![ShiftFactor::descriptor(
            "Formant Shift",
            "Scales the formant of pushed signals by this amount",
        )]
    }

    fn set_property(&mut self, id: usize, payload: PropertyPayload) {
        if id == 0 {
            if let Some(factor) = ShiftFactor::from_payload(payload) {
                self.shift = factor;
            }
        }
    }

    fn property(&self, id: usize) -> PropertyPayload {
        match id {
            0 => self.shift.payload(),
            _ => PropertyPayload::default(),
        }
    }

    fn name(&self) -> &'static str {
        "LPC Formant Shifter"
    }
}
