//! Phase vocoder time-stretchers.
//!
//! ## Algorithm Overview
//!
//! 1. **Analysis**: frames of `window_size` samples are read every analysis
//!    hop, `synthesis_hop / stretch` with the fraction carried over.
//! 2. **Magnitudes** are kept. With formant preservation the spectral envelope
//!    is pre-warped by the stretch, so a following resampler moves the
//!    harmonics but not the formants.
//! 3. **Phases** are rebuilt so every bin advances by its measured frequency
//!    times the synthesis hop:
//!    - `Classic` integrates each bin through time independently.
//!    - `Propagated` ([`PhaseVocoder::done_right`]) uses heap-ordered phase
//!      gradient integration, which keeps vertical phase coherence.
//! 4. **Synthesis**: one-sided inverse FFT, cross-faded with a Hann fade over
//!    `window_size - synthesis_hop` samples.
//!
//! ## RT-Safety
//!
//! All spectral buffers are sized at construction.

use std::f32::consts::TAU;

use warble_core::math::{phase_diff, wrap_phase};
use warble_core::window::{hann_window, mix_and_extend};
use warble_core::{
    drain_ready, Complex32, Effect, FftCache, Lpc, PropertyDesc, PropertyPayload, Result,
    RingBuffer,
};

use crate::config::PhaseVocoderConfig;
use crate::done_right::PhasePropagator;
use crate::types::{HopAccumulator, StretchFactor, TimeStretcher};

/// Envelope floor, relative to its peak, used when warping formants.
const ENVELOPE_FLOOR: f32 = 0.05;

#[derive(Debug, Clone)]
enum PhaseUpdate {
    Classic,
    Propagated(PhasePropagator),
}

/// Phase vocoder time-stretcher.
#[derive(Debug, Clone)]
pub struct PhaseVocoder {
    window_size: usize,
    synthesis_hop: usize,
    overlap: usize,
    preserve_formants: bool,

    stretch: StretchFactor,
    hops: HopAccumulator,
    update: PhaseUpdate,
    primed: bool,

    raw: RingBuffer<f32>,
    transformed: RingBuffer<f32>,

    lpc: Lpc,

    // Per-bin state, N/2 bins
    mag2: Vec<f32>,
    prev_mag2: Vec<f32>,
    magnitudes: Vec<f32>,
    phases: Vec<f32>,
    prev_phases: Vec<f32>,
    last_phases: Vec<f32>,
    new_phases: Vec<f32>,
    time_deltas: Vec<f32>,
    warped_envelope: Vec<f32>,

    // Synthesis scratch, N samples
    synthesis: Vec<Complex32>,
    time_domain: Vec<Complex32>,
    frame: Vec<f32>,
}

impl PhaseVocoder {
    /// Classic phase vocoder.
    pub fn new(config: PhaseVocoderConfig, cache: &mut FftCache) -> Result<Self> {
        Self::with_update(config, cache, PhaseUpdate::Classic)
    }

    /// Phase vocoder with heap-ordered phase gradient integration.
    pub fn done_right(config: PhaseVocoderConfig, cache: &mut FftCache) -> Result<Self> {
        let bins = config.window_size / 2;
        Self::with_update(config, cache, PhaseUpdate::Propagated(PhasePropagator::new(bins)))
    }

    fn with_update(
        config: PhaseVocoderConfig,
        cache: &mut FftCache,
        update: PhaseUpdate,
    ) -> Result<Self> {
        config.validate()?;

        let window_size = config.window_size;
        let overlap = config.overlap();
        let bins = window_size / 2;

        tracing::debug!(
            window_size,
            synthesis_hop = config.synthesis_hop,
            lpc_order = config.lpc_order,
            preserve_formants = config.preserve_formants,
            propagated = matches!(update, PhaseUpdate::Propagated(_)),
            "creating phase vocoder"
        );

        Ok(Self {
            window_size,
            synthesis_hop: config.synthesis_hop,
            overlap,
            preserve_formants: config.preserve_formants,
            stretch: StretchFactor::default(),
            hops: HopAccumulator::new(),
            update,
            primed: false,
            raw: RingBuffer::with_capacity(2 * window_size),
            transformed: RingBuffer::from_value(overlap, 0.0),
            lpc: Lpc::new(window_size, config.lpc_order, cache)?,
            mag2: vec![0.0; bins],
            prev_mag2: vec![0.0; bins],
            magnitudes: vec![0.0; bins],
            phases: vec![0.0; bins],
            prev_phases: vec![0.0; bins],
            last_phases: vec![0.0; bins],
            new_phases: vec![0.0; bins],
            time_deltas: vec![0.0; bins],
            warped_envelope: vec![0.0; bins],
            synthesis: vec![Complex32::new(0.0, 0.0); window_size],
            time_domain: vec![Complex32::new(0.0, 0.0); window_size],
            frame: vec![0.0; window_size],
        })
    }

    pub fn preserve_formants(&self) -> bool {
        self.preserve_formants
    }

    pub fn set_preserve_formants(&mut self, preserve: bool) {
        self.preserve_formants = preserve;
    }

    fn process_frame(&mut self) {
        let bins = self.window_size / 2;
        let stretch = self.stretch.get();

        if let Err(err) = self.lpc.load_sample(&self.raw) {
            tracing::trace!(%err, "degenerate phase vocoder frame");
        }

        let analysis_hop = self
            .hops
            .next(self.synthesis_hop as f32 / stretch)
            .max(1);
        let ratio = self.synthesis_hop as f32 / analysis_hop as f32;

        for (i, bin) in self.lpc.spectrum()[..bins].iter().enumerate() {
            self.mag2[i] = bin.norm_sqr();
            self.magnitudes[i] = self.mag2[i].sqrt();
            self.phases[i] = bin.arg();
        }

        if self.preserve_formants {
            self.warp_formants(stretch);
        }

        for i in 0..bins {
            let estimate = TAU * i as f32 * analysis_hop as f32 / self.window_size as f32;
            self.time_deltas[i] = phase_diff(self.phases[i], self.prev_phases[i], estimate);
        }

        // A frame with nothing before it starts from its own analysis phases.
        let after_silence = !self.primed || self.prev_mag2.iter().all(|&m| m == 0.0);

        match &mut self.update {
            _ if after_silence => self.new_phases.copy_from_slice(&self.phases),
            PhaseUpdate::Propagated(propagator) if ratio != 1.0 => propagator.propagate(
                &self.prev_mag2,
                &self.mag2,
                &self.phases,
                &self.last_phases,
                &self.time_deltas,
                ratio,
                &mut self.new_phases,
            ),
            // Plain time integration, exact at unity.
            _ => {
                for i in 0..bins {
                    self.new_phases[i] = self.last_phases[i] + self.time_deltas[i] * ratio;
                }
            }
        }

        self.synthesize(bins);
        self.primed = true;

        for i in 0..bins {
            self.last_phases[i] = wrap_phase(self.new_phases[i]);
        }
        self.prev_phases.copy_from_slice(&self.phases);
        self.prev_mag2.copy_from_slice(&self.mag2);

        self.raw.pop_front_many(None, analysis_hop);
    }

    fn warp_formants(&mut self, stretch: f32) {
        let bins = self.magnitudes.len();
        let envelope = &self.lpc.envelope()[..bins];
        let peak = envelope.iter().fold(0.0f32, |max, &e| max.max(e));
        let floor = ENVELOPE_FLOOR * peak;

        for (warped, &e) in self.warped_envelope.iter_mut().zip(envelope) {
            *warped = e + floor;
        }

        for i in 0..bins {
            let source = (i as f32 * stretch) as usize;
            let gain = if source < bins {
                self.warped_envelope[source] / self.warped_envelope[i]
            } else {
                0.0
            };
            self.magnitudes[i] *= if gain.is_finite() { gain } else { 0.0 };
        }
    }

    fn synthesize(&mut self, bins: usize) {
        self.synthesis.fill(Complex32::new(0.0, 0.0));
        self.synthesis[0] = Complex32::from_polar(self.magnitudes[0], self.new_phases[0]);
        for i in 1..bins {
            self.synthesis[i] = Complex32::from_polar(2.0 * self.magnitudes[i], self.new_phases[i]);
        }

        self.lpc
            .fft()
            .inverse_transform(&self.synthesis[..], &mut self.time_domain);
        for (sample, value) in self.frame.iter_mut().zip(&self.time_domain) {
            *sample = value.re;
        }

        mix_and_extend(&mut self.transformed, &self.frame, self.overlap, hann_window);
    }
}

impl Effect for PhaseVocoder {
    fn push_signal(&mut self, input: &[f32]) {
        self.raw.extend_back(input);
    }

    fn pop_transformed_signal(&mut self, output: &mut [f32]) -> usize {
        while self.n_transformed_ready() < output.len() && self.raw.len() >= self.window_size {
            self.process_frame();
        }

        let ready = self.n_transformed_ready();
        drain_ready(&mut self.transformed, ready, output)
    }

    /// The last `overlap` samples still wait for the next frame's cross-fade.
    fn n_transformed_ready(&self) -> usize {
        self.transformed.len().saturating_sub(self.overlap)
    }

    fn reset(&mut self) {
        self.raw.clear();
        self.transformed.clear();
        self.transformed.resize(self.overlap);
        self.hops.reset();
        self.primed = false;
        for state in [
            &mut self.mag2,
            &mut self.prev_mag2,
            &mut self.phases,
            &mut self.prev_phases,
            &mut self.last_phases,
        ] {
            state.fill(0.0);
        }
    }

    fn property_descs(&self) -> Vec<PropertyDesc> {
        vec![
            StretchFactor::descriptor(),
            PropertyDesc::toggle(
                1,
                "Preserve Formants",
                "Keep the spectral envelope in place when the output is resampled",
            ),
        ]
    }

    fn set_property(&mut self, id: usize, payload: PropertyPayload) {
        match (id, payload) {
            (0, payload) => {
                if let Some(factor) = StretchFactor::from_payload(payload) {
                    self.stretch = factor;
                }
            }
            (1, PropertyPayload::Toggle(preserve)) => self.preserve_formants = preserve,
            _ => {}
        }
    }

    fn property(&self, id: usize) -> PropertyPayload {
        match id {
            0 => self.stretch.payload(),
            1 => PropertyPayload::Toggle(self.preserve_formants),
            _ => PropertyPayload::default(),
        }
    }

    fn name(&self) -> &'static str {
        match self.update {
            PhaseUpdate::Classic => "Phase Vocoder",
            PhaseUpdate::Propagated(_) => "Phase Vocoder Done Right",
        }
    }
}

impl TimeStretcher for PhaseVocoder {
    fn set_stretch_factor(&mut self, factor: f32) {
        self.stretch = StretchFactor::new(factor);
    }

    fn stretch_factor(&self) -> f32 {
        self.stretch.get()
    }
}
