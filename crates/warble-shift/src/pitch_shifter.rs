//! Pitch shifting by time-stretching then resampling.
//!
//! ## Algorithm Overview
//!
//! To raise the pitch by `shift`, the input is first stretched to `shift`
//! times its length at the original pitch, then read back `shift` times
//! faster. Duration is unchanged and every frequency is scaled by `shift`.
//!
//! ```text
//! push ──► TimeStretcher (×shift) ──► LinearResampler (÷shift) ──► output buffer ──► pop
//! ```
//!
//! ## Drift Control
//!
//! Integer hop rounding means the stretcher never produces exactly
//! `shift·input` samples, and the surplus piles up in the output buffer.
//! After each pop the backlog is checked:
//!
//! - above `increase_backlog_threshold`, the stretch factor becomes
//!   `shift·2^(-(backlog - increase)/half_life)`, producing less per input;
//! - below `standard_backlog_threshold`, it returns to `shift`.
//!
//! ## RT-Safety
//!
//! The stretcher scratch is sized at construction and by
//! [`Effect::reserve`]. Pops larger than it are served a scratch-full at a
//! time, so the callback never grows it.

use warble_core::{drain_ready, Effect, PropertyDesc, PropertyPayload, Result, RingBuffer};
use warble_stretch::TimeStretcher;

use crate::config::PitchShifterConfig;
use crate::factor::ShiftFactor;
use crate::resampler::LinearResampler;

/// Pop size the scratch covers before any [`Effect::reserve`].
const INITIAL_BLOCK: usize = 1024;

/// Stretcher samples needed for a pop of `block_size` at the highest shift.
fn scratch_len(block_size: usize) -> usize {
    (block_size as f32 * ShiftFactor::MAX).ceil() as usize
}

/// Pitch shifter over any [`TimeStretcher`].
#[derive(Clone)]
pub struct ResamplingPitchShifter {
    stretcher: Box<dyn TimeStretcher>,
    resampler: LinearResampler,
    shift: ShiftFactor,
    config: PitchShifterConfig,
    compensating: bool,
    scratch: Vec<f32>,
    transformed: RingBuffer<f32>,
}

impl ResamplingPitchShifter {
    pub fn new(stretcher: Box<dyn TimeStretcher>, config: PitchShifterConfig) -> Result<Self> {
        config.validate()?;

        tracing::debug!(
            stretcher = stretcher.name(),
            increase = config.increase_backlog_threshold,
            standard = config.standard_backlog_threshold,
            half_life = config.half_life,
            "creating resampling pitch shifter"
        );

        let mut shifter = Self {
            stretcher,
            resampler: LinearResampler::new(1.0),
            shift: ShiftFactor::default(),
            config,
            compensating: false,
            scratch: vec![0.0; scratch_len(INITIAL_BLOCK)],
            transformed: RingBuffer::with_capacity(scratch_len(INITIAL_BLOCK)),
        };
        shifter.resampler.reserve(scratch_len(INITIAL_BLOCK));
        shifter.set_shift_factor(1.0);
        Ok(shifter)
    }

    /// Set the pitch ratio. Values outside 0.5..=2.0 are clamped.
    pub fn set_shift_factor(&mut self, factor: f32) {
        self.shift = ShiftFactor::new(factor);
        self.stretcher.set_stretch_factor(self.shift.get());
        self.resampler.set_ratio(self.shift.get());
        self.compensating = false;
    }

    pub fn shift_factor(&self) -> f32 {
        self.shift.get()
    }

    pub fn stretcher(&self) -> &dyn TimeStretcher {
        &*self.stretcher
    }

    fn control_drift(&mut self) {
        let backlog = self.transformed.len();
        let shift = self.shift.get();

        if backlog > self.config.increase_backlog_threshold {
            let excess = (backlog - self.config.increase_backlog_threshold) as f32;
            let factor = shift * (-excess / self.config.half_life).exp2();
            self.stretcher.set_stretch_factor(factor);
            if !self.compensating {
                tracing::debug!(backlog, factor, "pitch shifter backlog high, slowing stretcher");
                self.compensating = true;
            }
        } else if backlog < self.config.standard_backlog_threshold && self.compensating {
            self.stretcher.set_stretch_factor(shift);
            tracing::debug!(backlog, "pitch shifter backlog recovered");
            self.compensating = false;
        }
    }
}

impl std::fmt::Debug for ResamplingPitchShifter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResamplingPitchShifter")
            .field("stretcher", &self.stretcher.name())
            .field("shift", &self.shift)
            .field("backlog", &self.transformed.len())
            .finish()
    }
}

impl Effect for ResamplingPitchShifter {
    fn push_signal(&mut self, input: &[f32]) {
        self.stretcher.push_signal(input);
    }

    fn pop_transformed_signal(&mut self, output: &mut [f32]) -> usize {
        let n = output.len();
        while self.transformed.len() < n {
            let missing = n - self.transformed.len();
            let want = ((missing as f32 * self.shift.get()).ceil() as usize)
                .clamp(1, self.scratch.len());

            let stretched = self.stretcher.pop_transformed_signal(&mut self.scratch[..want]);
            if stretched == 0 {
                break;
            }
            self.resampler
                .resample(&self.scratch[..stretched], &mut self.transformed);
        }

        let ready = self.transformed.len();
        let produced = drain_ready(&mut self.transformed, ready, output);
        self.control_drift();
        produced
    }

    fn n_transformed_ready(&self) -> usize {
        self.transformed.len()
    }

    fn reset(&mut self) {
        self.stretcher.reset();
        self.resampler.reset();
        self.transformed.clear();
        self.stretcher.set_stretch_factor(self.shift.get());
        self.compensating = false;
    }

    fn property_descs(&self) -> Vec<PropertyDesc> {
        vec![ShiftFactor::descriptor(
            "Pitch Shift",
            "Scales the pitch of pushed signals by this amount",
        )]
    }

    fn set_property(&mut self, id: usize, payload: PropertyPayload) {
        if id == 0 {
            if let Some(factor) = ShiftFactor::from_payload(payload) {
                self.set_shift_factor(factor.get());
            }
        }
    }

    fn property(&self, id: usize) -> PropertyPayload {
        match id {
            0 => self.shift.payload(),
            _ => PropertyPayload::default(),
        }
    }

    fn latency_samples(&self) -> usize {
        self.stretcher.latency_samples()
    }

    fn reserve(&mut self, block_size: usize) {
        let len = scratch_len(block_size);
        if self.scratch.len() < len {
            self.scratch.resize(len, 0.0);
        }
        self.resampler.reserve(len);
        self.transformed.reserve(len);
        self.stretcher.reserve(len);
    }

    fn name(&self) -> &'static str {
        "Resampling Pitch Shifter"
    }
}
