//! Engine that chains a formant stage and a pitch stage.

use warble_core::{Effect, EffectChain, FftCache, PropertyPayload};
use warble_shift::{
    FormantShifterConfig, LpcFormantShifter, PitchShifterConfig, ResamplingPitchShifter,
    ShiftFactor,
};

use crate::algorithm::{FormantAlgorithm, StretchAlgorithm};
use crate::{Error, Result};

/// Streaming pitch and formant shifter.
///
/// Input runs through the formant stage first, then through a
/// [`ResamplingPitchShifter`] over the selected time-stretcher.
///
/// # Example
///
/// ```
/// use warble::prelude::*;
///
/// let mut engine = Engine::builder()
///     .pitch_algorithm(StretchAlgorithm::PhaseVocoder)
///     .formant_algorithm(FormantAlgorithm::Lpc)
///     .pitch_shift(1.5)
///     .formant_shift(0.8)
///     .build()?;
///
/// // Audio callback
/// let input = vec![0.0; 256];
/// let mut output = vec![0.0; 256];
/// engine.process(&input, &mut output);
/// # Ok::<(), warble::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    chain: EffectChain,
    pitch_algorithm: StretchAlgorithm,
    formant_algorithm: FormantAlgorithm,
    pitch_shift: f32,
    formant_shift: f32,
    sample_rate: f32,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Push `input`, then pop `output.len()` samples.
    ///
    /// Returns the number of samples produced. The rest of `output` is
    /// zeroed, which is what the stream sounds like until the analysis
    /// windows fill.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) -> usize {
        self.chain.push_signal(input);
        self.chain.pop_transformed_signal(output)
    }

    pub fn set_pitch_shift(&mut self, shift: f32) {
        self.pitch_shift = ShiftFactor::new(shift).get();
        let stage = self.chain.len() - 1;
        if let Some(pitch) = self.chain.stage_mut(stage) {
            pitch.set_property(0, PropertyPayload::Slider(self.pitch_shift));
        }
    }

    pub fn pitch_shift(&self) -> f32 {
        self.pitch_shift
    }

    /// Has no audible effect with [`FormantAlgorithm::None`], but is kept.
    pub fn set_formant_shift(&mut self, shift: f32) {
        self.formant_shift = ShiftFactor::new(shift).get();
        if self.formant_algorithm == FormantAlgorithm::None {
            return;
        }
        if let Some(formant) = self.chain.stage_mut(0) {
            formant.set_property(0, PropertyPayload::Slider(self.formant_shift));
        }
    }

    pub fn formant_shift(&self) -> f32 {
        self.formant_shift
    }

    pub fn pitch_algorithm(&self) -> StretchAlgorithm {
        self.pitch_algorithm
    }

    pub fn formant_algorithm(&self) -> FormantAlgorithm {
        self.formant_algorithm
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Delay between input and output with both factors at 1.0.
    pub fn latency_samples(&self) -> usize {
        self.chain.latency_samples()
    }

    pub fn n_transformed_ready(&self) -> usize {
        self.chain.n_transformed_ready()
    }

    /// Stages in processing order.
    pub fn chain(&self) -> &EffectChain {
        &self.chain
    }

    /// Drop all buffered audio. Factors are kept.
    pub fn reset(&mut self) {
        self.chain.reset();
    }
}

/// Builder for [`Engine`].
///
/// Defaults: phase vocoder pitch stage, LPC formant stage, both factors 1.0,
/// 44.1 kHz.
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    pitch_algorithm: StretchAlgorithm,
    formant_algorithm: FormantAlgorithm,
    pitch_shift: f32,
    formant_shift: f32,
    sample_rate: f32,
    block_size: usize,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            pitch_algorithm: StretchAlgorithm::default(),
            formant_algorithm: FormantAlgorithm::default(),
            pitch_shift: 1.0,
            formant_shift: 1.0,
            sample_rate: 44_100.0,
            block_size: 1024,
        }
    }
}

impl EngineBuilder {
    pub fn pitch_algorithm(mut self, algorithm: StretchAlgorithm) -> Self {
        self.pitch_algorithm = algorithm;
        self
    }

    pub fn formant_algorithm(mut self, algorithm: FormantAlgorithm) -> Self {
        self.formant_algorithm = algorithm;
        self
    }

    /// Default: 1.0. Clamped to 0.5..=2.0.
    pub fn pitch_shift(mut self, shift: f32) -> Self {
        self.pitch_shift = shift;
        self
    }

    /// Default: 1.0. Clamped to 0.5..=2.0.
    pub fn formant_shift(mut self, shift: f32) -> Self {
        self.formant_shift = shift;
        self
    }

    /// Default: 44100
    pub fn sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Largest `process` call expected, used to pre-size inter-stage
    /// scratch. Default: 1024
    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn build(self) -> Result<Engine> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(Error::Engine(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }

        let mut cache = FftCache::new();
        let mut chain = EffectChain::new();

        match self.formant_algorithm {
            FormantAlgorithm::Lpc => {
                let shifter = LpcFormantShifter::new(FormantShifterConfig::default(), &mut cache)?;
                chain.push(Box::new(shifter));
            }
            FormantAlgorithm::Psola => {
                let psola = StretchAlgorithm::Psola.build(&mut cache, self.sample_rate)?;
                let shifter = ResamplingPitchShifter::new(psola, PitchShifterConfig::default())?;
                chain.push(Box::new(shifter));
            }
            FormantAlgorithm::None => {}
        }

        let stretcher = self.pitch_algorithm.build(&mut cache, self.sample_rate)?;
        let pitch = ResamplingPitchShifter::new(stretcher, PitchShifterConfig::default())?;
        chain.push(Box::new(pitch));
        chain.reserve(self.block_size);

        tracing::debug!(
            pitch = self.pitch_algorithm.name(),
            formant = ?self.formant_algorithm,
            stages = chain.len(),
            latency = chain.latency_samples(),
            sample_rate = self.sample_rate,
            "built engine"
        );

        let mut engine = Engine {
            chain,
            pitch_algorithm: self.pitch_algorithm,
            formant_algorithm: self.formant_algorithm,
            pitch_shift: 1.0,
            formant_shift: 1.0,
            sample_rate: self.sample_rate,
        };
        engine.set_pitch_shift(self.pitch_shift);
        engine.set_formant_shift(self.formant_shift);
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_build() {
        let engine = Engine::builder().build().unwrap();
        assert_eq!(engine.chain().len(), 2);
        assert_eq!(engine.pitch_algorithm(), StretchAlgorithm::PhaseVocoder);
        assert_eq!(engine.chain().stage(0).map(|s| s.name()), Some("LPC Formant Shifter"));
        assert_eq!(
            engine.chain().stage(1).map(|s| s.name()),
            Some("Resampling Pitch Shifter")
        );
    }

    #[test]
    fn test_formant_none_has_single_stage() {
        let mut engine = Engine::builder()
            .formant_algorithm(FormantAlgorithm::None)
            .build()
            .unwrap();
        assert_eq!(engine.chain().len(), 1);

        engine.set_formant_shift(1.5);
        assert_eq!(engine.formant_shift(), 1.5);
        // The pitch stage is untouched.
        assert_eq!(engine.chain().property(0), PropertyPayload::Slider(1.0));
    }

    #[test]
    fn test_shifts_reach_stages() {
        let mut engine = Engine::builder()
            .pitch_shift(1.5)
            .formant_shift(0.75)
            .build()
            .unwrap();
        assert_eq!(engine.chain().property(0), PropertyPayload::Slider(0.75));
        assert_eq!(engine.chain().property(1), PropertyPayload::Slider(1.5));

        engine.set_pitch_shift(5.0);
        assert_eq!(engine.pitch_shift(), 2.0);
        assert_eq!(engine.chain().property(1), PropertyPayload::Slider(2.0));
    }

    #[test]
    fn test_rejects_bad_sample_rate() {
        let err = Engine::builder().sample_rate(-1.0).build().unwrap_err();
        assert!(matches!(err, Error::Engine(_)));
    }

    #[test]
    fn test_process_zero_fills_until_primed() {
        let mut engine = Engine::builder().build().unwrap();
        let input = [0.5; 64];
        let mut output = [1.0; 64];
        assert_eq!(engine.process(&input, &mut output), 0);
        assert_eq!(output, [0.0; 64]);
    }
}
