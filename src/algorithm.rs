//! Algorithm selectors for the engine's two stages.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use warble_core::{FftCache, Result};
use warble_stretch::{
    OlaConfig, OlaStretcher, PhaseVocoder, PhaseVocoderConfig, PsolaConfig, PsolaStretcher,
    TimeStretcher, WsolaConfig, WsolaStretcher,
};

/// Time-stretcher behind the pitch shifter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StretchAlgorithm {
    Ola,
    Wsola,
    Psola,
    #[default]
    PhaseVocoder,
    PhaseVocoderDoneRight,
}

impl StretchAlgorithm {
    pub const ALL: [Self; 5] = [
        Self::Ola,
        Self::Wsola,
        Self::Psola,
        Self::PhaseVocoder,
        Self::PhaseVocoderDoneRight,
    ];

    /// Build the stretcher with default tuning. `sample_rate` sets PSOLA's
    /// pitch search range and is ignored by the others.
    pub fn build(&self, cache: &mut FftCache, sample_rate: f32) -> Result<Box<dyn TimeStretcher>> {
        Ok(match self {
            Self::Ola => Box::new(OlaStretcher::new(OlaConfig::default())?),
            Self::Wsola => Box::new(WsolaStretcher::new(WsolaConfig::default())?),
            Self::Psola => Box::new(PsolaStretcher::new(
                PsolaConfig::default().with_sample_rate(sample_rate),
                cache,
            )?),
            Self::PhaseVocoder => Box::new(PhaseVocoder::new(PhaseVocoderConfig::default(), cache)?),
            Self::PhaseVocoderDoneRight => Box::new(PhaseVocoder::done_right(
                PhaseVocoderConfig::default(),
                cache,
            )?),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ola => "OLA",
            Self::Wsola => "WSOLA",
            Self::Psola => "PSOLA",
            Self::PhaseVocoder => "Phase Vocoder",
            Self::PhaseVocoderDoneRight => "Phase Vocoder Done Right",
        }
    }
}

/// Formant stage in front of the pitch shifter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FormantAlgorithm {
    /// Envelope re-weighting with [`LpcFormantShifter`](warble_shift::LpcFormantShifter).
    #[default]
    Lpc,
    /// PSOLA respaces the pitch periods and resampling restores the pitch, so
    /// only the formants move.
    Psola,
    /// No formant stage.
    None,
}
