//! # Warble - Real-time Pitch and Formant Shifting
//!
//! Streaming voice-changer DSP built from modular crates.
//!
//! ## Architecture
//!
//! Warble is an umbrella crate that coordinates:
//! - **warble-core** - Ring buffer, FFT, LPC, Levinson solver, the [`Effect`](core::Effect)
//!   protocol and effect properties
//! - **warble-stretch** - Time-stretchers (OLA, WSOLA, PSOLA, phase vocoders)
//! - **warble-shift** - Resampling pitch shifter and LPC formant shifter
//!
//! Every component is push/pull: push any number of samples, pop as many as
//! are ready. Pops never over-deliver and zero-fill what they cannot produce.
//!
//! ## Quick Start
//!
//! ```
//! use warble::prelude::*;
//!
//! let mut engine = Engine::builder()
//!     .pitch_algorithm(StretchAlgorithm::PhaseVocoderDoneRight)
//!     .pitch_shift(1.25)
//!     .build()?;
//!
//! let input = vec![0.0; 512];
//! let mut output = vec![0.0; 512];
//! engine.process(&input, &mut output);
//! # Ok::<(), warble::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - Serialize/Deserialize for configs, properties and algorithm selectors

/// Re-export of warble-core for direct access
pub use warble_core as core;
/// Re-export of warble-stretch for direct access
pub use warble_stretch as stretch;
/// Re-export of warble-shift for direct access
pub use warble_shift as shift;

mod algorithm;
mod engine;
mod error;

pub use algorithm::{FormantAlgorithm, StretchAlgorithm};
pub use engine::{Engine, EngineBuilder};
pub use error::{Error, Result};

/// Convenience prelude for common imports
pub mod prelude {
    // Main engine
    pub use crate::{Engine, EngineBuilder, FormantAlgorithm, StretchAlgorithm};

    // Streaming protocol
    pub use crate::core::{Effect, EffectChain, FftCache, PropertyDesc, PropertyPayload};

    // Components
    pub use crate::shift::{LpcFormantShifter, ResamplingPitchShifter};
    pub use crate::stretch::{
        OlaStretcher, PhaseVocoder, PsolaStretcher, TimeStretcher, WsolaStretcher,
    };
}
