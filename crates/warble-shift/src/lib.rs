//! Streaming pitch and formant shifters.
//!
//! - [`ResamplingPitchShifter`]: any [`TimeStretcher`](warble_stretch::TimeStretcher)
//!   followed by a [`LinearResampler`], with backlog drift control
//! - [`LpcFormantShifter`]: moves the LPC spectral envelope while keeping
//!   the harmonics in place
//!
//! Both implement [`Effect`](warble_core::Effect) and expose their factor as
//! property 0, an exponential slider over 0.5..=2.0.
//!
//! # Example
//!
//! ```
//! use warble_core::{Effect, FftCache};
//! use warble_shift::{PitchShifterConfig, ResamplingPitchShifter};
//! use warble_stretch::{PhaseVocoder, PhaseVocoderConfig};
//!
//! let mut cache = FftCache::new();
//! let pv = PhaseVocoder::new(PhaseVocoderConfig::default(), &mut cache)?;
//! let mut shifter = ResamplingPitchShifter::new(Box::new(pv), PitchShifterConfig::default())?;
//! shifter.set_shift_factor(1.5);
//!
//! shifter.push_signal(&vec![0.0; 4096]);
//! let mut out = vec![0.0; 512];
//! shifter.pop_transformed_signal(&mut out);
//! # Ok::<(), warble_core::Error>(())
//! ```

pub mod config;
pub mod factor;
pub mod formant_shifter;
pub mod pitch_shifter;
pub mod resampler;

pub use config::{FormantShifterConfig, PitchShifterConfig};
pub use factor::ShiftFactor;
pub use formant_shifter::LpcFormantShifter;
pub use pitch_shifter::ResamplingPitchShifter;
pub use resampler::LinearResampler;
