//! Streaming time-stretchers.
//!
//! Every stretcher implements [`TimeStretcher`], an [`Effect`](warble_core::Effect)
//! whose output is its input played `stretch_factor` times as long. Property 0
//! is always the stretch factor. All but PSOLA keep the original pitch; PSOLA
//! respaces pitch periods and keeps the formants instead.
//!
//! | Stretcher | Approach | Latency at 1.0 |
//! |-----------|----------|----------------|
//! | [`OlaStretcher`] | Correlation-aligned overlap-add | `window - overlap` |
//! | [`WsolaStretcher`] | Waveform-similarity overlap-add per block | 0 |
//! | [`PsolaStretcher`] | Pitch-synchronous overlap-add | `2·max_period + 1` |
//! | [`PhaseVocoder`] | STFT with per-bin phase advance | 0 |
//! | [`PhaseVocoder::done_right`] | STFT with heap-ordered phase propagation | 0 |
//!
//! # Example
//!
//! ```
//! use warble_core::{Effect, FftCache};
//! use warble_stretch::{PhaseVocoder, PhaseVocoderConfig, TimeStretcher};
//!
//! let mut cache = FftCache::new();
//! let mut pv = PhaseVocoder::new(PhaseVocoderConfig::default(), &mut cache)?;
//! pv.set_stretch_factor(1.5);
//!
//! pv.push_signal(&vec![0.0; 4096]);
//! let mut out = vec![0.0; 1024];
//! let produced = pv.pop_transformed_signal(&mut out);
//! assert!(produced <= out.len());
//! # Ok::<(), warble_core::Error>(())
//! ```

pub mod config;
pub mod done_right;
pub mod ola;
pub mod phase_vocoder;
pub mod psola;
pub mod types;
pub mod wsola;

pub use config::{OlaConfig, PhaseVocoderConfig, PsolaConfig, WsolaConfig};
pub use done_right::PhasePropagator;
pub use ola::OlaStretcher;
pub use phase_vocoder::PhaseVocoder;
pub use psola::PsolaStretcher;
pub use types::{HopAccumulator, StretchFactor, TimeStretcher};
pub use wsola::WsolaStretcher;
