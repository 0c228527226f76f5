//! Tolerance constants for audio testing.
//!
//! Different operations require different precision levels.

/// Floating point rounding errors (for passthrough, exact gain).
/// Use for operations that should be mathematically exact.
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Time-domain splicing tolerance (OLA family at unity).
pub const DSP_EPSILON: f32 = 1e-4;

/// Spectral resynthesis at unity factor.
///
/// One-sided synthesis drops the Nyquist bin, which costs roughly
/// `|x[0] - x[N-1]| / 2N` per sample on unwindowed frames.
pub const SPECTRAL_EPSILON: f32 = 2e-3;

/// LPC-driven resynthesis at unity factor (spectral error plus RMS rescale).
pub const FORMANT_EPSILON: f32 = 5e-3;

/// Silence threshold (~-80dB).
/// Values below this are considered silent.
pub const SILENCE_THRESHOLD: f32 = 0.0001;

/// Relative RMS deviation allowed when a shift should not change loudness.
pub const LOUDNESS_TOLERANCE: f32 = 0.25;
