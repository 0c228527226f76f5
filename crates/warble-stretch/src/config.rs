//! Per-algorithm configuration.
//!
//! Every config has a `Default` matching the reference tuning at 44.1 kHz,
//! `with_*` setters and a `validate()` that constructors call before
//! allocating anything.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use warble_core::{Error, Result};

fn check_power_of_two(name: &str, value: usize) -> Result<()> {
    if value == 0 || !value.is_power_of_two() {
        return Err(Error::config(format!(
            "{} must be a positive power of two, got {}",
            name, value
        )));
    }
    Ok(())
}

fn check_order(order: usize, window_size: usize) -> Result<()> {
    if order == 0 || order >= window_size {
        return Err(Error::config(format!(
            "LPC order {} must be in 1..{}",
            order, window_size
        )));
    }
    Ok(())
}

/// Synchronized overlap-add.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OlaConfig {
    /// Samples copied from the input per iteration.
    pub window_size: usize,
}

impl OlaConfig {
    pub const MIN_WINDOW: usize = 16;

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Cross-fade length, a fifth of the window.
    pub fn overlap(&self) -> usize {
        self.window_size / 5
    }

    /// Range searched for the best splice point, half the window.
    pub fn selection(&self) -> usize {
        self.window_size / 2
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size < Self::MIN_WINDOW {
            return Err(Error::config(format!(
                "OLA window size must be at least {}, got {}",
                Self::MIN_WINDOW,
                self.window_size
            )));
        }
        Ok(())
    }
}

impl Default for OlaConfig {
    fn default() -> Self {
        Self { window_size: 2048 }
    }
}

/// Waveform-similarity overlap-add.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WsolaConfig {
    /// Input samples examined per processing pass.
    pub block_size: usize,
    /// Length of one overlap + flat + overlap segment.
    pub window_size: usize,
}

impl WsolaConfig {
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Nominal overlap, a quarter of the window.
    pub fn overlap(&self) -> usize {
        self.window_size / 4
    }

    /// How far past the nominal overlap start to look for a better match.
    pub fn search(&self) -> usize {
        self.window_size / 5
    }

    /// Unmixed middle section of each window.
    pub fn flat(&self) -> usize {
        self.window_size - 2 * self.overlap()
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size < 8 {
            return Err(Error::config(format!(
                "WSOLA window size must be at least 8, got {}",
                self.window_size
            )));
        }
        if self.block_size < 2 * self.window_size {
            return Err(Error::config(format!(
                "WSOLA block size {} must be at least twice the window size {}",
                self.block_size, self.window_size
            )));
        }
        Ok(())
    }
}

impl Default for WsolaConfig {
    fn default() -> Self {
        Self {
            block_size: 2048,
            window_size: 1024,
        }
    }
}

/// Pitch-synchronous overlap-add.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PsolaConfig {
    /// Input samples analyzed per pass. Also the pitch-detection FFT length.
    pub block_size: usize,
    pub lpc_order: usize,
    /// Lowest detectable fundamental.
    pub min_pitch_hz: f32,
    /// Highest detectable fundamental.
    pub max_pitch_hz: f32,
    pub sample_rate: f32,
    /// Harmonics summed by the pitch detector.
    pub harmonics: usize,
}

impl PsolaConfig {
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_lpc_order(mut self, lpc_order: usize) -> Self {
        self.lpc_order = lpc_order;
        self
    }

    pub fn with_pitch_range(mut self, min_hz: f32, max_hz: f32) -> Self {
        self.min_pitch_hz = min_hz;
        self.max_pitch_hz = max_hz;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_harmonics(mut self, harmonics: usize) -> Self {
        self.harmonics = harmonics;
        self
    }

    /// Lowest FFT bin searched for the fundamental. At least 2, so every
    /// period estimate fits in a block twice.
    pub fn min_bin(&self) -> usize {
        ((self.min_pitch_hz * self.block_size as f32 / self.sample_rate) as usize).max(2)
    }

    /// One past the highest FFT bin searched for the fundamental.
    pub fn max_bin(&self) -> usize {
        ((self.max_pitch_hz * self.block_size as f32 / self.sample_rate) as usize)
            .min(self.block_size / 2)
    }

    /// Longest period, in samples, the detector is tuned for.
    pub fn max_period(&self) -> usize {
        (self.sample_rate / self.min_pitch_hz) as usize
    }

    /// Output samples held back for overlaps reaching into the past.
    pub fn held_back(&self) -> usize {
        2 * self.max_period() + 1
    }

    pub fn validate(&self) -> Result<()> {
        check_power_of_two("PSOLA block size", self.block_size)?;
        check_order(self.lpc_order, self.block_size)?;
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(Error::config(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if !(self.min_pitch_hz > 0.0 && self.min_pitch_hz < self.max_pitch_hz) {
            return Err(Error::config(format!(
                "pitch range {}..{} Hz is empty",
                self.min_pitch_hz, self.max_pitch_hz
            )));
        }
        if self.harmonics < 2 {
            return Err(Error::config("PSOLA needs at least 2 harmonics"));
        }
        if self.max_bin() <= self.min_bin() {
            return Err(Error::config(format!(
                "pitch range {}..{} Hz covers no bins of a {}-sample block",
                self.min_pitch_hz, self.max_pitch_hz, self.block_size
            )));
        }
        Ok(())
    }
}

impl Default for PsolaConfig {
    fn default() -> Self {
        Self {
            block_size: 2048,
            lpc_order: 16,
            min_pitch_hz: 50.0,
            max_pitch_hz: 800.0,
            sample_rate: 44100.0,
            harmonics: 10,
        }
    }
}

/// Phase vocoder, shared by both phase-propagation strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhaseVocoderConfig {
    /// FFT length.
    pub window_size: usize,
    /// Output stride between frames.
    pub synthesis_hop: usize,
    /// LPC order of the envelope used for formant preservation.
    pub lpc_order: usize,
    pub preserve_formants: bool,
}

impl PhaseVocoderConfig {
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_synthesis_hop(mut self, synthesis_hop: usize) -> Self {
        self.synthesis_hop = synthesis_hop;
        self
    }

    pub fn with_lpc_order(mut self, lpc_order: usize) -> Self {
        self.lpc_order = lpc_order;
        self
    }

    pub fn with_preserve_formants(mut self, preserve: bool) -> Self {
        self.preserve_formants = preserve;
        self
    }

    /// Samples each frame cross-fades into the previous one.
    pub fn overlap(&self) -> usize {
        self.window_size - self.synthesis_hop
    }

    pub fn validate(&self) -> Result<()> {
        check_power_of_two("phase vocoder window size", self.window_size)?;
        if self.window_size < 4 {
            return Err(Error::config("phase vocoder window size must be at least 4"));
        }
        if self.synthesis_hop == 0 || self.synthesis_hop >= self.window_size {
            return Err(Error::config(format!(
                "synthesis hop {} must be in 1..{}",
                self.synthesis_hop, self.window_size
            )));
        }
        check_order(self.lpc_order, self.window_size)
    }
}

impl Default for PhaseVocoderConfig {
    fn default() -> Self {
        Self {
            window_size: 512,
            synthesis_hop: 400,
            lpc_order: 50,
            preserve_formants: false,
        }
    }
}
