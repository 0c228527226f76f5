//! Shifter configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use warble_core::{Error, Result};

/// Drift control of [`ResamplingPitchShifter`](crate::ResamplingPitchShifter).
///
/// A stretcher that rounds hops produces slightly more or less than
/// `stretch·input`, and the resampled output backs up over time. Past
/// `increase_backlog_threshold` buffered samples the stretcher is slowed
/// exponentially, halving its excess factor every `half_life` samples of
/// backlog. Below `standard_backlog_threshold` it runs at the nominal factor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PitchShifterConfig {
    pub increase_backlog_threshold: usize,
    pub standard_backlog_threshold: usize,
    pub half_life: f32,
}

impl PitchShifterConfig {
    pub fn with_backlog_thresholds(mut self, standard: usize, increase: usize) -> Self {
        self.standard_backlog_threshold = standard;
        self.increase_backlog_threshold = increase;
        self
    }

    pub fn with_half_life(mut self, half_life: f32) -> Self {
        self.half_life = half_life;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.standard_backlog_threshold > self.increase_backlog_threshold {
            return Err(Error::config(format!(
                "standard backlog threshold {} exceeds increase threshold {}",
                self.standard_backlog_threshold, self.increase_backlog_threshold
            )));
        }
        if !(self.half_life.is_finite() && self.half_life > 0.0) {
            return Err(Error::config(format!(
                "backlog half-life must be positive, got {}",
                self.half_life
            )));
        }
        Ok(())
    }
}

impl Default for PitchShifterConfig {
    fn default() -> Self {
        Self {
            increase_backlog_threshold: 5000,
            standard_backlog_threshold: 3000,
            half_life: 7500.0,
        }
    }
}

/// [`LpcFormantShifter`](crate::LpcFormantShifter) analysis settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FormantShifterConfig {
    /// FFT length.
    pub window_size: usize,
    /// LPC order of the spectral envelope.
    pub lpc_order: usize,
}

impl FormantShifterConfig {
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_lpc_order(mut self, lpc_order: usize) -> Self {
        self.lpc_order = lpc_order;
        self
    }

    /// Input advance per window, three fifths of the window.
    pub fn hop(&self) -> usize {
        self.window_size * 3 / 5
    }

    pub fn overlap(&self) -> usize {
        self.window_size - self.hop()
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size < 4 || !self.window_size.is_power_of_two() {
            return Err(Error::config(format!(
                "formant shifter window size must be a power of two of at least 4, got {}",
                self.window_size
            )));
        }
        if self.lpc_order == 0 || self.lpc_order >= self.window_size {
            return Err(Error::config(format!(
                "LPC order {} must be in 1..{}",
                self.lpc_order, self.window_size
            )));
        }
        Ok(())
    }
}

impl Default for FormantShifterConfig {
    fn default() -> Self {
        Self {
            window_size: 512,
            lpc_order: 25,
        }
    }
}
