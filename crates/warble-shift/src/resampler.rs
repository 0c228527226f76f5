//! Streaming linear-interpolation resampler with an anti-aliasing lowpass.
//!
//! ## Algorithm Overview
//!
//! The resampler reads its input at a fractional position that advances by
//! `ratio` per output sample, so the output is about `input / ratio` samples
//! long. The position and the last input sample carry across calls, so
//! chunked input resamples exactly like one contiguous block.
//!
//! Band-limiting uses a 4th-order Butterworth lowpass built from two RBJ
//! biquads, with the cutoff at the lower of the two Nyquist rates:
//!
//! - `ratio > 1` (reading faster, pitch up): the input is filtered first.
//! - `ratio < 1` (reading slower, pitch down): the output is filtered.
//! - `ratio == 1`: no filtering, and the input passes through unchanged.
//!
//! ## RT-Safety
//!
//! `resample` appends to a caller-owned [`RingBuffer`] and only allocates when
//! that buffer grows past its capacity.

use std::f32::consts::TAU;

use warble_core::RingBuffer;

/// Q of the two sections of a 4th-order Butterworth.
const BUTTERWORTH_Q: [f32; 2] = [0.541_196_1, 1.306_563];

/// Transposed direct form II biquad.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

impl Biquad {
    /// RBJ cookbook lowpass. `cutoff` is a fraction of the sample rate.
    fn lowpass(cutoff: f32, q: f32) -> Self {
        let w0 = TAU * cutoff.clamp(1e-4, 0.499);
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * q);
        let a0 = 1.0 + alpha;

        Self {
            b0: (1.0 - cos) / 2.0 / a0,
            b1: (1.0 - cos) / a0,
            b2: (1.0 - cos) / 2.0 / a0,
            a1: -2.0 * cos / a0,
            a2: (1.0 - alpha) / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }

    fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

/// Two cascaded biquads forming a 4th-order Butterworth lowpass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Lowpass {
    stages: [Biquad; 2],
}

impl Lowpass {
    fn new(cutoff: f32) -> Self {
        Self {
            stages: BUTTERWORTH_Q.map(|q| Biquad::lowpass(cutoff, q)),
        }
    }

    #[inline]
    fn process(&mut self, x: f32) -> f32 {
        let y = self.stages[0].process(x);
        self.stages[1].process(y)
    }

    fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }
}

/// Streaming linear resampler.
#[derive(Debug, Clone)]
pub struct LinearResampler {
    ratio: f32,
    /// Read position in `[last, input[0], input[1], ...]`.
    position: f64,
    last: f32,
    filter: Lowpass,
    filtered: Vec<f32>,
}

impl LinearResampler {
    /// Resampler that outputs about `input / ratio` samples. `ratio` must be
    /// positive and finite; anything else falls back to 1.0.
    pub fn new(ratio: f32) -> Self {
        let ratio = sanitize(ratio);
        Self {
            ratio,
            position: 1.0,
            last: 0.0,
            filter: Lowpass::new(cutoff(ratio)),
            filtered: Vec::new(),
        }
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Change the ratio. Filter state is kept unless the filter switches side.
    pub fn set_ratio(&mut self, ratio: f32) {
        let ratio = sanitize(ratio);
        if ratio == self.ratio {
            return;
        }

        let state = self.filter;
        self.filter = Lowpass::new(cutoff(ratio));
        if (ratio > 1.0) == (self.ratio > 1.0) {
            for (stage, old) in self.filter.stages.iter_mut().zip(&state.stages) {
                stage.z1 = old.z1;
                stage.z2 = old.z2;
            }
        }
        self.ratio = ratio;
    }

    /// Resample `input`, appending to `output`. Returns the number of samples
    /// appended.
    pub fn resample(&mut self, input: &[f32], output: &mut RingBuffer<f32>) -> usize {
        if input.is_empty() {
            return 0;
        }

        let ratio = self.ratio;
        let source: &[f32] = if ratio > 1.0 {
            self.filtered.clear();
            let filter = &mut self.filter;
            self.filtered.extend(input.iter().map(|&x| filter.process(x)));
            &self.filtered
        } else {
            input
        };

        let n = source.len();
        let sample = |k: usize| if k == 0 { self.last } else { source[k - 1] };

        let before = output.len();
        while self.position <= n as f64 {
            let index = self.position as usize;
            let frac = (self.position - index as f64) as f32;
            let value = if frac == 0.0 {
                sample(index)
            } else {
                sample(index) + (sample(index + 1) - sample(index)) * frac
            };

            output.push_back(value);
            self.position += f64::from(ratio);
        }
        self.position -= n as f64;
        self.last = source[n - 1];

        let appended = output.len() - before;
        if ratio < 1.0 {
            for i in before..output.len() {
                output[i] = self.filter.process(output[i]);
            }
        }
        appended
    }

    /// Pre-size the filter scratch for inputs of up to `max_input` samples.
    pub fn reserve(&mut self, max_input: usize) {
        self.filtered.reserve(max_input);
    }

    pub fn reset(&mut self) {
        self.position = 1.0;
        self.last = 0.0;
        self.filter.reset();
    }
}

fn sanitize(ratio: f32) -> f32 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        1.0
    }
}

/// Lowpass cutoff as a fraction of the filtered stream's rate.
fn cutoff(ratio: f32) -> f32 {
    0.5 * ratio.min(1.0 / ratio)
}
