//! Test helpers and fixtures for warble integration tests
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (passthrough, unity gain)
//! - `DSP_EPSILON` (1e-4): Time-domain splicing at unity
//! - `SPECTRAL_EPSILON` (2e-3): FFT resynthesis at unity
//! - `FORMANT_EPSILON` (5e-3): LPC resynthesis at unity
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)

pub mod tolerances;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use warble::prelude::*;

/// Default test sample rate
pub const TEST_SAMPLE_RATE: f32 = 44_100.0;

/// Standard callback size for streaming tests
pub const TEST_BUFFER_SIZE: usize = 256;

/// Install a test-writer `tracing` subscriber. Repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

// =============================================================================
// Signal Generators
// =============================================================================

/// Full-scale sine at `frequency` Hz, phase computed in f64.
pub fn generate_sine(frequency: f32, sample_rate: f32, num_samples: usize) -> Vec<f32> {
    let step = std::f64::consts::TAU * f64::from(frequency) / f64::from(sample_rate);
    (0..num_samples)
        .map(|i| (step * i as f64).sin() as f32)
        .collect()
}

pub fn generate_silence(num_samples: usize) -> Vec<f32> {
    vec![0.0; num_samples]
}

/// Reproducible white noise in `[-1, 1)` from a 64-bit LCG.
pub fn generate_noise(num_samples: usize, seed: u64) -> Vec<f32> {
    let mut state = seed;
    (0..num_samples)
        .map(|_| {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            ((state >> 33) as f32 / (1u64 << 31) as f32) * 2.0 - 1.0
        })
        .collect()
}

/// Voiced, vowel-like signal: a band-limited buzz at `pitch` Hz through a
/// one-pole lowpass, so LPC finds a sloped envelope.
pub fn generate_vowel(pitch: f32, sample_rate: f32, num_samples: usize) -> Vec<f32> {
    let harmonics = ((0.4 * sample_rate / pitch) as usize).clamp(1, 30);
    let mut state = 0.0f32;
    (0..num_samples)
        .map(|i| {
            let phase = std::f32::consts::TAU * pitch * i as f32 / sample_rate;
            let buzz: f32 = (1..=harmonics)
                .map(|k| (k as f32 * phase).sin() / k as f32)
                .sum();
            state = 0.7 * state + 0.3 * buzz;
            0.5 * state
        })
        .collect()
}

// =============================================================================
// Measurements
// =============================================================================

/// Root mean square, 0 for an empty slice.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let energy: f32 = samples.iter().map(|s| s * s).sum();
    (energy / samples.len() as f32).sqrt()
}

/// Largest absolute sample.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |max, s| max.max(s.abs()))
}

/// Largest-magnitude bin below Nyquist, skipping DC. Uses rustfft as an
/// independent reference.
pub fn dominant_bin(samples: &[f32]) -> usize {
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(samples.len());

    let mut buffer: Vec<Complex<f32>> = samples.iter().map(|&s| Complex::new(s, 0.0)).collect();
    fft.process(&mut buffer);

    buffer[..samples.len() / 2]
        .iter()
        .enumerate()
        .skip(1)
        .max_by(|a, b| a.1.norm_sqr().total_cmp(&b.1.norm_sqr()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Bin of `frequency` in an FFT of `size` samples.
pub fn frequency_bin(frequency: f32, sample_rate: f32, size: usize) -> usize {
    (frequency * size as f32 / sample_rate).round() as usize
}

/// Largest absolute difference after skipping `skip` warm-up samples.
pub fn max_deviation(output: &[f32], reference: &[f32], skip: usize) -> f32 {
    output
        .iter()
        .zip(reference)
        .skip(skip)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f32::max)
}

// =============================================================================
// Streaming
// =============================================================================

/// Pop until the effect is starved, concatenating what was produced.
pub fn drain<E: Effect + ?Sized>(effect: &mut E, block: usize) -> Vec<f32> {
    let mut out = Vec::new();
    let mut buffer = vec![0.0; block];
    loop {
        let n = effect.pop_transformed_signal(&mut buffer);
        if n == 0 {
            return out;
        }
        out.extend_from_slice(&buffer[..n]);
    }
}

/// Drive an effect like an audio callback: push a block, pop a block, and
/// keep only what was actually produced.
pub fn stream<E: Effect + ?Sized>(effect: &mut E, input: &[f32], block: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(input.len());
    let mut buffer = vec![0.0; block];
    for chunk in input.chunks(block) {
        effect.push_signal(chunk);
        let n = effect.pop_transformed_signal(&mut buffer[..chunk.len()]);
        out.extend_from_slice(&buffer[..n]);
    }
    out
}

// =============================================================================
// Assertions
// =============================================================================

/// Every sample within `tolerance` of zero.
pub fn assert_silence(samples: &[f32], tolerance: f32) {
    let loudest = peak(samples);
    assert!(loudest <= tolerance, "expected silence, peak was {}", loudest);
}

/// RMS of at least `min_rms`.
pub fn assert_has_audio(samples: &[f32], min_rms: f32) {
    let level = rms(samples);
    assert!(level >= min_rms, "expected audio with RMS >= {}, got {}", min_rms, level);
}

/// Assert that every sample is finite.
pub fn assert_finite(samples: &[f32]) {
    if let Some(i) = samples.iter().position(|s| !s.is_finite()) {
        panic!("non-finite sample {} at index {}", samples[i], i);
    }
}
