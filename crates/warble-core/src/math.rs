//! Small numeric helpers shared by the spectral code.

use std::f32::consts::{PI, TAU};

/// Smallest power of two `>= n`. Zero maps to one.
#[inline]
pub fn next_power_of_two(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Floating-point modulo with a result in `[0, m)`.
#[inline]
pub fn fposmod(x: f32, m: f32) -> f32 {
    let r = x % m;
    if r < 0.0 {
        r + m
    } else {
        r
    }
}

/// Wrap a phase to `[-PI, PI)`.
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    fposmod(phase + PI, TAU) - PI
}

/// Phase advance from `prev` to `next`, unwrapped around the expected advance `estimate`.
///
/// Only the deviation from `estimate` is wrapped, so advances of several cycles
/// per hop survive.
#[inline]
pub fn phase_diff(next: f32, prev: f32, estimate: f32) -> f32 {
    wrap_phase(next - prev - estimate) + estimate
}

/// Root mean square of a block. Empty input gives zero.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let power: f32 = samples.iter().map(|s| s * s).sum();
    (power / samples.len() as f32).sqrt()
}
