//! Fade curves and overlap helpers.
//!
//! Fades are functions of a normalized position `x` in `[0, 1]` that rise
//! from (near) zero to one. Cross-fades weight the incoming block by `f(x)` and
//! the outgoing one by `1 - f(x)`.

use std::f32::consts::TAU;

use crate::ring_buffer::RingBuffer;

/// Fade curve over `[0, 1]`.
pub type WindowFn = fn(f32) -> f32;

/// Generalized raised cosine `a0 - (1 - a0)·cos(2πx)`.
#[inline]
pub fn raised_cosine(a0: f32, x: f32) -> f32 {
    a0 - (1.0 - a0) * (TAU * x).cos()
}

/// Rising half of a Hann window: 0 at `x = 0`, 1 at `x = 1`.
#[inline]
pub fn hann_window(x: f32) -> f32 {
    raised_cosine(0.5, 0.5 * x)
}

/// Rising half of a Hamming window: about 0.087 at `x = 0`, 1 at `x = 1`.
#[inline]
pub fn hamming_window(x: f32) -> f32 {
    raised_cosine(25.0 / 46.0, 0.5 * x)
}

/// Taper the first and last `width` samples of `samples` with `window`.
pub fn window_ends(samples: &mut [f32], width: usize, window: WindowFn) {
    let len = samples.len();
    let width = width.min(len / 2);
    for i in 0..width {
        let gain = window(i as f32 / width as f32);
        samples[i] *= gain;
        samples[len - 1 - i] *= gain;
    }
}

/// Cross-fade `prev` into `next` sample by sample, writing `out`.
pub fn overlap_add(prev: &[f32], next: &[f32], out: &mut [f32], window: WindowFn) {
    let len = out.len();
    for (i, ((out, &p), &n)) in out.iter_mut().zip(prev).zip(next).enumerate() {
        let w = window(i as f32 / len as f32);
        *out = w * n + (1.0 - w) * p;
    }
}

/// Cross-fade the head of `new_data` over the last `overlap` samples of
/// `buffer`, then append the remainder.
///
/// `overlap` is clamped to the current buffer length.
pub fn mix_and_extend(
    buffer: &mut RingBuffer<f32>,
    new_data: &[f32],
    overlap: usize,
    window: WindowFn,
) {
    let overlap = overlap.min(buffer.len());
    let mixed = overlap.min(new_data.len());
    let start = buffer.len() - overlap;

    for (i, &sample) in new_data[..mixed].iter().enumerate() {
        let w = window(i as f32 / overlap as f32);
        let slot = &mut buffer[start + i];
        *slot = *slot * (1.0 - w) + sample * w;
    }
    buffer.extend_back(&new_data[mixed..]);
}

/// Add the head of `new_data` onto the last `overlap` samples of `buffer`
/// without any fade, then append the remainder.
///
/// `overlap` may exceed `new_data.len()`, in which case the data lands inside
/// the buffer and nothing is appended. It is clamped to the buffer length.
pub fn add_and_extend(buffer: &mut RingBuffer<f32>, new_data: &[f32], overlap: usize) {
    let overlap = overlap.min(buffer.len());
    let mixed = overlap.min(new_data.len());
    let start = buffer.len() - overlap;

    for (i, &sample) in new_data[..mixed].iter().enumerate() {
        buffer[start + i] += sample;
    }
    buffer.extend_back(&new_data[mixed..]);
}
