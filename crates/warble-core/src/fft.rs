//! Fixed-size radix-2 FFT with shared twiddle tables.
//!
//! ## Algorithm Overview
//!
//! 1. **Plan**: roots `exp(-i·2π·k/fft_size)` are computed once per power-of-two
//!    length and shared between transforms through an [`FftCache`].
//! 2. **Forward**: recursive decimation-in-time. Inputs shorter than the
//!    internal length are zero-padded. Only the first `size` bins are written.
//! 3. **Inverse**: conjugate, forward, conjugate.
//!
//! Both directions scale by `1/sqrt(fft_size)`, so a forward/inverse pair is the
//! identity and Parseval holds without extra factors.
//!
//! ## RT-Safety
//!
//! Each [`Fft`] owns its scratch buffer. `transform()` and `inverse_transform()`
//! perform no allocations.

use std::collections::HashMap;
use std::sync::Arc;

pub use num_complex::Complex32;

use crate::math::next_power_of_two;
use crate::ring_buffer::RingBuffer;

const ZERO: Complex32 = Complex32::new(0.0, 0.0);

/// Anything a transform can read samples from by index.
///
/// Real inputs are promoted to complex with a zero imaginary part. Indices at
/// or past [`input_len`](FftInput::input_len) are never requested.
pub trait FftInput {
    fn input_len(&self) -> usize;
    fn sample(&self, index: usize) -> Complex32;
}

impl FftInput for [Complex32] {
    #[inline]
    fn input_len(&self) -> usize {
        self.len()
    }

    #[inline]
    fn sample(&self, index: usize) -> Complex32 {
        self[index]
    }
}

impl FftInput for [f32] {
    #[inline]
    fn input_len(&self) -> usize {
        self.len()
    }

    #[inline]
    fn sample(&self, index: usize) -> Complex32 {
        Complex32::new(self[index], 0.0)
    }
}

impl FftInput for RingBuffer<Complex32> {
    #[inline]
    fn input_len(&self) -> usize {
        self.len()
    }

    #[inline]
    fn sample(&self, index: usize) -> Complex32 {
        self[index]
    }
}

impl FftInput for RingBuffer<f32> {
    #[inline]
    fn input_len(&self) -> usize {
        self.len()
    }

    #[inline]
    fn sample(&self, index: usize) -> Complex32 {
        Complex32::new(self[index], 0.0)
    }
}

/// Immutable twiddle table for one power-of-two length.
#[derive(Debug)]
pub struct FftPlan {
    fft_size: usize,
    roots: Vec<Complex32>,
    scale: f32,
}

impl FftPlan {
    /// Build the table for the next power of two `>= size`.
    pub fn new(size: usize) -> Self {
        let fft_size = next_power_of_two(size);
        let roots = (0..fft_size)
            .map(|k| {
                let angle = -std::f32::consts::TAU * k as f32 / fft_size as f32;
                Complex32::from_polar(1.0, angle)
            })
            .collect();

        Self {
            fft_size,
            roots,
            scale: 1.0 / (fft_size as f32).sqrt(),
        }
    }

    /// Internal power-of-two length.
    #[inline]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    #[inline]
    pub fn roots(&self) -> &[Complex32] {
        &self.roots
    }
}

/// Transform of a fixed logical length.
///
/// `size` is what callers asked for and how many bins are written. `fft_size`
/// is the power of two the recursion runs at.
#[derive(Debug, Clone)]
pub struct Fft {
    size: usize,
    plan: Arc<FftPlan>,
    scratch: Vec<Complex32>,
}

impl Fft {
    /// Create a transform with its own twiddle table.
    ///
    /// Prefer [`FftCache::fft`] when several components use the same length.
    pub fn new(size: usize) -> Self {
        Self::with_plan(size, Arc::new(FftPlan::new(size)))
    }

    fn with_plan(size: usize, plan: Arc<FftPlan>) -> Self {
        debug_assert!(plan.fft_size() >= size);
        Self {
            size,
            scratch: vec![ZERO; plan.fft_size()],
            plan,
        }
    }

    /// Logical length (bins written per transform).
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Internal power-of-two length.
    #[inline]
    pub fn fft_size(&self) -> usize {
        self.plan.fft_size()
    }

    /// Shared twiddle table.
    pub fn plan(&self) -> &Arc<FftPlan> {
        &self.plan
    }

    /// Forward transform of the first `size` samples of `input`.
    ///
    /// Writes `min(size, output.len())` bins.
    pub fn transform<I: FftInput + ?Sized>(&mut self, input: &I, output: &mut [Complex32]) {
        let len = input.input_len().min(self.size);
        let read = |i: usize| if i < len { input.sample(i) } else { ZERO };
        self.run(&read, output, false);
    }

    /// Inverse transform via the conjugation identity.
    ///
    /// Writes `min(size, output.len())` samples.
    pub fn inverse_transform<I: FftInput + ?Sized>(
        &mut self,
        input: &I,
        output: &mut [Complex32],
    ) {
        let len = input.input_len().min(self.size);
        let read = |i: usize| {
            if i < len {
                input.sample(i).conj()
            } else {
                ZERO
            }
        };
        self.run(&read, output, true);
    }

    fn run<F: Fn(usize) -> Complex32>(&mut self, read: &F, output: &mut [Complex32], conjugate: bool) {
        transform_rec(self.plan.roots(), read, 0, 1, &mut self.scratch);

        let scale = self.plan.scale;
        let count = self.size.min(output.len());
        for (out, bin) in output[..count].iter_mut().zip(&self.scratch) {
            let value = *bin * scale;
            *out = if conjugate { value.conj() } else { value };
        }
    }
}

/// Radix-2 decimation in time. `out.len()` is the current sub-transform length
/// and `stride` the distance between its input samples.
fn transform_rec<F: Fn(usize) -> Complex32>(
    roots: &[Complex32],
    read: &F,
    offset: usize,
    stride: usize,
    out: &mut [Complex32],
) {
    let n = out.len();
    if n == 1 {
        out[0] = read(offset);
        return;
    }

    let half = n / 2;
    let (even, odd) = out.split_at_mut(half);
    transform_rec(roots, read, offset, stride * 2, even);
    transform_rec(roots, read, offset + stride, stride * 2, odd);

    for k in 0..half {
        let e = even[k];
        let o = odd[k] * roots[k * stride];
        even[k] = e + o;
        odd[k] = e - o;
    }
}

/// Twiddle tables keyed by power-of-two length.
///
/// Owned by whoever assembles a processing pipeline and lent to constructors.
/// Transforms handed out share roots but never scratch.
#[derive(Debug, Default)]
pub struct FftCache {
    plans: HashMap<usize, Arc<FftPlan>>,
}

impl FftCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared plan covering `size`.
    pub fn plan(&mut self, size: usize) -> Arc<FftPlan> {
        let fft_size = next_power_of_two(size);
        Arc::clone(self.plans.entry(fft_size).or_insert_with(|| {
            tracing::debug!(fft_size, "building FFT plan");
            Arc::new(FftPlan::new(fft_size))
        }))
    }

    /// Transform of logical length `size` with fresh scratch.
    pub fn fft(&mut self, size: usize) -> Fft {
        Fft::with_plan(size, self.plan(size))
    }

    /// Number of distinct plans held.
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}
