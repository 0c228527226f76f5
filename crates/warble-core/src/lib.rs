//! Streaming DSP kernel for pitch and formant effects.
//!
//! # Primary API
//!
//! - [`RingBuffer`]: growable double-ended buffer every effect streams through
//! - [`Fft`] / [`FftCache`]: radix-2 transform with shared twiddle tables
//! - [`Lpc`]: spectral envelope and residual of one window
//! - [`solve_sym_toeplitz`] / [`ToeplitzSolver`]: Levinson recursion
//! - [`Effect`] / [`EffectChain`]: push/pop streaming protocol with properties
//!
//! # Example
//!
//! ```
//! use warble_core::{FftCache, Lpc};
//!
//! let mut cache = FftCache::new();
//! let mut lpc = Lpc::new(512, 16, &mut cache)?;
//!
//! let window: Vec<f32> = (0..512).map(|i| (i as f32 * 0.3).sin()).collect();
//! lpc.load_sample(&window[..])?;
//! assert_eq!(lpc.envelope().len(), 512);
//! # Ok::<(), warble_core::Error>(())
//! ```

pub mod correlation;
pub mod effect;
pub mod error;
pub mod fft;
pub mod linalg;
pub mod lpc;
pub mod math;
pub mod property;
pub mod ring_buffer;
pub mod window;

pub use effect::{drain_ready, Effect, EffectChain};
pub use error::{Error, Result};
pub use fft::{Complex32, Fft, FftCache, FftInput, FftPlan};
pub use linalg::{solve_sym_toeplitz, ToeplitzSolver};
pub use lpc::Lpc;
pub use property::{PropertyDesc, PropertyKind, PropertyPayload, PropertyRange, PropertyScale};
pub use ring_buffer::RingBuffer;
pub use window::{hamming_window, hann_window, WindowFn};
