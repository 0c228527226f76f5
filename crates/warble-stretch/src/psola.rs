//! Pitch-synchronous overlap-add (PSOLA).
//!
//! ## Algorithm Overview
//!
//! 1. **Pitch**: the block, with Hann-tapered ends, goes through LPC. The
//!    fundamental is the bin in the configured pitch range with the largest
//!    summation of residual harmonics, and the period is `block / bin`.
//! 2. **Peaks**: starting at the block head, each next peak is the largest
//!    positive sample between 0.8 and 1.2 periods after the previous one.
//! 3. **Split**: the span between consecutive peaks is split into a falling
//!    right half `(1 - w)·x` and a rising left half `w·x`, `w` a Hann ramp.
//! 4. **Reassemble**: right halves are appended and left halves overlap them
//!    by `(2 - stretch)·period`, so each period occupies `stretch·period`
//!    output samples. Below unity the left half reaches back past the right
//!    half and the next right half overlaps it in turn.
//! 5. The block consumes up to its last peak, so the next block starts on one.
//!
//! Periods are respaced rather than duplicated: the output keeps each period's
//! waveform (and so its formants) but the pitch scales by `1 / stretch`.
//! Resampling the result by `stretch` restores pitch and duration and moves
//! the formants, which is how the engine uses it as a formant stage.
//!
//! At unity stretch both halves land on the same samples and sum back to the
//! input.
//!
//! ## RT-Safety
//!
//! Block, peak and half-period scratch are sized at construction.

use warble_core::correlation::srh_argmax;
use warble_core::window::{add_and_extend, hann_window, window_ends};
use warble_core::{
    drain_ready, Effect, FftCache, Lpc, PropertyDesc, PropertyPayload, Result, RingBuffer,
};

use crate::config::PsolaConfig;
use crate::types::{HopAccumulator, StretchFactor, TimeStretcher};

/// PSOLA time-stretcher.
#[derive(Debug, Clone)]
pub struct PsolaStretcher {
    block_size: usize,
    min_bin: usize,
    max_bin: usize,
    harmonics: usize,
    held_back: usize,

    stretch: StretchFactor,
    hops: HopAccumulator,

    raw: RingBuffer<f32>,
    transformed: RingBuffer<f32>,
    next_right_overlap: usize,

    lpc: Lpc,

    // Pre-allocated scratch
    block: Vec<f32>,
    windowed: Vec<f32>,
    peaks: Vec<usize>,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl PsolaStretcher {
    pub fn new(config: PsolaConfig, cache: &mut FftCache) -> Result<Self> {
        config.validate()?;

        let block_size = config.block_size;
        let held_back = config.held_back();
        tracing::debug!(
            block_size,
            lpc_order = config.lpc_order,
            min_bin = config.min_bin(),
            max_bin = config.max_bin(),
            held_back,
            "creating PSOLA stretcher"
        );

        Ok(Self {
            block_size,
            min_bin: config.min_bin(),
            max_bin: config.max_bin(),
            harmonics: config.harmonics,
            held_back,
            stretch: StretchFactor::default(),
            hops: HopAccumulator::new(),
            raw: RingBuffer::with_capacity(2 * block_size),
            transformed: RingBuffer::from_value(held_back, 0.0),
            next_right_overlap: 0,
            lpc: Lpc::new(block_size, config.lpc_order, cache)?,
            block: vec![0.0; block_size],
            windowed: vec![0.0; block_size],
            peaks: Vec::with_capacity(block_size),
            left: vec![0.0; block_size],
            right: vec![0.0; block_size],
        })
    }

    /// Estimated pitch period of the current block, in samples.
    fn estimate_period(&mut self) -> usize {
        self.windowed.copy_from_slice(&self.block);
        window_ends(&mut self.windowed, self.block_size / 10, hann_window);

        if let Err(err) = self.lpc.load_sample(&self.windowed[..]) {
            tracing::trace!(%err, "degenerate PSOLA block");
        }

        let bin = srh_argmax(
            self.lpc.residual(),
            self.block_size / 2,
            self.min_bin,
            self.max_bin,
            self.harmonics,
        );
        self.block_size / bin.max(1)
    }

    fn find_peaks(&mut self, period: usize) {
        let search_start = ((0.8 * period as f32) as usize).max(1);
        let search_end = (1.2 * period as f32) as usize;

        self.peaks.clear();
        let mut last = 0;
        while last + period < self.block_size {
            let from = last + search_start;
            let to = (last + search_end).min(self.block_size);

            let mut peak = from;
            let mut height = 0.0;
            for (i, &sample) in self.block.iter().enumerate().take(to).skip(from) {
                if sample > height {
                    height = sample;
                    peak = i;
                }
            }

            self.peaks.push(peak);
            last = peak;
        }
    }

    fn stretch_peaks(&mut self) {
        let stretch = self.stretch.get();

        let mut last = 0;
        for k in 0..self.peaks.len() {
            let next = self.peaks[k];
            let period = next - last;

            for (j, &sample) in self.block[last..next].iter().enumerate() {
                let w = hann_window(j as f32 / period as f32);
                self.left[j] = w * sample;
                self.right[j] = (1.0 - w) * sample;
            }
            let left = &self.left[..period];
            let right = &self.right[..period];

            // Continue from where the previous left half ended.
            add_and_extend(&mut self.transformed, right, self.next_right_overlap);

            let overlap = self.hops.next((2.0 - stretch) * period as f32);
            if stretch >= 1.0 {
                if stretch > 2.0 {
                    let len = self.transformed.len();
                    self.transformed.resize_with_value(len + overlap, 0.0);
                    self.transformed.extend_back(left);
                } else {
                    add_and_extend(&mut self.transformed, left, overlap);
                }
                self.next_right_overlap = 0;
            } else {
                add_and_extend(&mut self.transformed, left, overlap);
                self.next_right_overlap = overlap.saturating_sub(period);
            }

            last = next;
        }
    }
}

impl Effect for PsolaStretcher {
    fn push_signal(&mut self, input: &[f32]) {
        self.raw.extend_back(input);
    }

    fn pop_transformed_signal(&mut self, output: &mut [f32]) -> usize {
        while self.raw.len() > self.block_size && self.n_transformed_ready() < output.len() {
            self.raw.to_slice(&mut self.block, self.block_size);

            let period = self.estimate_period();
            self.find_peaks(period);
            self.stretch_peaks();

            let consumed = self.peaks.last().copied().unwrap_or(self.block_size);
            self.raw.pop_front_many(None, consumed);
        }

        let ready = self.n_transformed_ready();
        drain_ready(&mut self.transformed, ready, output)
    }

    /// Output within `held_back` samples of the end may still receive overlaps.
    fn n_transformed_ready(&self) -> usize {
        self.transformed.len().saturating_sub(self.held_back)
    }

    fn reset(&mut self) {
        self.raw.clear();
        self.transformed.clear();
        self.transformed.resize(self.held_back);
        self.next_right_overlap = 0;
        self.hops.reset();
    }

    fn property_descs(&self) -> Vec<PropertyDesc> {
        vec![StretchFactor::descriptor()]
    }

    fn set_property(&mut self, id: usize, payload: PropertyPayload) {
        if id == 0 {
            if let Some(factor) = StretchFactor::from_payload(payload) {
                self.stretch = factor;
            }
        }
    }

    fn property(&self, id: usize) -> PropertyPayload {
        match id {
            0 => self.stretch.payload(),
            _ => PropertyPayload::default(),
        }
    }

    fn latency_samples(&self) -> usize {
        self.held_back
    }

    fn name(&self) -> &'static str {
        "PSOLA Time Stretcher"
    }
}

impl TimeStretcher for PsolaStretcher {
    fn set_stretch_factor(&mut self, factor: f32) {
        self.stretch = StretchFactor::new(factor);
    }

    fn stretch_factor(&self) -> f32 {
        self.stretch.get()
    }
}
