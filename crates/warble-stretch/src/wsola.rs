//! Waveform-similarity overlap-add (WSOLA).
//!
//! ## Algorithm Overview
//!
//! Input is processed in blocks of `block_size` samples. Within a block, two
//! cursors walk forward:
//!
//! - `last`: where the previously emitted material would naturally continue
//! - `next`: where the next window nominally starts (advancing by
//!   `(window - overlap) / stretch`)
//!
//! For each window the search finds how far past `last` the continuation best
//! matches the head of the next window. Material before that point is emitted
//! as is, the matched region is cross-faded (Hamming) into the next window, and
//! the flat middle of the window follows. The block then consumes
//! `min(last, next)` raw samples.
//!
//! ## RT-Safety
//!
//! Block and overlap scratch are sized at construction.

use warble_core::correlation::find_max_correlation;
use warble_core::window::{hamming_window, overlap_add};
use warble_core::{drain_ready, Effect, PropertyDesc, PropertyPayload, Result, RingBuffer};

use crate::config::WsolaConfig;
use crate::types::{HopAccumulator, StretchFactor, TimeStretcher};

/// WSOLA time-stretcher.
#[derive(Debug, Clone)]
pub struct WsolaStretcher {
    block_size: usize,
    window_size: usize,
    overlap: usize,
    search: usize,
    flat: usize,

    stretch: StretchFactor,
    hops: HopAccumulator,

    raw: RingBuffer<f32>,
    transformed: RingBuffer<f32>,

    // Cursors into the current block
    last_overlap: usize,
    next_overlap: usize,

    // Pre-allocated scratch
    block: Vec<f32>,
    mixed: Vec<f32>,
}

impl WsolaStretcher {
    pub fn new(config: WsolaConfig) -> Result<Self> {
        config.validate()?;

        tracing::debug!(
            block_size = config.block_size,
            window_size = config.window_size,
            overlap = config.overlap(),
            search = config.search(),
            "creating WSOLA stretcher"
        );

        Ok(Self {
            block_size: config.block_size,
            window_size: config.window_size,
            overlap: config.overlap(),
            search: config.search(),
            flat: config.flat(),
            stretch: StretchFactor::default(),
            hops: HopAccumulator::new(),
            raw: RingBuffer::with_capacity(2 * config.block_size),
            transformed: RingBuffer::with_capacity(2 * config.block_size),
            last_overlap: 0,
            next_overlap: 0,
            block: vec![0.0; config.block_size],
            mixed: vec![0.0; config.overlap()],
        })
    }

    /// Stretch the block into the output. Returns how many raw samples are
    /// no longer needed.
    fn stretch_block(&mut self) -> usize {
        let skip = (self.window_size - self.overlap) as f32 / self.stretch.get();
        // At unity `last` and `next` coincide, so the window continues in place.
        let unity = self.stretch.get() == 1.0;

        while self.next_overlap + self.window_size < self.block_size {
            let last = self.last_overlap;
            let next = self.next_overlap;

            let lead_in = if unity {
                0
            } else {
                find_max_correlation(
                    &self.block[next..],
                    &self.block[last..],
                    self.overlap,
                    self.search,
                )
            };
            let matched = last + lead_in;
            let overlapped = self.overlap - lead_in;

            overlap_add(
                &self.block[matched..matched + overlapped],
                &self.block[next..next + overlapped],
                &mut self.mixed[..overlapped],
                hamming_window,
            );

            self.transformed.extend_back(&self.block[last..matched]);
            self.transformed.extend_back(&self.mixed[..overlapped]);
            let flat_start = next + overlapped;
            self.transformed
                .extend_back(&self.block[flat_start..flat_start + self.flat]);

            self.last_overlap = flat_start + self.flat;
            self.next_overlap = next + self.hops.next(skip);
        }

        self.last_overlap.min(self.next_overlap)
    }
}

impl Effect for WsolaStretcher {
    fn push_signal(&mut self, input: &[f32]) {
        self.raw.extend_back(input);
    }

    fn pop_transformed_signal(&mut self, output: &mut [f32]) -> usize {
        while self.raw.len() > self.block_size && self.n_transformed_ready() < output.len() {
            self.raw.to_slice(&mut self.block, self.block_size);

            let used = self.stretch_block();
            self.raw.pop_front_many(None, used);
            self.last_overlap -= used;
            self.next_overlap -= used;
        }

        let ready = self.n_transformed_ready();
        drain_ready(&mut self.transformed, ready, output)
    }

    fn n_transformed_ready(&self) -> usize {
        self.transformed.len()
    }

    fn reset(&mut self) {
        self.raw.clear();
        self.transformed.clear();
        self.last_overlap = 0;
        self.next_overlap = 0;
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

    fn name(&self) -> &'static str {
        "WSOLA Time Stretcher"
    }
}

impl TimeStretcher for WsolaStretcher {
    fn set_stretch_factor(&mut self, factor: f32) {
        self.stretch = StretchFactor::new(factor);
    }

    fn stretch_factor(&self) -> f32 {
        self.stretch.get()
    }
}
