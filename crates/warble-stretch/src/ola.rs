//! Synchronized overlap-add (SOLA).
//!
//! ## Algorithm Overview
//!
//! Each iteration copies `window + selection` raw samples, finds the offset in
//! `[0, selection)` whose head best matches the tail already emitted
//! (correlation weighted towards the middle of the overlap), cross-fades the
//! tail into that offset and appends the rest of the window. The raw read
//! position then advances by `(window - overlap) / stretch`. At unity stretch
//! the search is skipped and offset 0 is used.
//!
//! ## RT-Safety
//!
//! The copy and tail scratch are sized at construction. Only the ring buffers
//! grow, up to the stream's high-water mark.

use warble_core::correlation::find_max_correlation_quad;
use warble_core::window::{hann_window, mix_and_extend};
use warble_core::{drain_ready, Effect, PropertyDesc, PropertyPayload, Result, RingBuffer};

use crate::config::OlaConfig;
use crate::types::{HopAccumulator, StretchFactor, TimeStretcher};

/// Overlap-add time-stretcher with a correlation-searched splice point.
#[derive(Debug, Clone)]
pub struct OlaStretcher {
    window_size: usize,
    overlap: usize,
    selection: usize,

    stretch: StretchFactor,
    hops: HopAccumulator,

    raw: RingBuffer<f32>,
    transformed: RingBuffer<f32>,

    // Pre-allocated scratch
    frame: Vec<f32>,
    tail: Vec<f32>,
}

impl OlaStretcher {
    pub fn new(config: OlaConfig) -> Result<Self> {
        config.validate()?;

        let window_size = config.window_size;
        let overlap = config.overlap();
        let selection = config.selection();
        tracing::debug!(window_size, overlap, selection, "creating OLA stretcher");

        Ok(Self {
            window_size,
            overlap,
            selection,
            stretch: StretchFactor::default(),
            hops: HopAccumulator::new(),
            raw: RingBuffer::with_capacity(2 * (window_size + selection)),
            transformed: RingBuffer::from_value(window_size, 0.0),
            frame: vec![0.0; window_size + selection],
            tail: vec![0.0; overlap],
        })
    }

    /// Nominal raw advance per iteration.
    fn skip(&self) -> f32 {
        (self.window_size - self.overlap) as f32 / self.stretch.get()
    }

    fn process_window(&mut self) {
        let nominal = self.skip();
        let skip = self.hops.next(nominal);

        self.raw.to_slice(&mut self.frame, self.window_size + self.selection);
        self.transformed.to_slice_back(&mut self.tail, self.overlap);

        // At unity the raw cursor already sits on the exact continuation.
        let offset = if self.stretch.get() == 1.0 {
            0
        } else {
            find_max_correlation_quad(&self.tail, &self.frame, self.overlap, self.selection)
        };
        mix_and_extend(
            &mut self.transformed,
            &self.frame[offset..offset + self.window_size],
            self.overlap,
            hann_window,
        );

        self.raw.pop_front_many(None, skip);
    }
}

impl Effect for OlaStretcher {
    fn push_signal(&mut self, input: &[f32]) {
        self.raw.extend_back(input);
    }

    fn pop_transformed_signal(&mut self, output: &mut [f32]) -> usize {
        let required = (self.skip().ceil() as usize).max(self.window_size + self.selection);
        while self.n_transformed_ready() < output.len() && self.raw.len() > required {
            self.process_window();
        }

        let ready = self.n_transformed_ready();
        drain_ready(&mut self.transformed, ready, output)
    }

    /// The last `overlap` samples wait for the next cross-fade.
    fn n_transformed_ready(&self) -> usize {
        self.transformed.len().saturating_sub(self.overlap)
    }

    fn reset(&mut self) {
        self.raw.clear();
        self.transformed.clear();
        self.transformed.resize(self.window_size);
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
        self.window_size - self.overlap
    }

    fn name(&self) -> &'static str {
        "OLA Time Stretcher"
    }
}

impl TimeStretcher for OlaStretcher {
    fn set_stretch_factor(&mut self, factor: f32) {
        self.stretch = StretchFactor::new(factor);
    }

    fn stretch_factor(&self) -> f32 {
        self.stretch.get()
    }
}
