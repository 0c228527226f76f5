//! Heap-ordered phase propagation for the "done right" phase vocoder.
//!
//! ## Algorithm Overview
//!
//! Phase-gradient heap integration: instead of advancing every bin's phase
//! independently through time, the strongest bins are fixed first and their
//! phase is spread to weaker neighbours along the frequency axis.
//!
//! 1. **Gradients**: the time gradient is the usual per-bin phase advance.
//!    The frequency gradient of the new frame is the centered average of the
//!    wrapped neighbour deltas, one-sided at the edges.
//! 2. **Seed**: a max-heap holds every bin of the previous frame, keyed on
//!    squared magnitude.
//! 3. **Pop a previous-frame bin `i`**: if bin `i` of the new frame has no
//!    phase yet, integrate it through time and push it.
//! 4. **Pop a new-frame bin `i`**: give each unassigned neighbour `j = i ± 1`
//!    the phase `new[i] ± ½(fd[i] + fd[j])·stretch` and push it.
//!
//! Bins quieter than `1e-3` of the loudest bin (in amplitude) never receive a
//! phase and are synthesized at phase zero.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use warble_core::math::wrap_phase;

/// Relative amplitude below which a bin is left unassigned.
const TOLERANCE: f32 = 1e-3;

/// Which frame a heap entry refers to. `Prev` ranks above `Next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Frame {
    Next,
    Prev,
}

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    mag2: f32,
    frame: Frame,
    bin: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    /// Louder first, then `Prev` before `Next`, then the lower bin.
    fn cmp(&self, other: &Self) -> Ordering {
        self.mag2
            .total_cmp(&other.mag2)
            .then(self.frame.cmp(&other.frame))
            .then(other.bin.cmp(&self.bin))
    }
}

/// Reusable heap and scratch for [`PhasePropagator::propagate`].
#[derive(Debug, Clone)]
pub struct PhasePropagator {
    heap: BinaryHeap<HeapEntry>,
    receivable: Vec<bool>,
    freq_deltas: Vec<f32>,
}

impl PhasePropagator {
    /// Scratch for frames of `bins` bins.
    pub fn new(bins: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(2 * bins),
            receivable: vec![false; bins],
            freq_deltas: vec![0.0; bins],
        }
    }

    pub fn bins(&self) -> usize {
        self.receivable.len()
    }

    /// Synthesis phases of the new frame.
    ///
    /// * `prev_mag2`/`next_mag2` - squared magnitudes of the previous and new frame
    /// * `next_phase` - analysis phases of the new frame
    /// * `last_out` - synthesis phases written for the previous frame
    /// * `time_deltas` - unwrapped per-bin phase advance between the frames
    /// * `stretch` - synthesis hop over analysis hop
    ///
    /// All slices must hold at least [`bins`](Self::bins) values.
    #[allow(clippy::too_many_arguments)]
    pub fn propagate(
        &mut self,
        prev_mag2: &[f32],
        next_mag2: &[f32],
        next_phase: &[f32],
        last_out: &[f32],
        time_deltas: &[f32],
        stretch: f32,
        out: &mut [f32],
    ) {
        let bins = self.bins();
        let out = &mut out[..bins];
        out.fill(0.0);

        self.frequency_gradient(&next_phase[..bins]);

        let loudest = prev_mag2[..bins]
            .iter()
            .chain(&next_mag2[..bins])
            .fold(0.0f32, |max, &m| max.max(m));
        let abs_tol = TOLERANCE * TOLERANCE * loudest;

        let mut remaining = 0;
        for (receivable, &mag2) in self.receivable.iter_mut().zip(&next_mag2[..bins]) {
            *receivable = mag2 >= abs_tol && mag2 > 0.0;
            remaining += usize::from(*receivable);
        }

        self.heap.clear();
        self.heap.extend(prev_mag2[..bins].iter().enumerate().map(|(bin, &mag2)| HeapEntry {
            mag2,
            frame: Frame::Prev,
            bin,
        }));

        while remaining > 0 {
            let Some(entry) = self.heap.pop() else {
                break;
            };
            let i = entry.bin;

            match entry.frame {
                Frame::Prev => {
                    if self.receivable[i] {
                        out[i] = last_out[i] + time_deltas[i] * stretch;
                        self.receivable[i] = false;
                        remaining -= 1;
                        self.push_next(i, next_mag2);
                    }
                }
                Frame::Next => {
                    if i > 0 && self.receivable[i - 1] {
                        let j = i - 1;
                        out[j] = out[i] - 0.5 * (self.freq_deltas[i] + self.freq_deltas[j]) * stretch;
                        self.receivable[j] = false;
                        remaining -= 1;
                        self.push_next(j, next_mag2);
                    }
                    if i + 1 < bins && self.receivable[i + 1] {
                        let j = i + 1;
                        out[j] = out[i] + 0.5 * (self.freq_deltas[i] + self.freq_deltas[j]) * stretch;
                        self.receivable[j] = false;
                        remaining -= 1;
                        self.push_next(j, next_mag2);
                    }
                }
            }
        }
    }

    fn push_next(&mut self, bin: usize, next_mag2: &[f32]) {
        self.heap.push(HeapEntry {
            mag2: next_mag2[bin],
            frame: Frame::Next,
            bin,
        });
    }

    fn frequency_gradient(&mut self, phase: &[f32]) {
        let bins = phase.len();
        if bins < 2 {
            self.freq_deltas.fill(0.0);
            return;
        }

        let delta = |k: usize| wrap_phase(phase[k + 1] - phase[k]);
        self.freq_deltas[0] = delta(0);
        self.freq_deltas[bins - 1] = delta(bins - 2);
        for i in 1..bins - 1 {
            self.freq_deltas[i] = 0.5 * (delta(i - 1) + delta(i));
        }
    }
}
