//! Streaming effect protocol.
//!
//! An [`Effect`] buffers whatever the caller pushes and transforms it lazily
//! when output is requested:
//!
//! ```text
//! push_signal(chunk) ──► raw buffer ──► (windows run on pop) ──► output buffer ──► pop_transformed_signal(out)
//! ```
//!
//! Pops never block and never over-deliver. A pop that returns fewer samples
//! than requested means the effect is starved and needs more input.

use dyn_clone::DynClone;

use crate::property::{PropertyDesc, PropertyPayload};
use crate::ring_buffer::RingBuffer;

/// A push/pull audio transform with runtime-adjustable properties.
///
/// Boxed effects are cloneable, so one configured instance can be duplicated
/// per channel.
pub trait Effect: Send + DynClone {
    /// Buffer input. Never transforms anything.
    fn push_signal(&mut self, input: &[f32]);

    /// Fill `output` with transformed samples, running as many analysis
    /// windows as the buffered input allows.
    ///
    /// Returns the number of samples written, at most `output.len()`. The
    /// unwritten tail of `output` is zeroed.
    fn pop_transformed_signal(&mut self, output: &mut [f32]) -> usize;

    /// Samples a pop can deliver without pushing more input.
    fn n_transformed_ready(&self) -> usize;

    /// Drop all buffered input, output and analysis state.
    fn reset(&mut self);

    /// Controls exposed to a host. Index 0 is the primary factor.
    fn property_descs(&self) -> Vec<PropertyDesc>;

    /// Update a property. Unknown ids and payloads of the wrong kind are ignored.
    fn set_property(&mut self, id: usize, payload: PropertyPayload);

    /// Current value of a property, or `PropertyPayload::default()` for unknown ids.
    fn property(&self, id: usize) -> PropertyPayload;

    /// Constant delay, in samples, between input and output at unity factor.
    fn latency_samples(&self) -> usize {
        0
    }

    /// Size internal scratch for pops of up to `block_size` samples. Call
    /// outside the audio callback; pops themselves never grow scratch.
    fn reserve(&mut self, _block_size: usize) {}

    fn name(&self) -> &'static str;
}

dyn_clone::clone_trait_object!(Effect);

/// Pop from an output buffer into `output`, zeroing whatever is left over.
///
/// Shared tail of every built-in effect's `pop_transformed_signal`.
pub fn drain_ready(buffer: &mut RingBuffer<f32>, ready: usize, output: &mut [f32]) -> usize {
    let produced = buffer.pop_front_many(Some(output), ready);
    output[produced..].fill(0.0);
    produced
}

/// Effects run in series.
///
/// Pushed input feeds the first stage. Each pop pulls every stage into the next
/// through a scratch buffer, then pops the last one. With no stages the chain
/// passes input through unchanged.
///
/// Properties are flattened: the first stage's ids come first, followed by the
/// second stage's, and so on.
///
/// # Example
///
/// ```ignore
/// let mut chain = EffectChain::new()
///     .with_stage(Box::new(formant_shifter))
///     .with_stage(Box::new(pitch_shifter));
///
/// chain.push_signal(&input);
/// let produced = chain.pop_transformed_signal(&mut output);
/// ```
#[derive(Clone)]
pub struct EffectChain {
    stages: Vec<Box<dyn Effect>>,
    scratch: Vec<f32>,
    bypass: RingBuffer<f32>,
}

impl Default for EffectChain {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectChain {
    /// Inter-stage scratch length before any [`reserve`](Effect::reserve).
    pub const DEFAULT_SCRATCH: usize = 1024;

    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            scratch: vec![0.0; Self::DEFAULT_SCRATCH],
            bypass: RingBuffer::new(),
        }
    }

    /// Append a stage (builder style).
    pub fn with_stage(mut self, stage: Box<dyn Effect>) -> Self {
        self.push(stage);
        self
    }

    /// Append a stage.
    pub fn push(&mut self, stage: Box<dyn Effect>) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage(&self, index: usize) -> Option<&dyn Effect> {
        self.stages.get(index).map(|stage| &**stage)
    }

    pub fn stage_mut(&mut self, index: usize) -> Option<&mut Box<dyn Effect>> {
        self.stages.get_mut(index)
    }

    /// Map a flattened property id to `(stage, local id)`.
    fn locate(&self, id: usize) -> Option<(usize, usize)> {
        let mut offset = 0;
        for (index, stage) in self.stages.iter().enumerate() {
            let count = stage.property_descs().len();
            if id < offset + count {
                return Some((index, id - offset));
            }
            offset += count;
        }
        None
    }
}

impl std::fmt::Debug for EffectChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectChain")
            .field(
                "stages",
                &self.stages.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Effect for EffectChain {
    fn push_signal(&mut self, input: &[f32]) {
        match self.stages.first_mut() {
            Some(first) => first.push_signal(input),
            None => self.bypass.extend_back(input),
        }
    }

    fn pop_transformed_signal(&mut self, output: &mut [f32]) -> usize {
        let Some(last) = self.stages.len().checked_sub(1) else {
            let ready = self.bypass.len();
            return drain_ready(&mut self.bypass, ready, output);
        };

        // Each stage hands on up to `n` samples, a scratch-full at a time.
        let n = output.len();
        for i in 0..last {
            let mut moved = 0;
            while moved < n {
                let want = (n - moved).min(self.scratch.len());
                let produced = self.stages[i].pop_transformed_signal(&mut self.scratch[..want]);
                self.stages[i + 1].push_signal(&self.scratch[..produced]);
                moved += produced;
                if produced < want {
                    break;
                }
            }
        }
        self.stages[last].pop_transformed_signal(output)
    }

    fn n_transformed_ready(&self) -> usize {
        match self.stages.last() {
            Some(last) => last.n_transformed_ready(),
            None => self.bypass.len(),
        }
    }

    fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
        self.bypass.clear();
    }

    fn property_descs(&self) -> Vec<PropertyDesc> {
        let mut descs = Vec::new();
        for stage in &self.stages {
            for mut desc in stage.property_descs() {
                desc.index = descs.len();
                descs.push(desc);
            }
        }
        descs
    }

    fn set_property(&mut self, id: usize, payload: PropertyPayload) {
        if let Some((stage, local)) = self.locate(id) {
            self.stages[stage].set_property(local, payload);
        }
    }

    fn property(&self, id: usize) -> PropertyPayload {
        match self.locate(id) {
            Some((stage, local)) => self.stages[stage].property(local),
            None => PropertyPayload::default(),
        }
    }

    fn latency_samples(&self) -> usize {
        self.stages.iter().map(|stage| stage.latency_samples()).sum()
    }

    fn reserve(&mut self, block_size: usize) {
        if self.scratch.len() < block_size {
            self.scratch.resize(block_size, 0.0);
        }
        if self.stages.is_empty() {
            self.bypass.reserve(block_size);
        }
        for stage in &mut self.stages {
            stage.reserve(block_size);
        }
    }

    fn name(&self) -> &'static str {
        "Effect Chain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyRange;

    /// Scales its input by a gain, delivering everything immediately.
    #[derive(Clone)]
    struct Gain {
        gain: f32,
        buffer: RingBuffer<f32>,
    }

    impl Gain {
        fn new(gain: f32) -> Self {
            Self {
                gain,
                buffer: RingBuffer::new(),
            }
        }
    }

    impl Effect for Gain {
        fn push_signal(&mut self, input: &[f32]) {
            for &sample in input {
                self.buffer.push_back(sample * self.gain);
            }
        }

        fn pop_transformed_signal(&mut self, output: &mut [f32]) -> usize {
            let ready = self.buffer.len();
            drain_ready(&mut self.buffer, ready, output)
        }

        fn n_transformed_ready(&self) -> usize {
            self.buffer.len()
        }

        fn reset(&mut self) {
            self.buffer.clear();
        }

        fn property_descs(&self) -> Vec<PropertyDesc> {
            vec![PropertyDesc::slider(
                0,
                "Gain",
                "Linear gain",
                PropertyRange::linear(0.0, 4.0, 1.0),
            )]
        }

        fn set_property(&mut self, id: usize, payload: PropertyPayload) {
            if let (0, PropertyPayload::Slider(gain)) = (id, payload) {
                self.gain = gain.clamp(0.0, 4.0);
            }
        }

        fn property(&self, id: usize) -> PropertyPayload {
            match id {
                0 => PropertyPayload::Slider(self.gain),
                _ => PropertyPayload::default(),
            }
        }

        fn latency_samples(&self) -> usize {
            3
        }

        fn name(&self) -> &'static str {
            "Gain"
        }
    }

    #[test]
    fn test_empty_chain_passes_through() {
        let mut chain = EffectChain::new();
        chain.push_signal(&[1.0, 2.0, 3.0]);
        assert_eq!(chain.n_transformed_ready(), 3);

        let mut out = [9.0; 5];
        assert_eq!(chain.pop_transformed_signal(&mut out), 3);
        assert_eq!(out, [1.0, 2.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_stages_run_in_series() {
        let mut chain = EffectChain::new()
            .with_stage(Box::new(Gain::new(2.0)))
            .with_stage(Box::new(Gain::new(3.0)));

        chain.push_signal(&[1.0, -1.0]);
        let mut out = [0.0; 2];
        assert_eq!(chain.pop_transformed_signal(&mut out), 2);
        assert_eq!(out, [6.0, -6.0]);
        assert_eq!(chain.latency_samples(), 6);
    }

    #[test]
    fn test_short_pop_keeps_remainder_buffered() {
        let mut chain = EffectChain::new()
            .with_stage(Box::new(Gain::new(1.0)))
            .with_stage(Box::new(Gain::new(1.0)));

        chain.push_signal(&[1.0, 2.0, 3.0, 4.0]);
        let mut out = [0.0; 4];
        assert_eq!(chain.pop_transformed_signal(&mut out[..2]), 2);
        assert_eq!(chain.pop_transformed_signal(&mut out), 2);
        assert_eq!(out, [3.0, 4.0, 0.0, 0.0]);
    }

    #[test]
    fn test_large_pop_reuses_scratch() {
        let mut chain = EffectChain::new()
            .with_stage(Box::new(Gain::new(1.0)))
            .with_stage(Box::new(Gain::new(2.0)));
        let input: Vec<f32> = (0..5000).map(|i| i as f32).collect();
        chain.push_signal(&input);

        let mut out = vec![0.0; 5000];
        assert_eq!(chain.pop_transformed_signal(&mut out), 5000);
        assert_eq!(chain.scratch.len(), EffectChain::DEFAULT_SCRATCH);
        assert!(out.iter().zip(&input).all(|(&got, &x)| got == 2.0 * x));
    }

    #[test]
    fn test_reserve_grows_scratch() {
        let mut chain = EffectChain::new().with_stage(Box::new(Gain::new(1.0)));
        chain.reserve(64);
        assert_eq!(chain.scratch.len(), EffectChain::DEFAULT_SCRATCH);

        chain.reserve(4096);
        assert_eq!(chain.scratch.len(), 4096);
    }

    #[test]
    fn test_properties_are_flattened() {
        let mut chain = EffectChain::new()
            .with_stage(Box::new(Gain::new(1.0)))
            .with_stage(Box::new(Gain::new(1.0)));

        let descs = chain.property_descs();
        assert_eq!(descs.len(), 2);
        assert_eq!(descs[1].index, 1);

        chain.set_property(1, PropertyPayload::Slider(2.5));
        assert_eq!(chain.property(0), PropertyPayload::Slider(1.0));
        assert_eq!(chain.property(1), PropertyPayload::Slider(2.5));
        assert_eq!(chain.property(7), PropertyPayload::default());

        // Wrong payload kind is ignored.
        chain.set_property(0, PropertyPayload::Toggle(true));
        assert_eq!(chain.property(0), PropertyPayload::Slider(1.0));
    }

    #[test]
    fn test_reset_clears_every_stage() {
        let mut chain = EffectChain::new().with_stage(Box::new(Gain::new(1.0)));
        chain.push_signal(&[1.0; 8]);
        chain.reset();
        assert_eq!(chain.n_transformed_ready(), 0);

        let mut out = [1.0; 4];
        assert_eq!(chain.pop_transformed_signal(&mut out), 0);
        assert_eq!(out, [0.0; 4]);
    }

    #[test]
    fn test_stage_access() {
        let mut chain = EffectChain::new().with_stage(Box::new(Gain::new(1.0)));
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.stage(0).map(|s| s.name()), Some("Gain"));
        assert!(chain.stage(1).is_none());

        if let Some(stage) = chain.stage_mut(0) {
            stage.set_property(0, PropertyPayload::Slider(0.5));
        }
        assert_eq!(chain.property(0), PropertyPayload::Slider(0.5));
    }

    #[test]
    fn test_boxed_clone_is_independent() {
        let mut original: Box<dyn Effect> = Box::new(Gain::new(2.0));
        original.push_signal(&[1.0]);

        let mut copy = original.clone();
        copy.set_property(0, PropertyPayload::Slider(3.0));

        assert_eq!(original.property(0), PropertyPayload::Slider(2.0));
        assert_eq!(copy.n_transformed_ready(), 1);
    }
}
