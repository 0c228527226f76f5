//! Time-stretcher trait and shared stretch bookkeeping.

use warble_core::{Effect, PropertyDesc, PropertyPayload, PropertyRange};

/// An [`Effect`] whose output is its input played `stretch_factor` times as long.
pub trait TimeStretcher: Effect {
    /// Set the stretch factor. Values outside
    /// [`StretchFactor::MIN`]..=[`StretchFactor::MAX`] are clamped.
    fn set_stretch_factor(&mut self, factor: f32);

    fn stretch_factor(&self) -> f32;
}

dyn_clone::clone_trait_object!(TimeStretcher);

/// A clamped, finite stretch factor. 1.0 leaves the duration unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StretchFactor(f32);

impl StretchFactor {
    /// Half duration.
    pub const MIN: f32 = 0.5;
    /// Double duration.
    pub const MAX: f32 = 2.0;

    /// Clamp `factor` into range. Non-finite values fall back to 1.0.
    pub fn new(factor: f32) -> Self {
        if factor.is_finite() {
            Self(factor.clamp(Self::MIN, Self::MAX))
        } else {
            Self(1.0)
        }
    }

    #[inline]
    pub fn get(self) -> f32 {
        self.0
    }

    /// Exponential slider range centred on 1.0.
    pub fn range() -> PropertyRange {
        PropertyRange::exponential(Self::MIN, Self::MAX, 1.0)
    }

    /// Descriptor for property 0 of every time-stretcher.
    pub fn descriptor() -> PropertyDesc {
        PropertyDesc::slider(
            0,
            "Stretch Factor",
            "Scales the length of pushed signals by this amount",
            Self::range(),
        )
    }

    /// Decode a property-0 payload. Anything but a slider is rejected.
    pub fn from_payload(payload: PropertyPayload) -> Option<Self> {
        match payload {
            PropertyPayload::Slider(value) => Some(Self::new(value)),
            _ => None,
        }
    }

    pub fn payload(self) -> PropertyPayload {
        PropertyPayload::Slider(self.0)
    }
}

impl Default for StretchFactor {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Carries the fractional part of non-integer hop sizes between iterations,
/// so the realized hops average out to the nominal one.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HopAccumulator {
    carry: f64,
}

impl HopAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Integer hop for a nominal (possibly fractional, possibly negative) length.
    ///
    /// Uses the magnitude of `nominal`. Once the dropped fractions add up to a
    /// whole sample the hop is one longer.
    pub fn next(&mut self, nominal: f32) -> usize {
        let nominal = f64::from(nominal.abs());
        let whole = nominal.trunc();
        self.carry += nominal - whole;

        let mut hop = whole as usize;
        if self.carry >= 1.0 {
            hop += 1;
            self.carry -= 1.0;
        }
        hop
    }

    /// Fraction carried into the next hop.
    pub fn carry(&self) -> f64 {
        self.carry
    }

    pub fn reset(&mut self) {
        self.carry = 0.0;
    }
}
