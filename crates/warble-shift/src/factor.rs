//! Shift factor shared by the pitch and formant shifters.

use warble_core::{PropertyDesc, PropertyPayload, PropertyRange};

/// A clamped, finite shift factor. 2.0 is an octave up, 0.5 an octave down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftFactor(f32);

impl ShiftFactor {
    pub const MIN: f32 = 0.5;
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

    pub fn range() -> PropertyRange {
        PropertyRange::exponential(Self::MIN, Self::MAX, 1.0)
    }

    /// Slider descriptor for property 0.
    pub fn descriptor(name: &'static str, description: &'static str) -> PropertyDesc {
        PropertyDesc::slider(0, name, description, Self::range())
    }

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

impl Default for ShiftFactor {
    fn default() -> Self {
        Self(1.0)
    }
}
