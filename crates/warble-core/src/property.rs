//! User-adjustable effect properties.
//!
//! Every [`Effect`](crate::Effect) describes its controls as a list of
//! [`PropertyDesc`]s. A host renders one control per descriptor and routes
//! edited values back as [`PropertyPayload`]s. Index 0 is always the effect's
//! primary factor.
//!
//! # Example
//!
//! ```
//! use warble_core::{PropertyRange, PropertyScale};
//!
//! // Stretch factor: 0.5x to 2x, exponential so 1.0 sits mid-travel
//! let stretch = PropertyRange::exponential(0.5, 2.0, 1.0);
//!
//! let factor = stretch.denormalize(0.5); // 1.0 (geometric mean)
//! let back = stretch.normalize(factor);  // 0.5
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a property value maps between normalized (0-1) control travel and real values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PropertyScale {
    /// `real = min + normalized * (max - min)`
    #[default]
    Linear,

    /// `real = min * (max/min)^normalized`
    ///
    /// Requires `min > 0`. Equal control travel gives equal ratios, which is
    /// what stretch and shift factors want.
    Exponential,
}

/// Range, step, default and scale of a continuous property.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PropertyRange {
    /// Minimum real value
    pub min: f32,
    /// Maximum real value
    pub max: f32,
    /// Suggested increment for stepped controls (0 = continuous)
    pub step: f32,
    /// Default real value
    pub default: f32,
    /// Scaling algorithm
    pub scale: PropertyScale,
}

impl PropertyRange {
    /// Create a new property range.
    ///
    /// `default` is clamped to `[min, max]`.
    pub fn new(min: f32, max: f32, default: f32, scale: PropertyScale) -> Self {
        debug_assert!(max > min, "max must be greater than min");

        Self {
            min,
            max,
            step: 0.0,
            default: default.clamp(min, max),
            scale,
        }
    }

    pub fn linear(min: f32, max: f32, default: f32) -> Self {
        Self::new(min, max, default, PropertyScale::Linear)
    }

    /// # Panics
    ///
    /// Panics in debug mode if `min <= 0`.
    pub fn exponential(min: f32, max: f32, default: f32) -> Self {
        debug_assert!(min > 0.0, "exponential scale requires min > 0");
        Self::new(min, max, default, PropertyScale::Exponential)
    }

    /// Set the step size.
    pub fn with_step(mut self, step: f32) -> Self {
        self.step = step.max(0.0);
        self
    }

    /// Convert a real value to normalized (0.0-1.0).
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let value = value.clamp(self.min, self.max);
        let range = self.max - self.min;

        if range <= 0.0 {
            return 0.0;
        }

        match self.scale {
            PropertyScale::Linear => (value - self.min) / range,

            PropertyScale::Exponential => {
                if self.min <= 0.0 {
                    (value - self.min) / range
                } else {
                    (value / self.min).ln() / (self.max / self.min).ln()
                }
            }
        }
    }

    /// Convert a normalized value (0.0-1.0) to a real value.
    #[inline]
    pub fn denormalize(&self, normalized: f32) -> f32 {
        let normalized = normalized.clamp(0.0, 1.0);

        let value = match self.scale {
            PropertyScale::Linear => self.min + normalized * (self.max - self.min),

            PropertyScale::Exponential => {
                if self.min <= 0.0 {
                    self.min + normalized * (self.max - self.min)
                } else {
                    self.min * (self.max / self.min).powf(normalized)
                }
            }
        };
        self.quantize(value)
    }

    /// Snap to the step grid anchored at `min`, if a step is set.
    #[inline]
    pub fn quantize(&self, value: f32) -> f32 {
        if self.step > 0.0 {
            let steps = ((value - self.min) / self.step).round();
            (self.min + steps * self.step).clamp(self.min, self.max)
        } else {
            value
        }
    }

    /// Clamp a real value to this property's range.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    #[inline]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// What kind of control a property is.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PropertyKind {
    /// On/off switch, carried as [`PropertyPayload::Toggle`].
    Toggle,
    /// Linear fader.
    Slider(PropertyRange),
    /// Rotary control.
    Knob(PropertyRange),
    /// Stepped numeric entry.
    Counter(PropertyRange),
}

impl PropertyKind {
    /// Range of a continuous property.
    pub fn range(&self) -> Option<&PropertyRange> {
        match self {
            Self::Toggle => None,
            Self::Slider(range) | Self::Knob(range) | Self::Counter(range) => Some(range),
        }
    }
}

/// Describes one property of an effect.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PropertyDesc {
    /// Stable id used with `set_property`/`property`.
    pub index: usize,
    pub name: &'static str,
    pub description: &'static str,
    pub kind: PropertyKind,
}

impl PropertyDesc {
    pub fn slider(
        index: usize,
        name: &'static str,
        description: &'static str,
        range: PropertyRange,
    ) -> Self {
        Self {
            index,
            name,
            description,
            kind: PropertyKind::Slider(range),
        }
    }

    pub fn toggle(index: usize, name: &'static str, description: &'static str) -> Self {
        Self {
            index,
            name,
            description,
            kind: PropertyKind::Toggle,
        }
    }

    /// Whether `payload` carries the variant this descriptor expects.
    pub fn accepts(&self, payload: &PropertyPayload) -> bool {
        matches!(
            (&self.kind, payload),
            (PropertyKind::Toggle, PropertyPayload::Toggle(_))
                | (PropertyKind::Slider(_), PropertyPayload::Slider(_))
                | (PropertyKind::Knob(_), PropertyPayload::Knob(_))
                | (PropertyKind::Counter(_), PropertyPayload::Counter(_))
        )
    }
}

/// A property value, tagged like the descriptor it belongs to.
///
/// The default, `Slider(0.0)`, is what effects report for unknown ids.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PropertyPayload {
    Toggle(bool),
    Slider(f32),
    Knob(f32),
    Counter(f32),
}

impl Default for PropertyPayload {
    fn default() -> Self {
        Self::Slider(0.0)
    }
}

impl PropertyPayload {
    /// Value of a continuous payload.
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Self::Toggle(_) => None,
            Self::Slider(v) | Self::Knob(v) | Self::Counter(v) => Some(v),
        }
    }

    /// Value of a toggle payload.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Toggle(on) => Some(on),
            _ => None,
        }
    }
}
