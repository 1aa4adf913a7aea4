//! Shared vector normalization for stick inputs
//!
//! # Clamping
//!
//! - [`radial_clamp`]: scale vectors longer than 1 back onto the unit circle,
//!   leaving interior points untouched.
//! - [`square_clamp`]: clamp each axis independently to `[-1, 1]`.
//!
//! # Merging
//!
//! [`DeltaAccumulator`] merges several sources into one vector per tick.
//! Per axis it keeps the largest positive and the most negative contribution
//! and sums those two, so two keys held for the same direction don't add up
//! and two sticks pushed the same way don't average out.

use glam::Vec2;

use crate::config::{ClampShape, DigitalDetection};

/// Clamp input to unit circle
///
/// - At (0.5, 0.5): magnitude 0.707, output unchanged
/// - At (1, 1): magnitude 1.414, output (0.707, 0.707)
pub fn radial_clamp(v: Vec2) -> Vec2 {
    let magnitude = v.length();
    if magnitude <= 1.0 {
        v
    } else {
        v / magnitude
    }
}

/// Clamp each axis to `[-1, 1]`
pub fn square_clamp(v: Vec2) -> Vec2 {
    v.clamp(Vec2::NEG_ONE, Vec2::ONE)
}

/// Clamp to the configured shape
pub fn clamp_to_shape(v: Vec2, shape: ClampShape) -> Vec2 {
    match shape {
        ClampShape::Circle => radial_clamp(v),
        ClampShape::Square => square_clamp(v),
    }
}

/// Distance used when digitizing a stick vector
///
/// Joystick detection uses plain magnitude. Touch detection uses the
/// Chebyshev norm, and for 8-way also the projection onto the diagonal, so
/// a finger resting near a corner of an on-screen square pad engages the
/// diagonal at the same travel as a cardinal.
pub fn digital_distance(v: Vec2, detection: DigitalDetection, eight_way: bool) -> f32 {
    match detection {
        DigitalDetection::Joystick => v.length(),
        DigitalDetection::Touch => {
            let chebyshev = v.x.abs().max(v.y.abs());
            if eight_way {
                let diagonal = (v.x.abs() + v.y.abs()) * std::f32::consts::FRAC_1_SQRT_2;
                chebyshev.max(diagonal)
            } else {
                chebyshev
            }
        }
    }
}

/// Per-tick merge of several vector sources
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DeltaAccumulator {
    positive: Vec2,
    negative: Vec2,
}

impl DeltaAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one source's contribution
    pub fn apply(&mut self, v: Vec2) {
        self.positive = self.positive.max(v.max(Vec2::ZERO));
        self.negative = self.negative.min(v.min(Vec2::ZERO));
    }

    /// Merged vector (unclamped)
    pub fn value(&self) -> Vec2 {
        self.positive + self.negative
    }

    pub fn is_empty(&self) -> bool {
        self.positive == Vec2::ZERO && self.negative == Vec2::ZERO
    }

    /// Merged vector, clearing the accumulator for the next tick
    pub fn take(&mut self) -> Vec2 {
        let v = self.value();
        *self = Self::default();
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radial_clamp() {
        assert_eq!(radial_clamp(Vec2::new(0.5, 0.5)), Vec2::new(0.5, 0.5));
        let clamped = radial_clamp(Vec2::new(1.0, 1.0));
        assert!((clamped.length() - 1.0).abs() < 1e-5);
        assert!((clamped.x - clamped.y).abs() < 1e-6);
    }

    #[test]
    fn test_square_clamp_is_axis_independent() {
        assert_eq!(square_clamp(Vec2::new(2.0, 0.5)), Vec2::new(1.0, 0.5));
        assert_eq!(square_clamp(Vec2::new(-3.0, -3.0)), Vec2::new(-1.0, -1.0));
    }

    #[test]
    fn test_digital_distance_metrics() {
        let v = Vec2::new(0.4, 0.4);
        assert!((digital_distance(v, DigitalDetection::Joystick, true) - 0.5657).abs() < 1e-3);
        assert!((digital_distance(v, DigitalDetection::Touch, false) - 0.4).abs() < 1e-6);
        assert!((digital_distance(v, DigitalDetection::Touch, true) - 0.5657).abs() < 1e-3);
        let cardinal = Vec2::new(0.7, 0.0);
        assert!((digital_distance(cardinal, DigitalDetection::Touch, true) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_accumulator_takes_largest_same_signed() {
        let mut acc = DeltaAccumulator::new();
        acc.apply(Vec2::new(1.0, 0.0));
        acc.apply(Vec2::new(1.0, 0.0));
        acc.apply(Vec2::new(0.3, 0.0));
        assert_eq!(acc.value(), Vec2::new(1.0, 0.0));

        // Opposing sources cancel
        acc.apply(Vec2::new(-1.0, 0.5));
        assert_eq!(acc.value(), Vec2::new(0.0, 0.5));

        assert_eq!(acc.take(), Vec2::new(0.0, 0.5));
        assert!(acc.is_empty());
    }
}
