//! Analytic magnetic field generators.
//!
//! Each generator returns exact partials, so the tensors are symmetric by
//! construction.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::field::FieldPartials;
use crate::traits::FieldEvaluator;

/// A field that is zero everywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NoField;

impl FieldEvaluator for NoField {
    fn partials(&self, _position: &Vector3<f64>) -> FieldPartials {
        FieldPartials::zero()
    }
}

/// A spatially constant field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformField {
    pub value: Vector3<f64>,
}

impl UniformField {
    pub fn new(value: Vector3<f64>) -> Self {
        Self { value }
    }

    pub fn along_z(value: f64) -> Self {
        Self::new(Vector3::new(0.0, 0.0, value))
    }
}

impl FieldEvaluator for UniformField {
    fn partials(&self, _position: &Vector3<f64>) -> FieldPartials {
        FieldPartials::constant(self.value)
    }
}

/// Hard-edge quadrupole with its axis along x, occupying `0 ≤ x ≤ length`.
///
/// Inside, `B_y = G·z` and `B_z = G·y`; the field is zero elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadrupoleField {
    pub gradient: f64,
    pub length: f64,
}

impl QuadrupoleField {
    pub fn new(gradient: f64, length: f64) -> Self {
        Self { gradient, length }
    }

    /// Gradient from the pole-tip field `b0` at aperture radius `r0`.
    pub fn from_pole_tip(b0: f64, r0: f64, length: f64) -> Self {
        Self::new(b0 / r0, length)
    }
}

impl FieldEvaluator for QuadrupoleField {
    fn partials(&self, position: &Vector3<f64>) -> FieldPartials {
        if !(0.0..=self.length).contains(&position.x) {
            return FieldPartials::zero();
        }
        let g = self.gradient;
        let mut partials =
            FieldPartials::constant(Vector3::new(0.0, g * position.z, g * position.y));
        partials.jacobian[(1, 2)] = g;
        partials.jacobian[(2, 1)] = g;
        partials
    }
}

/// Restricts a field to the slab `x_min ≤ x ≤ x_max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounded<F> {
    pub inner: F,
    pub x_min: f64,
    pub x_max: f64,
}

impl<F> Bounded<F> {
    pub fn new(inner: F, x_min: f64, x_max: f64) -> Self {
        Self {
            inner,
            x_min,
            x_max,
        }
    }
}

impl<F: FieldEvaluator> FieldEvaluator for Bounded<F> {
    fn partials(&self, position: &Vector3<f64>) -> FieldPartials {
        if (self.x_min..=self.x_max).contains(&position.x) {
            self.inner.partials(position)
        } else {
            FieldPartials::zero()
        }
    }
}
