use nalgebra::Vector3;

use crate::field::FieldPartials;

/// Produces the field partials at a point.
///
/// Implementations must be deterministic and free of side effects; the
/// tracker calls them once per step (four times for RK4) and may call them
/// from several threads at once.
pub trait FieldEvaluator {
    fn partials(&self, position: &Vector3<f64>) -> FieldPartials;
}

impl<F> FieldEvaluator for F
where
    F: Fn(&Vector3<f64>) -> FieldPartials,
{
    fn partials(&self, position: &Vector3<f64>) -> FieldPartials {
        self(position)
    }
}

/// Updates rigidity after a step taken in a non-zero electric field.
pub trait RigidityUpdate {
    fn update(&self, u: &Vector3<f64>, rigidity: f64, electric: &FieldPartials) -> f64;
}

/// Leaves rigidity untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unchanged;

impl RigidityUpdate for Unchanged {
    fn update(&self, _u: &Vector3<f64>, rigidity: f64, _electric: &FieldPartials) -> f64 {
        rigidity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_field_evaluators() {
        let field = |r: &Vector3<f64>| FieldPartials::constant(Vector3::new(0.0, 0.0, r.x));
        assert_eq!(field.partials(&Vector3::new(2.0, 0.0, 0.0)).value.z, 2.0);
    }

    #[test]
    fn unchanged_returns_input_rigidity() {
        let e = FieldPartials::constant(Vector3::x());
        assert_eq!(Unchanged.update(&Vector3::x(), 1.75, &e), 1.75);
    }
}
