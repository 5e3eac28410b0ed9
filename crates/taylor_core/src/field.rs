//! Field values and their spatial derivative tensors at a point.
//!
//! Tensors of order two and higher are stored derivative-index first with the
//! three field components in the `Vector3` leaf, so `second[i][j][c]` is
//! `∂²B_c / ∂x_i ∂x_j`. The Jacobian is a plain matrix indexed
//! `(component, derivative_index)`.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

pub type Tensor3 = [[Vector3<f64>; 3]; 3];
pub type Tensor4 = [[[Vector3<f64>; 3]; 3]; 3];
pub type Tensor5 = [[[[Vector3<f64>; 3]; 3]; 3]; 3];

/// Highest spatial derivative order carried by [`FieldPartials`].
pub const MAX_FIELD_ORDER: usize = 4;

/// A field and its spatial partial derivatives up to fourth order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldPartials {
    pub value: Vector3<f64>,
    pub jacobian: Matrix3<f64>,
    pub second: Tensor3,
    pub third: Tensor4,
    pub fourth: Tensor5,
}

impl Default for FieldPartials {
    fn default() -> Self {
        Self::zero()
    }
}

impl FieldPartials {
    pub fn zero() -> Self {
        let z = Vector3::zeros();
        Self {
            value: z,
            jacobian: Matrix3::zeros(),
            second: [[z; 3]; 3],
            third: [[[z; 3]; 3]; 3],
            fourth: [[[[z; 3]; 3]; 3]; 3],
        }
    }

    /// A field that is constant in space.
    pub fn constant(value: Vector3<f64>) -> Self {
        Self {
            value,
            ..Self::zero()
        }
    }

    /// True when every component of the order-0 tensor is exactly zero.
    pub fn is_absent(&self) -> bool {
        self.value.iter().all(|c| *c == 0.0)
    }

    /// Multiplies every tensor by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        let mut out = *self;
        out.value *= factor;
        out.jacobian *= factor;
        for_each_leaf3(&mut out.second, |v| *v *= factor);
        for_each_leaf4(&mut out.third, |v| *v *= factor);
        for_each_leaf5(&mut out.fourth, |v| *v *= factor);
        out
    }

    /// Multiplies only the order-0 tensor by `factor`.
    #[must_use]
    pub fn scaled_value(&self, factor: f64) -> Self {
        Self {
            value: self.value * factor,
            ..*self
        }
    }

    /// Checks that each derivative tensor is symmetric in its derivative
    /// indices. Adjacent swaps generate every permutation, so those are the
    /// only ones compared.
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        let close = |a: &Vector3<f64>, b: &Vector3<f64>| (a - b).amax() <= tolerance;
        let (s, t, f) = (&self.second, &self.third, &self.fourth);
        for a in 0..3 {
            for b in 0..3 {
                if !close(&s[a][b], &s[b][a]) {
                    return false;
                }
                for c in 0..3 {
                    if !close(&t[a][b][c], &t[b][a][c]) || !close(&t[a][b][c], &t[a][c][b]) {
                        return false;
                    }
                    for d in 0..3 {
                        let x = &f[a][b][c][d];
                        if !close(x, &f[b][a][c][d])
                            || !close(x, &f[a][c][b][d])
                            || !close(x, &f[a][b][d][c])
                        {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }
}

/// Which fields are present at a point, decided from their order-0 tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldPresence {
    None,
    MagneticOnly,
    ElectricOnly,
    Both,
}

impl FieldPresence {
    pub fn classify(magnetic: &FieldPartials, electric: &FieldPartials) -> Self {
        match (magnetic.is_absent(), electric.is_absent()) {
            (true, true) => FieldPresence::None,
            (false, true) => FieldPresence::MagneticOnly,
            (true, false) => FieldPresence::ElectricOnly,
            (false, false) => FieldPresence::Both,
        }
    }

    pub fn has_electric(self) -> bool {
        matches!(self, FieldPresence::ElectricOnly | FieldPresence::Both)
    }
}

/// `Σ_ij t[i][j] a_i b_j`
pub(crate) fn contract2(t: &Tensor3, a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    let mut acc = Vector3::zeros();
    for i in 0..3 {
        for j in 0..3 {
            acc += t[i][j] * (a[i] * b[j]);
        }
    }
    acc
}

/// `Σ_ijk t[i][j][k] a_i b_j c_k`
pub(crate) fn contract3(
    t: &Tensor4,
    a: &Vector3<f64>,
    b: &Vector3<f64>,
    c: &Vector3<f64>,
) -> Vector3<f64> {
    let mut acc = Vector3::zeros();
    for i in 0..3 {
        for j in 0..3 {
            for k in 0..3 {
                acc += t[i][j][k] * (a[i] * b[j] * c[k]);
            }
        }
    }
    acc
}

/// Full contraction of the fourth-order tensor with `a` in every slot.
pub(crate) fn contract4_uniform(t: &Tensor5, a: &Vector3<f64>) -> Vector3<f64> {
    let mut acc = Vector3::zeros();
    for i in 0..3 {
        for j in 0..3 {
            for k in 0..3 {
                for l in 0..3 {
                    acc += t[i][j][k][l] * (a[i] * a[j] * a[k] * a[l]);
                }
            }
        }
    }
    acc
}

fn for_each_leaf3(t: &mut Tensor3, f: impl FnMut(&mut Vector3<f64>)) {
    t.iter_mut().flatten().for_each(f);
}

fn for_each_leaf4(t: &mut Tensor4, f: impl FnMut(&mut Vector3<f64>)) {
    t.iter_mut().flatten().flatten().for_each(f);
}

fn for_each_leaf5(t: &mut Tensor5, f: impl FnMut(&mut Vector3<f64>)) {
    t.iter_mut().flatten().flatten().flatten().for_each(f);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_partials_are_absent() {
        let partials = FieldPartials::zero();
        assert!(partials.is_absent());
        assert!(!FieldPartials::constant(Vector3::new(0.0, 0.0, 1e-30)).is_absent());
    }

    #[test]
    fn gradient_alone_does_not_count_as_present() {
        let mut partials = FieldPartials::zero();
        partials.jacobian[(1, 2)] = 3.0;
        assert!(partials.is_absent());
    }

    #[test]
    fn classify_covers_every_combination() {
        let zero = FieldPartials::zero();
        let on = FieldPartials::constant(Vector3::z());
        assert_eq!(FieldPresence::classify(&zero, &zero), FieldPresence::None);
        assert_eq!(FieldPresence::classify(&on, &zero), FieldPresence::MagneticOnly);
        assert_eq!(FieldPresence::classify(&zero, &on), FieldPresence::ElectricOnly);
        assert_eq!(FieldPresence::classify(&on, &on), FieldPresence::Both);
        assert!(FieldPresence::Both.has_electric());
        assert!(!FieldPresence::MagneticOnly.has_electric());
    }

    #[test]
    fn scaled_touches_every_order_but_scaled_value_only_the_first() {
        let mut partials = FieldPartials::constant(Vector3::new(2.0, 0.0, 0.0));
        partials.jacobian[(0, 0)] = 4.0;
        partials.second[1][1] = Vector3::new(0.0, 6.0, 0.0);
        partials.third[0][1][2] = Vector3::new(0.0, 0.0, 8.0);
        partials.fourth[2][2][2][2] = Vector3::new(10.0, 0.0, 0.0);

        let full = partials.scaled(0.5);
        assert_relative_eq!(full.value.x, 1.0);
        assert_relative_eq!(full.jacobian[(0, 0)], 2.0);
        assert_relative_eq!(full.second[1][1].y, 3.0);
        assert_relative_eq!(full.third[0][1][2].z, 4.0);
        assert_relative_eq!(full.fourth[2][2][2][2].x, 5.0);

        let value_only = partials.scaled_value(0.5);
        assert_relative_eq!(value_only.value.x, 1.0);
        assert_relative_eq!(value_only.jacobian[(0, 0)], 4.0);
        assert_relative_eq!(value_only.fourth[2][2][2][2].x, 10.0);
    }

    #[test]
    fn symmetry_check_detects_asymmetric_third_order_tensor() {
        let mut partials = FieldPartials::zero();
        for (i, j, k) in [(0, 1, 2), (0, 2, 1), (1, 0, 2), (1, 2, 0), (2, 0, 1), (2, 1, 0)] {
            partials.third[i][j][k] = Vector3::new(1.0, 2.0, 3.0);
        }
        assert!(partials.is_symmetric(1e-15));

        partials.third[2][1][0] = Vector3::new(1.0, 2.0, 3.5);
        assert!(!partials.is_symmetric(1e-15));
    }

    #[test]
    fn contractions_sum_over_every_index() {
        let mut second: Tensor3 = [[Vector3::zeros(); 3]; 3];
        second[0][1] = Vector3::new(1.0, 0.0, 0.0);
        second[1][0] = Vector3::new(1.0, 0.0, 0.0);
        let a = Vector3::new(2.0, 3.0, 0.0);
        let b = Vector3::new(5.0, 7.0, 0.0);
        // t01 a0 b1 + t10 a1 b0 = 2*7 + 3*5
        assert_relative_eq!(contract2(&second, &a, &b).x, 29.0);

        let mut fourth: Tensor5 = [[[[Vector3::zeros(); 3]; 3]; 3]; 3];
        fourth[2][2][2][2] = Vector3::new(0.0, 1.0, 0.0);
        let c = Vector3::new(0.0, 0.0, 2.0);
        assert_relative_eq!(contract4_uniform(&fourth, &c).y, 16.0);
    }
}
