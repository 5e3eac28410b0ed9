//! Arc-length derivatives of the field along the trajectory and of the unit
//! velocity.
//!
//! The two recursions feed each other: the order-`i` field derivative needs
//! velocity derivatives up to `i - 1`, and the order-`i + 1` velocity
//! derivative needs field derivatives up to `i`. Both are filled in strictly
//! increasing order.

use std::ops::Index;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::TrackError;
use crate::field::{
    contract2, contract3, contract4_uniform, FieldPartials, FieldPresence, MAX_FIELD_ORDER,
};
use crate::numeric::binomial;

/// Number of Taylor terms kept per step (orders 0 through 5).
pub const TAYLOR_TERMS: usize = 6;

/// `dⁱu/dsⁱ` for `i = 0..=5` at the current point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityDerivatives([Vector3<f64>; TAYLOR_TERMS]);

impl VelocityDerivatives {
    pub fn new(terms: [Vector3<f64>; TAYLOR_TERMS]) -> Self {
        Self(terms)
    }

    /// Straight-line motion: `u` with every higher derivative zero.
    pub fn constant(u: Vector3<f64>) -> Self {
        let mut terms = [Vector3::zeros(); TAYLOR_TERMS];
        terms[0] = u;
        Self(terms)
    }

    pub fn velocity(&self) -> Vector3<f64> {
        self.0[0]
    }

    pub fn as_slice(&self) -> &[Vector3<f64>] {
        &self.0
    }
}

impl Index<usize> for VelocityDerivatives {
    type Output = Vector3<f64>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// How the magnetic partials are normalized by rigidity before propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RigidityScaling {
    /// Every tensor is divided by rigidity, so all orders describe `B / Bρ`.
    #[default]
    Full,
    /// Only the order-0 tensor is divided; derivative tensors stay in tesla.
    ValueOnly,
}

impl RigidityScaling {
    fn apply(self, partials: &FieldPartials, rigidity: f64) -> FieldPartials {
        let factor = 1.0 / rigidity;
        match self {
            RigidityScaling::Full => partials.scaled(factor),
            RigidityScaling::ValueOnly => partials.scaled_value(factor),
        }
    }
}

/// `dⁿ/dsⁿ F(r(s))` for `n = order`, by the chain rule with `dr/ds = u`.
///
/// `u_derivs` must hold at least `order` entries; only `u_derivs[..order]` is
/// read.
pub fn derive_field(
    partials: &FieldPartials,
    u_derivs: &[Vector3<f64>],
    order: usize,
) -> Result<Vector3<f64>, TrackError> {
    if order > MAX_FIELD_ORDER {
        return Err(TrackError::InvalidDerivativeOrder { order });
    }
    if u_derivs.len() < order {
        return Err(TrackError::MissingVelocityDerivatives {
            order,
            available: u_derivs.len(),
        });
    }

    let j = &partials.jacobian;
    let d2 = &partials.second;
    let d3 = &partials.third;

    let value = match order {
        0 => partials.value,
        1 => j * u_derivs[0],
        2 => {
            let (u0, u1) = (&u_derivs[0], &u_derivs[1]);
            j * u1 + contract2(d2, u0, u0)
        }
        3 => {
            let (u0, u1, u2) = (&u_derivs[0], &u_derivs[1], &u_derivs[2]);
            j * u2 + contract2(d2, u1, u0) * 3.0 + contract3(d3, u0, u0, u0)
        }
        _ => {
            let (u0, u1, u2, u3) = (&u_derivs[0], &u_derivs[1], &u_derivs[2], &u_derivs[3]);
            j * u3
                + contract2(d2, u1, u1) * 3.0
                + contract2(d2, u2, u0) * 4.0
                + contract3(d3, u1, u0, u0) * 6.0
                + contract4_uniform(&partials.fourth, u0)
        }
    };
    Ok(value)
}

/// Derivatives of the unit velocity in the given fields.
///
/// Classifies the fields from their order-0 tensors and dispatches; see
/// [`derive_u_for`].
pub fn derive_u(
    magnetic: &FieldPartials,
    electric: &FieldPartials,
    rigidity: f64,
    u: Vector3<f64>,
) -> Result<VelocityDerivatives, TrackError> {
    let presence = FieldPresence::classify(magnetic, electric);
    derive_u_for(presence, magnetic, rigidity, u, RigidityScaling::Full)
}

/// Derivatives of the unit velocity for an already classified point.
///
/// Any configuration with an electric field is rejected.
pub fn derive_u_for(
    presence: FieldPresence,
    magnetic: &FieldPartials,
    rigidity: f64,
    u: Vector3<f64>,
    scaling: RigidityScaling,
) -> Result<VelocityDerivatives, TrackError> {
    match presence {
        FieldPresence::None => Ok(VelocityDerivatives::constant(u)),
        FieldPresence::MagneticOnly => derive_u_in_magnetic(magnetic, rigidity, u, scaling),
        FieldPresence::ElectricOnly | FieldPresence::Both => {
            Err(TrackError::UnsupportedFieldConfiguration { presence })
        }
    }
}

pub(crate) fn check_rigidity(rigidity: f64) -> Result<(), TrackError> {
    if rigidity == 0.0 || !rigidity.is_finite() {
        return Err(TrackError::InvalidRigidity { rigidity });
    }
    Ok(())
}

/// Leibniz expansion of `du/ds = u × B(r(s)) / Bρ`:
///
/// ```text
/// u⁽ⁱ⁺¹⁾ = Σ_{k=0}^{i} C(i, k) · u⁽ᵏ⁾ × b⁽ⁱ⁻ᵏ⁾
/// ```
fn derive_u_in_magnetic(
    magnetic: &FieldPartials,
    rigidity: f64,
    u: Vector3<f64>,
    scaling: RigidityScaling,
) -> Result<VelocityDerivatives, TrackError> {
    check_rigidity(rigidity)?;
    let normalized = scaling.apply(magnetic, rigidity);

    let mut u_derivs = [Vector3::zeros(); TAYLOR_TERMS];
    let mut b_derivs = [Vector3::zeros(); TAYLOR_TERMS - 1];
    u_derivs[0] = u;

    for i in 0..TAYLOR_TERMS - 1 {
        b_derivs[i] = derive_field(&normalized, &u_derivs[..=i], i)?;
        let mut next = Vector3::zeros();
        for k in 0..=i {
            let c = binomial(i as u32, k as u32) as f64;
            next += u_derivs[k].cross(&b_derivs[i - k]) * c;
        }
        u_derivs[i + 1] = next;
    }

    Ok(VelocityDerivatives(u_derivs))
}
