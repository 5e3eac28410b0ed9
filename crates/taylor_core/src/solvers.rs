use nalgebra::Vector3;

use crate::derivatives::{check_rigidity, VelocityDerivatives, TAYLOR_TERMS};
use crate::error::TrackError;
use crate::field::FieldPartials;
use crate::numeric::factorial;
use crate::traits::FieldEvaluator;

/// Six-term Taylor step in arc length `h`:
///
/// ```text
/// r₁ = r₀ + Σ_{i=0}^{5} u⁽ⁱ⁾ hⁱ⁺¹ / (i+1)!
/// u₁ =      Σ_{i=0}^{5} u⁽ⁱ⁾ hⁱ   / i!
/// ```
///
/// Both sums accumulate into fresh values; `r` is only read.
pub fn advance(
    r: &Vector3<f64>,
    u_derivs: &VelocityDerivatives,
    h: f64,
) -> (Vector3<f64>, Vector3<f64>) {
    let mut r_next = *r;
    let mut u_next = Vector3::zeros();
    let mut h_pow = 1.0;

    for i in 0..TAYLOR_TERMS {
        let term = u_derivs[i];
        u_next += term * (h_pow / factorial(i as u32) as f64);
        h_pow *= h;
        r_next += term * (h_pow / factorial(i as u32 + 1) as f64);
    }

    (r_next, u_next)
}

/// Arc-length form of the Lorentz equations for RK4: `(dr/ds, du/ds)`.
///
/// Rigidity is only checked where the field is present.
fn lorentz_rhs(
    partials: &FieldPartials,
    u: &Vector3<f64>,
    rigidity: f64,
) -> Result<(Vector3<f64>, Vector3<f64>), TrackError> {
    if partials.is_absent() {
        return Ok((*u, Vector3::zeros()));
    }
    check_rigidity(rigidity)?;
    Ok((*u, u.cross(&partials.value) / rigidity))
}

/// Classic Runge-Kutta 4th order step of `dr/ds = u, du/ds = u × B(r) / Bρ`.
///
/// Only the order-0 field is used, so rigidity scaling affects nothing here.
/// `start` is the field already evaluated at `r`.
pub fn rk4_step<B>(
    field: &B,
    start: &FieldPartials,
    r: &Vector3<f64>,
    u: &Vector3<f64>,
    rigidity: f64,
    h: f64,
) -> Result<(Vector3<f64>, Vector3<f64>), TrackError>
where
    B: FieldEvaluator + ?Sized,
{
    let half = 0.5 * h;

    // k1 = f(y)
    let (k1r, k1u) = lorentz_rhs(start, u, rigidity)?;

    // k2 = f(y + h*k1/2)
    let r2 = r + k1r * half;
    let u2 = u + k1u * half;
    let (k2r, k2u) = lorentz_rhs(&field.partials(&r2), &u2, rigidity)?;

    // k3 = f(y + h*k2/2)
    let r3 = r + k2r * half;
    let u3 = u + k2u * half;
    let (k3r, k3u) = lorentz_rhs(&field.partials(&r3), &u3, rigidity)?;

    // k4 = f(y + h*k3)
    let r4 = r + k3r * h;
    let u4 = u + k3u * h;
    let (k4r, k4u) = lorentz_rhs(&field.partials(&r4), &u4, rigidity)?;

    // y_next = y + h/6 * (k1 + 2k2 + 2k3 + k4)
    let sixth = h / 6.0;
    let r_next = r + (k1r + k2r * 2.0 + k3r * 2.0 + k4r) * sixth;
    let u_next = u + (k1u + k2u * 2.0 + k3u * 2.0 + k4u) * sixth;
    Ok((r_next, u_next))
}
