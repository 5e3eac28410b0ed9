//! Phase-space coordinates in Zgoubi's Y-T-Z-P-X-D convention.
//!
//! Component order everywhere in this crate (arrays, constructors, bridges):
//!
//! | index | field | meaning                                  |
//! |-------|-------|------------------------------------------|
//! | 0     | `y`   | horizontal position (m)                  |
//! | 1     | `t`   | horizontal angle (rad)                   |
//! | 2     | `z`   | vertical position (m)                    |
//! | 3     | `p`   | vertical angle (rad)                     |
//! | 4     | `x`   | longitudinal position (m)                |
//! | 5     | `d`   | momentum offset, relative to reference   |
//!
//! The Cartesian position is `(x, y, z)` and the unit velocity is
//! `(cos p · cos t, cos p · sin t, sin p)`.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::trajectory::TrajectoryState;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub y: f64,
    pub t: f64,
    pub z: f64,
    pub p: f64,
    pub x: f64,
    pub d: f64,
    pub alive: bool,
}

impl Default for Coordinates {
    fn default() -> Self {
        Self {
            y: 0.0,
            t: 0.0,
            z: 0.0,
            p: 0.0,
            x: 0.0,
            d: 1.0,
            alive: true,
        }
    }
}

impl Coordinates {
    pub fn new(y: f64, t: f64, z: f64, p: f64, x: f64, d: f64) -> Self {
        Self {
            y,
            t,
            z,
            p,
            x,
            d,
            alive: true,
        }
    }

    /// Builds coordinates from `[y, t, z, p, x, d]`.
    pub fn from_array(values: [f64; 6]) -> Self {
        let [y, t, z, p, x, d] = values;
        Self::new(y, t, z, p, x, d)
    }

    /// Returns `[y, t, z, p, x, d]`.
    pub fn to_array(&self) -> [f64; 6] {
        [self.y, self.t, self.z, self.p, self.x, self.d]
    }

    /// Recovers angles from a unit velocity. `velocity` is expected to be
    /// normalized; `u_z` is clamped so rounding cannot push `asin` out of range.
    pub fn from_state(position: &Vector3<f64>, velocity: &Vector3<f64>, d: f64) -> Self {
        let t = velocity.y.atan2(velocity.x);
        let p = velocity.z.clamp(-1.0, 1.0).asin();
        Self::new(position.y, t, position.z, p, position.x, d)
    }

    pub fn cartesian(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn unit_velocity(&self) -> Vector3<f64> {
        let cos_p = self.p.cos();
        Vector3::new(cos_p * self.t.cos(), cos_p * self.t.sin(), self.p.sin())
    }
}

/// A particle: its coordinates and rigidity `Bρ` in T·m.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub coordinates: Coordinates,
    pub rigidity: f64,
}

impl Particle {
    pub fn new(coordinates: Coordinates, rigidity: f64) -> Self {
        Self {
            coordinates,
            rigidity,
        }
    }

    pub fn cartesian(&self) -> Vector3<f64> {
        self.coordinates.cartesian()
    }

    pub fn unit_velocity(&self) -> Vector3<f64> {
        self.coordinates.unit_velocity()
    }

    /// A new particle placed at `state`, keeping the momentum offset and
    /// liveness flag.
    #[must_use]
    pub fn advanced_to(&self, state: &TrajectoryState) -> Self {
        let mut coordinates =
            Coordinates::from_state(&state.position, &state.velocity, self.coordinates.d);
        coordinates.alive = self.coordinates.alive;
        Self::new(coordinates, state.rigidity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn defaults_to_reference_momentum_and_alive() {
        let c = Coordinates::default();
        assert_eq!(c.d, 1.0);
        assert!(c.alive);
        assert_eq!(c.unit_velocity(), Vector3::x());
    }

    #[test]
    fn array_order_is_y_t_z_p_x_d() {
        let c = Coordinates::from_array([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!((c.y, c.t, c.z, c.p, c.x, c.d), (1.0, 2.0, 3.0, 4.0, 5.0, 6.0));
        assert_eq!(c.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(c.cartesian(), Vector3::new(5.0, 1.0, 3.0));
    }

    #[test]
    fn unit_velocity_follows_angles() {
        let c = Coordinates::new(0.0, FRAC_PI_2, 0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(c.unit_velocity(), Vector3::y(), epsilon = 1e-15);

        let c = Coordinates::new(0.0, 0.3, 0.0, -0.2, 0.0, 1.0);
        assert_relative_eq!(c.unit_velocity().norm(), 1.0, epsilon = 1e-15);
        assert_relative_eq!(c.unit_velocity().z, (-0.2f64).sin());
    }

    #[test]
    fn from_state_inverts_projections() {
        let original = Coordinates::new(0.1, 0.4, -0.2, 0.25, 2.0, 1.0);
        let rebuilt =
            Coordinates::from_state(&original.cartesian(), &original.unit_velocity(), original.d);
        assert_relative_eq!(rebuilt.t, original.t, epsilon = 1e-14);
        assert_relative_eq!(rebuilt.p, original.p, epsilon = 1e-14);
        assert_eq!(rebuilt.cartesian(), original.cartesian());
    }

    #[test]
    fn advanced_to_returns_new_particle_and_leaves_original() {
        let particle = Particle::new(Coordinates::default(), 2.5);
        let state = TrajectoryState {
            position: Vector3::new(1.0, 2.0, 3.0),
            velocity: Vector3::y(),
            rigidity: 2.5,
        };
        let moved = particle.advanced_to(&state);
        assert_eq!(moved.cartesian(), state.position);
        assert_relative_eq!(moved.unit_velocity(), Vector3::y(), epsilon = 1e-15);
        assert_eq!(particle.cartesian(), Vector3::zeros());
    }
}
