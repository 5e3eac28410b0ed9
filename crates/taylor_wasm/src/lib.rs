use anyhow::{bail, Context};
use js_sys::Float64Array;
use nalgebra::Vector3;
use serde_wasm_bindgen::to_value;
use taylor_core::coordinates::{Coordinates, Particle};
use taylor_core::error::step_count;
use taylor_core::field::FieldPartials;
use taylor_core::fields::{Bounded, NoField, QuadrupoleField, UniformField};
use taylor_core::traits::FieldEvaluator;
use taylor_core::{StepMethod, Tracker, TrackerSettings, Trajectory};
use wasm_bindgen::prelude::*;

pub(crate) enum MagneticField {
    None,
    Uniform(UniformField),
    Bend(Bounded<UniformField>),
    Quadrupole(QuadrupoleField),
}

impl FieldEvaluator for MagneticField {
    fn partials(&self, position: &Vector3<f64>) -> FieldPartials {
        match self {
            MagneticField::None => NoField.partials(position),
            MagneticField::Uniform(f) => f.partials(position),
            MagneticField::Bend(f) => f.partials(position),
            MagneticField::Quadrupole(f) => f.partials(position),
        }
    }
}

fn expect_params<const N: usize>(kind: &str, params: &[f64]) -> anyhow::Result<[f64; N]> {
    params.try_into().ok().with_context(|| {
        format!(
            "Field '{}' takes {} parameters, got {}.",
            kind,
            N,
            params.len()
        )
    })
}

pub(crate) fn build_field(kind: &str, params: &[f64]) -> anyhow::Result<MagneticField> {
    let field = match kind {
        "none" => MagneticField::None,
        "uniform" => {
            let [bx, by, bz] = expect_params(kind, params)?;
            MagneticField::Uniform(UniformField::new(Vector3::new(bx, by, bz)))
        }
        "bend" => {
            let [bz, x_min, x_max] = expect_params(kind, params)?;
            if x_min > x_max {
                bail!("Bend entrance {} lies after its exit {}.", x_min, x_max);
            }
            MagneticField::Bend(Bounded::new(UniformField::along_z(bz), x_min, x_max))
        }
        "quadrupole" => {
            let [b0, r0, length] = expect_params(kind, params)?;
            if r0 <= 0.0 {
                bail!("Quadrupole aperture radius must be positive.");
            }
            MagneticField::Quadrupole(QuadrupoleField::from_pole_tip(b0, r0, length))
        }
        other => bail!("Unknown field kind '{}'.", other),
    };
    Ok(field)
}

pub(crate) fn parse_method(name: &str) -> anyhow::Result<StepMethod> {
    match name {
        "taylor" => Ok(StepMethod::Taylor),
        "rk4" => Ok(StepMethod::Rk4),
        other => bail!("Unknown step method '{}'.", other),
    }
}

#[wasm_bindgen]
pub struct WasmTracker {
    field: MagneticField,
    tracker: Tracker,
    particle: Particle,
}

#[wasm_bindgen]
impl WasmTracker {
    #[wasm_bindgen(constructor)]
    pub fn new(
        field_kind: &str,
        field_params: Vec<f64>,
        method: &str,
    ) -> Result<WasmTracker, JsValue> {
        #[cfg(target_arch = "wasm32")]
        console_error_panic_hook::set_once();

        Self::build(field_kind, &field_params, method)
            .map_err(|e| JsValue::from_str(&format!("{}", e)))
    }

    /// `coordinates` is `[y, t, z, p, x, d]`.
    pub fn set_particle(&mut self, coordinates: &[f64], rigidity: f64) -> Result<(), JsValue> {
        self.update_particle(coordinates, rigidity)
            .map_err(|e| JsValue::from_str(&format!("{}", e)))
    }

    /// Integrates the current particle and returns the trajectory rows.
    pub fn integrate(&self, max_steps: i32, step_size: f64) -> Result<JsValue, JsValue> {
        let trajectory = self
            .run(max_steps, step_size)
            .map_err(|e| JsValue::from_str(&format!("{}", e)))?;
        to_value(&trajectory.rows())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Same as `integrate`, as a row-major table with `columns()` order.
    pub fn integrate_flat(&self, max_steps: i32, step_size: f64) -> Result<Float64Array, JsValue> {
        let trajectory = self
            .run(max_steps, step_size)
            .map_err(|e| JsValue::from_str(&format!("{}", e)))?;
        Ok(Float64Array::from(trajectory.to_flat_vec().as_slice()))
    }

    pub fn columns(&self) -> Vec<String> {
        Trajectory::COLUMNS.iter().map(|c| c.to_string()).collect()
    }
}

impl WasmTracker {
    fn build(field_kind: &str, field_params: &[f64], method: &str) -> anyhow::Result<Self> {
        let field = build_field(field_kind, field_params)?;
        let settings = TrackerSettings {
            method: parse_method(method)?,
            ..TrackerSettings::default()
        };
        Ok(WasmTracker {
            field,
            tracker: Tracker::new(settings),
            particle: Particle::new(Coordinates::default(), 1.0),
        })
    }

    fn update_particle(&mut self, coordinates: &[f64], rigidity: f64) -> anyhow::Result<()> {
        let values: [f64; 6] = coordinates.try_into().ok().with_context(|| {
            format!(
                "Particle coordinates need 6 values (y, t, z, p, x, d), got {}.",
                coordinates.len()
            )
        })?;
        self.particle = Particle::new(Coordinates::from_array(values), rigidity);
        Ok(())
    }

    fn run(&self, max_steps: i32, step_size: f64) -> anyhow::Result<Trajectory> {
        let steps = step_count(i64::from(max_steps))?;
        let trajectory = self
            .tracker
            .integrate(&self.particle, &self.field, &NoField, steps, step_size)?;
        Ok(trajectory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taylor_core::error::TrackError;

    #[test]
    fn builds_every_field_kind() {
        assert!(build_field("none", &[]).is_ok());
        assert!(build_field("uniform", &[0.0, 0.0, 0.5]).is_ok());
        assert!(build_field("bend", &[0.5, 0.0, 1.0]).is_ok());
        assert!(build_field("quadrupole", &[0.1, 0.01, 0.3]).is_ok());
    }

    #[test]
    fn rejects_bad_field_arguments() {
        let err = build_field("uniform", &[1.0]).err().expect("should fail");
        assert!(err.to_string().contains("takes 3 parameters"));
        assert!(build_field("solenoid", &[]).is_err());
        assert!(build_field("bend", &[0.5, 2.0, 1.0]).is_err());
        assert!(build_field("quadrupole", &[0.1, 0.0, 0.3]).is_err());
    }

    #[test]
    fn parses_step_methods() {
        assert_eq!(parse_method("taylor").unwrap(), StepMethod::Taylor);
        assert_eq!(parse_method("rk4").unwrap(), StepMethod::Rk4);
        assert!(parse_method("euler").is_err());
    }

    #[test]
    fn bend_field_is_confined_to_its_slab() {
        let field = build_field("bend", &[0.5, 0.0, 1.0]).unwrap();
        assert!(!field.partials(&Vector3::new(0.5, 0.0, 0.0)).is_absent());
        assert!(field.partials(&Vector3::new(1.5, 0.0, 0.0)).is_absent());
    }

    #[test]
    fn runs_particle_through_bend() {
        let mut tracker = WasmTracker::build("bend", &[0.5, 0.0, 1.0], "taylor").unwrap();
        tracker
            .update_particle(&[0.0, 0.0, 0.0, 0.0, 0.0, 1.0], 1.0)
            .unwrap();
        let trajectory = tracker.run(200, 0.01).unwrap();
        assert_eq!(trajectory.len(), 201);
        let last = trajectory.last().unwrap();
        assert!(last.position.y < 0.0, "particle should bend towards -y");
        assert_eq!(trajectory.to_flat_vec().len(), 201 * tracker.columns().len());
    }

    #[test]
    fn negative_step_count_is_rejected() {
        let tracker = WasmTracker::build("none", &[], "taylor").unwrap();
        let err = tracker.run(-1, 0.01).err().expect("should fail");
        assert_eq!(
            err.downcast_ref::<TrackError>(),
            Some(&TrackError::InvalidStepCount { requested: -1 })
        );
    }

    #[test]
    fn rejects_short_coordinate_arrays() {
        let mut tracker = WasmTracker::build("none", &[], "rk4").unwrap();
        assert!(tracker.update_particle(&[0.0; 5], 1.0).is_err());
    }
}
