pub mod config;
pub mod coordinates;
pub mod derivatives;
pub mod error;
pub mod field;
pub mod fields;
pub mod numeric;
pub mod solvers;
/// The `taylor_core` crate tracks charged particles through static magnetic
/// fields with a six-term Taylor expansion in arc length.
///
/// Key components:
/// - **Field**: `FieldPartials` (field value and partial derivatives up to fourth order) and `FieldPresence`.
/// - **Derivatives**: chain-rule field derivatives along the path and the Leibniz recursion for the velocity.
/// - **Solvers**: the Taylor `advance` step and an RK4 step for cross-checking.
/// - **Tracker**: the integration loop, cancellation and batch integration of independent particles.
pub mod tracker;
pub mod trajectory;
pub mod traits;

pub use config::{ConfigError, StepMethod, TrackerSettings};
pub use coordinates::{Coordinates, Particle};
pub use derivatives::{derive_field, derive_u, RigidityScaling, VelocityDerivatives};
pub use error::{IntegrationFailure, TrackError};
pub use field::{FieldPartials, FieldPresence};
pub use tracker::{integrate, integrate_many, CancellationToken, Tracker};
pub use trajectory::{Trajectory, TrajectoryRow, TrajectoryState};
pub use traits::{FieldEvaluator, RigidityUpdate, Unchanged};
