//! The tracking loop.
//!
//! Each step evaluates both fields at the current position, classifies them
//! once, computes the velocity derivatives and steps. Step `i + 1` depends on
//! the exact output of step `i`; parallelism exists only across particles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::config::{StepMethod, TrackerSettings};
use crate::coordinates::Particle;
use crate::derivatives::derive_u_for;
use crate::error::{IntegrationFailure, TrackError};
use crate::field::FieldPresence;
use crate::solvers::{advance, rk4_step};
use crate::trajectory::{Trajectory, TrajectoryState};
use crate::traits::{FieldEvaluator, RigidityUpdate, Unchanged};

/// Upper bound on the states reserved up front; longer runs grow on demand.
const RESERVED_STATES: usize = 1 << 16;

/// Cooperative cancellation flag, checked once per step.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Integrates particle trajectories with fixed settings and a rigidity
/// update strategy.
#[derive(Debug, Clone, Default)]
pub struct Tracker<R = Unchanged> {
    settings: TrackerSettings,
    rigidity_update: R,
}

impl Tracker<Unchanged> {
    pub fn new(settings: TrackerSettings) -> Self {
        Self {
            settings,
            rigidity_update: Unchanged,
        }
    }
}

impl<R> Tracker<R> {
    pub fn with_rigidity_update<R2: RigidityUpdate>(self, rigidity_update: R2) -> Tracker<R2> {
        Tracker {
            settings: self.settings,
            rigidity_update,
        }
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }
}

impl<R: RigidityUpdate> Tracker<R> {
    /// Integrates with the step count and step size from the settings.
    pub fn run<B, E>(
        &self,
        particle: &Particle,
        field_b: &B,
        field_e: &E,
    ) -> Result<Trajectory, IntegrationFailure>
    where
        B: FieldEvaluator + ?Sized,
        E: FieldEvaluator + ?Sized,
    {
        self.integrate(
            particle,
            field_b,
            field_e,
            self.settings.max_steps,
            self.settings.step_size,
        )
    }

    /// Returns `max_steps + 1` states: the initial one and one per step.
    pub fn integrate<B, E>(
        &self,
        particle: &Particle,
        field_b: &B,
        field_e: &E,
        max_steps: usize,
        step_size: f64,
    ) -> Result<Trajectory, IntegrationFailure>
    where
        B: FieldEvaluator + ?Sized,
        E: FieldEvaluator + ?Sized,
    {
        self.integrate_inner(particle, field_b, field_e, max_steps, step_size, None)
    }

    /// Like [`Tracker::integrate`], stopping with [`TrackError::Cancelled`]
    /// once `token` is cancelled.
    pub fn integrate_cancellable<B, E>(
        &self,
        particle: &Particle,
        field_b: &B,
        field_e: &E,
        max_steps: usize,
        step_size: f64,
        token: &CancellationToken,
    ) -> Result<Trajectory, IntegrationFailure>
    where
        B: FieldEvaluator + ?Sized,
        E: FieldEvaluator + ?Sized,
    {
        self.integrate_inner(particle, field_b, field_e, max_steps, step_size, Some(token))
    }

    /// Integrates every particle independently, one task each. Results are
    /// in input order.
    pub fn integrate_many<B, E>(
        &self,
        particles: &[Particle],
        field_b: &B,
        field_e: &E,
        max_steps: usize,
        step_size: f64,
    ) -> Vec<Result<Trajectory, IntegrationFailure>>
    where
        B: FieldEvaluator + Sync + ?Sized,
        E: FieldEvaluator + Sync + ?Sized,
        R: Sync,
    {
        debug!(particles = particles.len(), max_steps, step_size, "integrating batch");
        particles
            .par_iter()
            .map(|particle| self.integrate(particle, field_b, field_e, max_steps, step_size))
            .collect()
    }

    fn integrate_inner<B, E>(
        &self,
        particle: &Particle,
        field_b: &B,
        field_e: &E,
        max_steps: usize,
        step_size: f64,
        token: Option<&CancellationToken>,
    ) -> Result<Trajectory, IntegrationFailure>
    where
        B: FieldEvaluator + ?Sized,
        E: FieldEvaluator + ?Sized,
    {
        if !step_size.is_finite() {
            return Err(IntegrationFailure::new(
                0,
                TrackError::InvalidStepSize { step_size },
                Trajectory::default(),
            ));
        }

        debug!(max_steps, step_size, method = ?self.settings.method, "integrating trajectory");

        let reserved = max_steps.saturating_add(1).min(RESERVED_STATES);
        let mut trajectory = Trajectory::with_capacity(reserved);
        let mut state = TrajectoryState {
            position: particle.cartesian(),
            velocity: particle.unit_velocity(),
            rigidity: particle.rigidity,
        };
        trajectory.push(state);

        for step in 1..=max_steps {
            if token.is_some_and(CancellationToken::is_cancelled) {
                return Err(self.abort(step, TrackError::Cancelled, trajectory));
            }
            state = match self.step(&state, field_b, field_e, step_size) {
                Ok(next) => next,
                Err(kind) => return Err(self.abort(step, kind, trajectory)),
            };
            trace!(step, x = state.position.x, y = state.position.y, z = state.position.z);
            trajectory.push(state);
        }

        debug!(states = trajectory.len(), "trajectory complete");
        Ok(trajectory)
    }

    fn step<B, E>(
        &self,
        state: &TrajectoryState,
        field_b: &B,
        field_e: &E,
        step_size: f64,
    ) -> Result<TrajectoryState, TrackError>
    where
        B: FieldEvaluator + ?Sized,
        E: FieldEvaluator + ?Sized,
    {
        let b = field_b.partials(&state.position);
        let e = field_e.partials(&state.position);
        let presence = FieldPresence::classify(&b, &e);

        let (position, velocity) = match self.settings.method {
            StepMethod::Taylor => {
                let u_derivs = derive_u_for(
                    presence,
                    &b,
                    state.rigidity,
                    state.velocity,
                    self.settings.rigidity_scaling,
                )?;
                advance(&state.position, &u_derivs, step_size)
            }
            StepMethod::Rk4 => {
                if presence.has_electric() {
                    return Err(TrackError::UnsupportedFieldConfiguration { presence });
                }
                rk4_step(
                    field_b,
                    &b,
                    &state.position,
                    &state.velocity,
                    state.rigidity,
                    step_size,
                )?
            }
        };

        // Unreachable until an electric branch exists: both methods reject E above.
        let rigidity = if presence.has_electric() {
            self.rigidity_update
                .update(&state.velocity, state.rigidity, &e)
        } else {
            state.rigidity
        };

        Ok(TrajectoryState {
            position,
            velocity,
            rigidity,
        })
    }

    fn abort(&self, step: usize, kind: TrackError, partial: Trajectory) -> IntegrationFailure {
        warn!(step, error = %kind, "trajectory aborted");
        IntegrationFailure::new(step, kind, partial)
    }
}

/// Integrates one particle with default settings.
pub fn integrate<B, E>(
    particle: &Particle,
    field_b: &B,
    field_e: &E,
    max_steps: usize,
    step_size: f64,
) -> Result<Trajectory, IntegrationFailure>
where
    B: FieldEvaluator + ?Sized,
    E: FieldEvaluator + ?Sized,
{
    Tracker::new(TrackerSettings::default()).integrate(
        particle,
        field_b,
        field_e,
        max_steps,
        step_size,
    )
}

/// Integrates many particles with default settings.
pub fn integrate_many<B, E>(
    particles: &[Particle],
    field_b: &B,
    field_e: &E,
    max_steps: usize,
    step_size: f64,
) -> Vec<Result<Trajectory, IntegrationFailure>>
where
    B: FieldEvaluator + Sync + ?Sized,
    E: FieldEvaluator + Sync + ?Sized,
{
    Tracker::new(TrackerSettings::default()).integrate_many(
        particles,
        field_b,
        field_e,
        max_steps,
        step_size,
    )
}
