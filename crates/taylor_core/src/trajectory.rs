use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Position, unit velocity and rigidity at one point of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryState {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub rigidity: f64,
}

/// One row of the tabular trajectory output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRow {
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    #[serde(rename = "Z")]
    pub z: f64,
    #[serde(rename = "UX")]
    pub ux: f64,
    #[serde(rename = "UY")]
    pub uy: f64,
    #[serde(rename = "UZ")]
    pub uz: f64,
    #[serde(rename = "Brho")]
    pub brho: f64,
}

impl From<&TrajectoryState> for TrajectoryRow {
    fn from(state: &TrajectoryState) -> Self {
        Self {
            x: state.position.x,
            y: state.position.y,
            z: state.position.z,
            ux: state.velocity.x,
            uy: state.velocity.y,
            uz: state.velocity.z,
            brho: state.rigidity,
        }
    }
}

impl TrajectoryRow {
    pub fn to_array(&self) -> [f64; 7] {
        [self.x, self.y, self.z, self.ux, self.uy, self.uz, self.brho]
    }
}

/// States in step order: the initial state followed by one per step.
///
/// States are appended and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    states: Vec<TrajectoryState>,
}

impl Trajectory {
    pub const COLUMNS: [&'static str; 7] = ["X", "Y", "Z", "UX", "UY", "UZ", "Brho"];

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            states: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, state: TrajectoryState) {
        self.states.push(state);
    }

    pub fn states(&self) -> &[TrajectoryState] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn initial(&self) -> Option<&TrajectoryState> {
        self.states.first()
    }

    pub fn last(&self) -> Option<&TrajectoryState> {
        self.states.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrajectoryState> {
        self.states.iter()
    }

    pub fn rows(&self) -> Vec<TrajectoryRow> {
        self.states.iter().map(TrajectoryRow::from).collect()
    }

    /// Row-major table with [`Trajectory::COLUMNS`] as columns.
    pub fn to_flat_vec(&self) -> Vec<f64> {
        self.states
            .iter()
            .flat_map(|s| TrajectoryRow::from(s).to_array())
            .collect()
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a TrajectoryState;
    type IntoIter = std::slice::Iter<'a, TrajectoryState>;

    fn into_iter(self) -> Self::IntoIter {
        self.states.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Trajectory {
        let mut trajectory = Trajectory::with_capacity(2);
        trajectory.push(TrajectoryState {
            position: Vector3::new(1.0, 2.0, 3.0),
            velocity: Vector3::new(0.0, 0.0, 1.0),
            rigidity: 0.5,
        });
        trajectory.push(TrajectoryState {
            position: Vector3::new(4.0, 5.0, 6.0),
            velocity: Vector3::new(1.0, 0.0, 0.0),
            rigidity: 0.5,
        });
        trajectory
    }

    #[test]
    fn rows_keep_step_order() {
        let rows = sample().rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].to_array(), [1.0, 2.0, 3.0, 0.0, 0.0, 1.0, 0.5]);
        assert_eq!(rows[1].x, 4.0);
    }

    #[test]
    fn flat_table_is_row_major() {
        let flat = sample().to_flat_vec();
        assert_eq!(flat.len(), 2 * Trajectory::COLUMNS.len());
        assert_eq!(&flat[7..10], &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn rows_serialize_with_table_column_names() {
        let rows = sample().rows();
        let json = serde_json::to_value(&rows[0]).expect("row should serialize");
        for column in Trajectory::COLUMNS {
            assert!(json.get(column).is_some(), "missing column {column}");
        }
        assert_eq!(json["Brho"], 0.5);
    }

    #[test]
    fn accessors_report_ends() {
        let trajectory = sample();
        assert_eq!(trajectory.len(), 2);
        assert!(!trajectory.is_empty());
        assert_eq!(trajectory.initial().unwrap().position.x, 1.0);
        assert_eq!(trajectory.last().unwrap().position.x, 4.0);
        assert_eq!(trajectory.iter().count(), 2);
        assert!(Trajectory::default().is_empty());
    }
}
