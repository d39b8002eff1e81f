use std::path::Path;

use rigidframe_core::{vec3, PhysicsError, Vec3};
use rigidframe_dynamics::SleepSettings;
use serde::{Deserialize, Serialize};

/// Fixed at world creation. Capacities are hard ceilings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    pub max_bodies: usize,
    /// Broad-phase pairs per collision step.
    pub max_body_pairs: usize,
    /// Contact points per collision step.
    pub max_contact_constraints: usize,
    pub gravity: Vec3,
    /// Solver substeps per collision step.
    pub solver_substeps: u32,
    /// Contacts are generated this far before shapes touch.
    pub speculative_margin: f32,
    pub sleep: SleepSettings,
    /// `None` uses hardware parallelism minus one, at least one.
    pub worker_threads: Option<usize>,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            max_bodies: 1024,
            max_body_pairs: 1024,
            max_contact_constraints: 1024,
            gravity: vec3(0.0, -9.81, 0.0),
            solver_substeps: 8,
            speculative_margin: 0.02,
            sleep: SleepSettings::default(),
            worker_threads: None,
        }
    }
}

impl WorldSettings {
    pub fn with_capacity(mut self, bodies: usize, pairs: usize, contacts: usize) -> Self {
        self.max_bodies = bodies;
        self.max_body_pairs = pairs;
        self.max_contact_constraints = contacts;
        self
    }

    pub fn with_gravity(mut self, g: Vec3) -> Self { self.gravity = g; self }

    pub fn from_json_str(s: &str) -> Result<Self, PhysicsError> {
        let settings: Self = serde_json::from_str(s).map_err(|e| PhysicsError::InvalidConfiguration(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PhysicsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PhysicsError::InvalidConfiguration(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), PhysicsError> {
        let bad = |msg: &str| Err(PhysicsError::InvalidConfiguration(msg.to_string()));
        if self.max_bodies == 0 || self.max_body_pairs == 0 || self.max_contact_constraints == 0 {
            return bad("capacities must be non-zero");
        }
        if self.solver_substeps == 0 {
            return bad("solver_substeps must be at least 1");
        }
        if !self.gravity.is_finite() {
            return bad("gravity must be finite");
        }
        if !(self.speculative_margin >= 0.0 && self.speculative_margin.is_finite()) {
            return bad("speculative_margin must be a non-negative number");
        }
        if self.worker_threads == Some(0) {
            return bad("worker_threads must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let s = WorldSettings::from_json_str(r#"{ "max_bodies": 16, "gravity": [0.0, -0.4, 0.0] }"#).unwrap();
        assert_eq!(s.max_bodies, 16);
        assert_eq!(s.gravity, vec3(0.0, -0.4, 0.0));
        assert_eq!(s.max_body_pairs, 1024);
        assert_eq!(s.solver_substeps, 8);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = WorldSettings::from_json_str(r#"{ "max_contact_constraints": 0 }"#).unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidConfiguration(_)));
        assert!(WorldSettings::default().with_capacity(1, 0, 1).validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_configuration_error() {
        assert!(matches!(WorldSettings::from_json_str("{"), Err(PhysicsError::InvalidConfiguration(_))));
    }
}
