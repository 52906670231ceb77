//! Data-driven loop parameters.
//!
//! Every tunable of the time-projection loop lives in [`LoopParams`] so a
//! level can ship its own JSON overrides without recompilation. Durations are
//! in seconds of simulation time, distances in world units.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::TimelineError;

/// Tunables for recording, playback, debts and the paradox check.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopParams {
    /// Length of Act1, Act2 and Act3.
    pub projection_time: f32,
    /// Delay between the end of Act2 and the forced repayment.
    pub debt_time: f32,
    /// How far the repaying ghost may end from its recorded endpoint.
    pub paradox_threshold: f32,
    /// Remaining due-time below which the nearest debt raises a warning.
    pub debt_warning_threshold: f32,
    /// Fixed simulation step.
    pub fixed_dt: f32,
    /// Distance behind a reference pose used for teleport spawns.
    pub spawn_offset: f32,
    /// Clearance kept from a wall found behind the reference pose.
    pub spawn_wall_margin: f32,
    /// Length of the ghost's forward obstruction probe.
    pub ghost_probe_distance: f32,
    /// Steps shorter than this skip the obstruction probe.
    pub ghost_step_epsilon: f32,
    /// Slerp rate toward the sample orientation (per second).
    pub ghost_turn_rate: f32,
    /// Slerp rate toward the look-ahead orientation (per second).
    pub ghost_look_ahead_rate: f32,
    /// Per-recording sample cap.
    pub max_samples: usize,
}

impl Default for LoopParams {
    fn default() -> Self {
        Self {
            projection_time: 15.0,
            debt_time: 30.0,
            paradox_threshold: 2.0,
            debt_warning_threshold: 5.0,
            fixed_dt: 0.02,
            spawn_offset: 2.0,
            spawn_wall_margin: 0.5,
            ghost_probe_distance: 0.5,
            ghost_step_epsilon: 0.001,
            ghost_turn_rate: 10.0,
            ghost_look_ahead_rate: 20.0,
            max_samples: 30_000,
        }
    }
}

impl LoopParams {
    /// Parse overrides from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, TimelineError> {
        let params: LoopParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Serialize to pretty JSON (used to dump the effective config).
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }

    pub fn validate(&self) -> Result<(), TimelineError> {
        let positive = [
            ("projection_time", self.projection_time),
            ("debt_time", self.debt_time),
            ("fixed_dt", self.fixed_dt),
            ("ghost_probe_distance", self.ghost_probe_distance),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(TimelineError::InvalidParams(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        let non_negative = [
            ("paradox_threshold", self.paradox_threshold),
            ("debt_warning_threshold", self.debt_warning_threshold),
            ("spawn_offset", self.spawn_offset),
            ("spawn_wall_margin", self.spawn_wall_margin),
            ("ghost_step_epsilon", self.ghost_step_epsilon),
            ("ghost_turn_rate", self.ghost_turn_rate),
            ("ghost_look_ahead_rate", self.ghost_look_ahead_rate),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(TimelineError::InvalidParams(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        if self.max_samples == 0 {
            return Err(TimelineError::InvalidParams(
                "max_samples must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(LoopParams::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let params = LoopParams::from_json(r#"{ "projection_time": 4.0 }"#).unwrap();
        assert_eq!(params.projection_time, 4.0);
        assert_eq!(params.debt_time, LoopParams::default().debt_time);
    }

    #[test]
    fn test_rejects_non_positive_step() {
        let err = LoopParams::from_json(r#"{ "fixed_dt": 0.0 }"#).unwrap_err();
        assert!(matches!(err, TimelineError::InvalidParams(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = LoopParams::from_json("{ projection_time: ").unwrap_err();
        assert!(matches!(err, TimelineError::Config(_)));
    }

    #[test]
    fn test_json_roundtrip() {
        let params = LoopParams {
            paradox_threshold: 0.75,
            ..Default::default()
        };
        let back = LoopParams::from_json(&params.to_json()).unwrap();
        assert_eq!(back, params);
    }
}
