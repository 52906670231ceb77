//! Ghost player: replays a [`Trajectory`] on a spawned actor, one sample per
//! fixed tick.
//!
//! Before stepping, the ghost probes the segment toward its next sample. If
//! scenery is in the way (a closed door, say) it holds position and keeps
//! turning toward the recorded orientation, then resumes once the way clears.
//! Blocked ticks do not consume samples, so a ghost that was held up ends its
//! act short of its recorded endpoint; that gap is what the paradox check
//! measures.

use bevy::prelude::*;

use crate::collaborators::{ObstructionQuery, PoseSink};
use crate::error::TimelineError;
use crate::params::LoopParams;
use crate::pose::{flat_look_rotation, Pose};
use crate::trajectory::Trajectory;

/// Playback tunables, lifted from [`LoopParams`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GhostTuning {
    pub probe_distance: f32,
    pub step_epsilon: f32,
    pub turn_rate: f32,
    pub look_ahead_rate: f32,
}

impl Default for GhostTuning {
    fn default() -> Self {
        Self::from(&LoopParams::default())
    }
}

impl From<&LoopParams> for GhostTuning {
    fn from(params: &LoopParams) -> Self {
        Self {
            probe_distance: params.ghost_probe_distance,
            step_epsilon: params.ghost_step_epsilon,
            turn_rate: params.ghost_turn_rate,
            look_ahead_rate: params.ghost_look_ahead_rate,
        }
    }
}

/// Outcome of one [`GhostPlayer::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GhostStep {
    /// Moved onto the next sample.
    Advanced,
    /// Obstructed; only turned in place.
    Blocked,
    /// Cursor is past the last sample. The caller owns the actor's fate.
    Finished,
}

#[derive(Debug, Clone)]
pub struct GhostPlayer {
    trajectory: Trajectory,
    /// Index of the next sample to step onto.
    cursor: usize,
    pose: Pose,
    tuning: GhostTuning,
}

impl GhostPlayer {
    pub fn new(trajectory: Trajectory, tuning: GhostTuning) -> Result<Self, TimelineError> {
        let start = *trajectory.first().ok_or(TimelineError::EmptyTrajectory)?;
        Ok(Self {
            trajectory,
            cursor: 0,
            pose: start,
            tuning,
        })
    }

    /// Swap in a new trajectory and rewind to its first sample.
    pub fn initialize(&mut self, trajectory: Trajectory) -> Result<(), TimelineError> {
        let start = *trajectory.first().ok_or(TimelineError::EmptyTrajectory)?;
        self.trajectory = trajectory;
        self.cursor = 0;
        self.pose = start;
        Ok(())
    }

    /// Run one fixed tick of playback and push the resulting pose to `actor`.
    pub fn advance<S>(&mut self, stage: &mut S, actor: Entity, dt: f32) -> GhostStep
    where
        S: ObstructionQuery + PoseSink + ?Sized,
    {
        let Some(target) = self.trajectory.get(self.cursor).copied() else {
            return GhostStep::Finished;
        };

        let step = target.position - self.pose.position;
        let blocked = step.length() > self.tuning.step_epsilon
            && Dir3::new(step).is_ok_and(|dir| {
                stage
                    .raycast(self.pose.position, dir, self.tuning.probe_distance)
                    .is_some_and(|hit| hit.kind.blocks_ghost())
            });

        let outcome = if blocked {
            self.pose.rotation = self.pose.rotation.slerp(
                target.rotation,
                blend(self.tuning.turn_rate, dt),
            );
            GhostStep::Blocked
        } else {
            self.pose.rotation = match flat_look_rotation(step) {
                Some(look) => self
                    .pose
                    .rotation
                    .slerp(look, blend(self.tuning.look_ahead_rate, dt)),
                None => self
                    .pose
                    .rotation
                    .slerp(target.rotation, blend(self.tuning.turn_rate, dt)),
            };
            self.pose.position = target.position;
            self.cursor += 1;
            GhostStep::Advanced
        };

        stage.set_pose(actor, self.pose);
        outcome
    }

    /// Jump straight to sample `frame` (clamped into range), pose included.
    pub fn skip_to_frame<S>(&mut self, stage: &mut S, actor: Entity, frame: usize)
    where
        S: PoseSink + ?Sized,
    {
        let last = self.trajectory.len().saturating_sub(1);
        self.cursor = frame.min(last);
        if let Some(sample) = self.trajectory.get(self.cursor) {
            self.pose = *sample;
        }
        stage.set_pose(actor, self.pose);
    }

    pub fn current_frame(&self) -> usize {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.trajectory.len()
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }
}

/// Frame-rate independent slerp factor, clamped like an engine slerp.
fn blend(rate: f32, dt: f32) -> f32 {
    (rate * dt).clamp(0.0, 1.0)
}
