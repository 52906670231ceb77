//! Pause/resume snapshot taken when a debt interrupt pulls the player into
//! Act3.
//!
//! If the player was idle, only their pose is kept. If they were mid-puzzle,
//! the whole act is frozen: timer, both recordings, where the puzzle began and
//! how far the live ghost had got. Resuming puts all of it back, so the
//! interrupted act continues on the exact tick it left off.

use crate::pose::Pose;
use crate::puzzle::Act;
use crate::trajectory::Trajectory;

/// State of an Act1/Act2 that was interrupted.
#[derive(Debug, Clone, PartialEq)]
pub struct SuspendedAct {
    /// `Act::Act1` or `Act::Act2`.
    pub act: Act,
    pub timer: f32,
    /// Act1 recording (in progress if `act` is Act1).
    pub future: Trajectory,
    /// Act2 recording in progress (empty during Act1).
    pub past: Trajectory,
    /// Where the player stood when interrupted.
    pub player_pose: Pose,
    /// Act1 start pose (statue position).
    pub puzzle_start: Pose,
    /// Read cursor of the Act2 ghost, if one was still playing.
    pub ghost_cursor: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PausedSession {
    /// Interrupted while idle: only the return pose matters.
    Idle { player_pose: Pose },
    /// Interrupted mid-puzzle.
    Suspended(Box<SuspendedAct>),
}

impl PausedSession {
    pub fn was_idle(&self) -> bool {
        matches!(self, PausedSession::Idle { .. })
    }

    /// Pose the player returns to on resume.
    pub fn player_pose(&self) -> Pose {
        match self {
            PausedSession::Idle { player_pose } => *player_pose,
            PausedSession::Suspended(act) => act.player_pose,
        }
    }

    /// The act that will be resumed.
    pub fn resumes_into(&self) -> Act {
        match self {
            PausedSession::Idle { .. } => Act::Idle,
            PausedSession::Suspended(act) => act.act,
        }
    }
}
