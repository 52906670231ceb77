//! The Idle/Act1/Act2/Act3 time-projection loop.
//!
//! - **Act1** ("future self"): a statue marks where the player stood; the
//!   player's movement is recorded for `projection_time`.
//! - **Act2** ("past self"): the player is sent back beside the statue while a
//!   ghost replays Act1; this pass is recorded too and becomes a debt.
//! - **Act3** (repayment): when a debt falls due the current act is paused,
//!   the player is pulled back to the debt's origin and a ghost replays the
//!   Act2 recording. If that ghost cannot reach its recorded endpoint the
//!   timeline breaks (paradox). Otherwise the paused act resumes.

pub mod machine;
pub mod spawn;


pub use machine::{ParadoxFailure, PuzzleMachine, TickInput};
pub use spawn::safe_spawn_behind;

use serde::Serialize;

/// Which phase of the loop is active. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Act {
    #[default]
    Idle,
    Act1,
    Act2,
    Act3,
}

impl Act {
    /// Whether the time-projection effect should be on.
    pub fn is_projecting(self) -> bool {
        self != Act::Idle
    }
}
