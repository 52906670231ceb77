//! # TestLoop: headless integration test harness for the timeline
//!
//! Wraps a `bevy::app::App` with `MinimalPlugins` + `TimelinePlugin` and a
//! single `LoopPlayer` entity, so tests can drive whole loops through the
//! real ECS systems without a window or renderer.

mod assertions;
mod queries;
mod setup;

use bevy::prelude::*;

use crate::collaborators::ActorKind;
use crate::ecs::{Collider, LoopPlayer, Velocity};
use crate::params::LoopParams;
use crate::TimelinePlugin;

/// Half extents of the player's box collider.
pub const PLAYER_HALF_EXTENTS: Vec3 = Vec3::new(0.3, 0.9, 0.3);

/// Parameters with quarter-second ticks and one-second acts, so every act is
/// exactly four ticks and all timers stay exact in f32.
pub fn quick_params() -> LoopParams {
    LoopParams {
        projection_time: 1.0,
        debt_time: 1.0,
        debt_warning_threshold: 0.5,
        fixed_dt: 0.25,
        ..Default::default()
    }
}

/// A headless Bevy App running the timeline for integration testing.
///
/// Use builder methods to place the player and scenery, then call `tick()` to
/// advance fixed steps and query/assert on the resulting state.
pub struct TestLoop {
    app: App,
    player: Entity,
}

impl Default for TestLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLoop {
    /// A loop with [`quick_params`] and the player at the origin facing `-Z`.
    pub fn new() -> Self {
        Self::with_params(quick_params())
    }

    pub fn with_params(params: LoopParams) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(TimelinePlugin { params });

        let player = app
            .world_mut()
            .spawn((
                LoopPlayer,
                Transform::default(),
                Velocity::default(),
                Collider {
                    half_extents: PLAYER_HALF_EXTENTS,
                    kind: ActorKind::Player,
                },
            ))
            .id();

        Self { app, player }
    }
}
