//! Integration tests for the timeline using the `TestLoop` harness.
//!
//! These spin up a headless Bevy App with `TimelinePlugin` and drive whole
//! loops through the real fixed-step systems and the ECS-backed stage.

mod checkpoint_tests;
mod pause_resume_tests;

use bevy::prelude::*;

use crate::params::LoopParams;
use crate::puzzle::Act;
use crate::test_harness::TestLoop;
use crate::{LoopTelemetry, TickCounter};

// ===========================================================================
// Harness bootstrap
// ===========================================================================

#[test]
fn machine_binds_on_first_tick() {
    let mut lp = TestLoop::new();
    assert!(lp.world_mut().get_resource::<crate::PuzzleMachine>().is_none());
    lp.tick(1);
    assert_eq!(lp.machine().player(), lp.player());
    assert_eq!(lp.ticks_run(), 1);
    lp.assert_act(Act::Idle);
}

#[test]
fn plugin_sets_fixed_timestep() {
    let mut lp = TestLoop::new();
    let step = lp.world_mut().resource::<Time<Fixed>>().timestep();
    assert_eq!(step.as_secs_f32(), 0.25);
}

#[test]
fn invalid_params_fall_back_to_defaults() {
    let mut lp = TestLoop::with_params(LoopParams {
        fixed_dt: -1.0,
        ..Default::default()
    });
    assert_eq!(*lp.world_mut().resource::<LoopParams>(), LoopParams::default());
}

#[test]
fn no_player_means_no_machine() {
    let mut lp = TestLoop::new();
    let player = lp.player();
    lp.world_mut().despawn(player);
    lp.tick(3);
    assert!(lp.world_mut().get_resource::<crate::PuzzleMachine>().is_none());
    assert_eq!(lp.world_mut().resource::<TickCounter>().0, 3);
}

#[test]
fn telemetry_is_refreshed_every_tick() {
    let mut lp = TestLoop::new();
    lp.trigger();
    lp.tick(1);
    let telemetry = lp.telemetry();
    assert_eq!(telemetry.tick, 2);
    assert_eq!(telemetry.act, Act::Act1);
    assert_eq!(telemetry.timer, 0.5);
    assert_ne!(telemetry, LoopTelemetry::default());
}

#[test]
fn velocity_moves_player_before_sampling() {
    let mut lp = TestLoop::new();
    lp.set_player_velocity(Vec3::new(0.0, 0.0, -2.0));
    lp.trigger();
    lp.tick(1);
    let recording = lp.machine().recording();
    assert_eq!(recording.len(), 2);
    assert_eq!(recording.samples()[0].position, Vec3::new(0.0, 0.0, -0.5));
    assert_eq!(recording.samples()[1].position, Vec3::new(0.0, 0.0, -1.0));
}
