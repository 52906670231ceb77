//! Carrying debts across a scene transition with `TimelineCheckpoint`.

use bevy::prelude::*;

use crate::error::TimelineError;
use crate::params::LoopParams;
use crate::puzzle::{Act, PuzzleMachine};
use crate::test_harness::{quick_params, TestLoop};
use crate::TimelineCheckpoint;

fn loop_with_debt() -> TestLoop {
    let mut lp = TestLoop::with_params(LoopParams {
        debt_time: 2.0,
        ..quick_params()
    });
    lp.trigger();
    lp.walk(Vec3::new(0.0, 0.0, -0.5), 7);
    lp.assert_act(Act::Idle);
    lp
}

#[test]
fn capture_refused_mid_act() {
    let mut lp = TestLoop::new();
    lp.trigger();
    let err = TimelineCheckpoint::capture(lp.machine()).unwrap_err();
    assert!(matches!(err, TimelineError::NotQuiescent));
}

#[test]
fn debt_survives_scene_transition() {
    let mut old_scene = loop_with_debt();
    old_scene.tick(2);
    let bytes = TimelineCheckpoint::capture(old_scene.machine())
        .unwrap()
        .to_bytes();
    let fingerprint = old_scene
        .machine()
        .debts()
        .iter()
        .next()
        .map(|d| d.trajectory.fingerprint());

    let mut new_scene = TestLoop::with_params(LoopParams {
        debt_time: 2.0,
        ..quick_params()
    });
    new_scene.tick(1);
    let checkpoint = TimelineCheckpoint::from_bytes(&bytes).unwrap();
    let restored = new_scene
        .world_mut()
        .resource_scope(|_, mut machine: Mut<PuzzleMachine>| checkpoint.apply(&mut machine));
    assert_eq!(restored.unwrap(), 1);
    assert_eq!(
        new_scene
            .machine()
            .debts()
            .iter()
            .next()
            .map(|d| d.trajectory.fingerprint()),
        fingerprint
    );

    // Two idle ticks after the debt was created left 1.5s on the clock.
    assert_eq!(new_scene.machine().debts().nearest_due(), Some(1.5));
    new_scene.tick(5);
    new_scene.assert_act(Act::Idle);
    new_scene.tick(1);
    new_scene.assert_act(Act::Act3);
    new_scene.tick(3);
    new_scene.assert_act(Act::Idle);
    new_scene.assert_debts(0);
}

#[test]
fn corrupted_checkpoint_is_rejected() {
    let lp = loop_with_debt();
    let mut bytes = TimelineCheckpoint::capture(lp.machine()).unwrap().to_bytes();
    bytes[20] ^= 0x55;
    assert!(matches!(
        TimelineCheckpoint::from_bytes(&bytes),
        Err(TimelineError::ChecksumMismatch { .. })
    ));
}
