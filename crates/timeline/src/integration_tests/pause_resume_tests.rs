//! Interrupting a puzzle in flight and resuming it exactly.

use bevy::prelude::*;

use crate::collaborators::PrefabKind;
use crate::params::LoopParams;
use crate::puzzle::Act;
use crate::session::PausedSession;
use crate::test_harness::{quick_params, TestLoop};

fn finish_first_loop(lp: &mut TestLoop) {
    lp.trigger();
    lp.walk(Vec3::new(0.0, 0.0, -0.5), 3);
    lp.walk(Vec3::new(0.0, 0.0, -0.5), 4);
    lp.assert_act(Act::Idle);
    lp.assert_debts(1);
}

#[test]
fn act2_interrupted_by_older_debt_resumes_mid_playback() {
    let mut lp = TestLoop::with_params(LoopParams {
        debt_time: 2.0,
        ..quick_params()
    });
    finish_first_loop(&mut lp);

    // Second puzzle, sideways so the two loops are easy to tell apart.
    lp.trigger();
    lp.walk(Vec3::X, 3);
    lp.assert_act(Act::Act2);
    let future = lp.machine().future().clone();
    lp.walk(Vec3::X, 3);
    let past = lp.machine().recording();
    let frame = lp.machine().ghost_frame();
    let timer = lp.machine().timer();
    assert_eq!(frame, Some(3));

    lp.walk(Vec3::X, 1);
    lp.assert_act(Act::Act3);
    let interrupted_at = lp.machine().paused_session().map(PausedSession::player_pose);
    assert!(matches!(
        lp.machine().paused_session(),
        Some(PausedSession::Suspended(s)) if s.act == Act::Act2
    ));

    for _ in 0..3 {
        lp.tick(1);
        lp.assert_at_most_one_ghost();
    }
    lp.assert_act(Act::Act2);
    assert_eq!(lp.machine().future(), &future);
    assert_eq!(lp.machine().recording(), past);
    assert_eq!(lp.machine().ghost_frame(), frame);
    assert_eq!(lp.machine().timer(), timer);
    assert_eq!(Some(lp.player_pose()), interrupted_at);
    assert!(lp.machine().paused_session().is_none());

    let ghosts = lp.ghosts();
    assert_eq!(ghosts.len(), 1);
    assert_eq!(ghosts[0].1.prefab, PrefabKind::Ghost);
    assert_eq!(ghosts[0].2, future.samples()[3].position);

    lp.tick(1);
    lp.assert_act(Act::Idle);
    lp.assert_debts(1);
    assert_eq!(lp.machine().debts().iter().next().map(|d| d.id), Some(1));
}

#[test]
fn act1_interrupted_gets_its_statue_back() {
    let mut lp = TestLoop::with_params(LoopParams {
        debt_time: 0.75,
        ..quick_params()
    });
    finish_first_loop(&mut lp);

    lp.move_player(Vec3::new(3.0, 0.0, 0.0));
    lp.trigger();
    let statue_at = lp.machine().puzzle_start().position;
    lp.walk(Vec3::X, 1);
    lp.assert_act(Act::Act1);
    lp.walk(Vec3::X, 1);
    lp.assert_act(Act::Act3);
    assert!(lp.ghosts().iter().all(|(_, g, _)| g.prefab == PrefabKind::Ghost));

    lp.tick(3);
    lp.assert_act(Act::Act1);
    assert_eq!(lp.machine().timer(), 0.5);
    assert_eq!(lp.machine().recording().len(), 2);
    let ghosts = lp.ghosts();
    assert_eq!(ghosts.len(), 1);
    assert_eq!(ghosts[0].1.prefab, PrefabKind::Statue);
    assert_eq!(ghosts[0].2, statue_at);

    lp.walk(Vec3::X, 2);
    lp.assert_act(Act::Act2);
    assert_eq!(lp.machine().future().len(), 4);
}

#[test]
fn resume_without_snapshot_is_noop() {
    let mut lp = TestLoop::new();
    finish_first_loop(&mut lp);
    lp.tick(7);
    lp.assert_act(Act::Idle);
    assert!(lp.machine().paused_session().is_none());

    let before = lp.player_pose();
    let resumed = lp.world_mut().resource_scope(|world, mut machine: Mut<crate::PuzzleMachine>| {
        let mut stage = crate::WorldStage::new(world);
        machine.resume(&mut stage)
    });
    assert!(!resumed);
    lp.assert_act(Act::Idle);
    assert_eq!(lp.player_pose(), before);
}
