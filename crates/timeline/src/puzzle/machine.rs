use bevy::prelude::*;

use crate::collaborators::{PrefabKind, Stage};
use crate::debt::{DebtId, DebtRecord, DebtScheduler};
use crate::ghost::{GhostPlayer, GhostStep, GhostTuning};
use crate::params::LoopParams;
use crate::pose::Pose;
use crate::session::{PausedSession, SuspendedAct};
use crate::signals::{LoopSignal, LoopTelemetry};
use crate::trajectory::{Trajectory, TrajectoryRecorder};

use super::spawn::safe_spawn_behind;
use super::Act;

/// Everything the machine reads from the outside world for one fixed tick.
#[derive(Debug, Clone, Copy)]
pub struct TickInput {
    /// Player pose at the start of the tick.
    pub player_pose: Pose,
    /// Trigger edge (start a projection).
    pub trigger: bool,
    /// Reset edge (restart the session).
    pub reset: bool,
    /// Fixed step length.
    pub dt: f32,
}

/// Terminal failure raised when a repayment ghost ends too far from its
/// recorded endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParadoxFailure {
    pub debt: DebtId,
    pub distance: f32,
    pub ghost_position: Vec3,
    pub target: Vec3,
}

/// The one ghost body the machine may have alive.
#[derive(Debug, Clone)]
struct LiveGhost {
    actor: Entity,
    /// `None` for a statue.
    playback: Option<GhostPlayer>,
}

/// Owner of all temporal state for one player.
///
/// Drive it with [`PuzzleMachine::tick`] once per fixed step. The machine
/// owns the debt queue, the paused session and the handle of the single live
/// ghost; every spawn goes through one helper that destroys the previous
/// ghost first.
#[derive(Resource, Debug)]
pub struct PuzzleMachine {
    params: LoopParams,
    player: Entity,
    /// Level spawn pose, used by reset.
    spawn_pose: Pose,
    player_pose: Pose,
    act: Act,
    timer: f32,
    recorder: TrajectoryRecorder,
    /// Finished Act1 recording (valid from Act2 on).
    future: Trajectory,
    puzzle_start: Pose,
    ghost: Option<LiveGhost>,
    debts: DebtScheduler,
    paused: Option<PausedSession>,
    paradox: Option<ParadoxFailure>,
    last_paradox_distance: Option<f32>,
    warning_active: bool,
    outbox: Vec<LoopSignal>,
}

impl PuzzleMachine {
    pub fn new(params: LoopParams, player: Entity, player_pose: Pose) -> Self {
        let recorder = TrajectoryRecorder::new(params.max_samples);
        Self {
            params,
            player,
            spawn_pose: player_pose,
            player_pose,
            act: Act::Idle,
            timer: 0.0,
            recorder,
            future: Trajectory::default(),
            puzzle_start: player_pose,
            ghost: None,
            debts: DebtScheduler::default(),
            paused: None,
            paradox: None,
            last_paradox_distance: None,
            warning_active: false,
            outbox: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Fixed-step entry point
    // -----------------------------------------------------------------------

    /// Advance the loop by one fixed step.
    ///
    /// Order: input edges, then the debt queue (which may interrupt into
    /// Act3), then the active act. An act entered this tick also runs its
    /// first step this tick. A reset consumes the whole tick.
    pub fn tick<S: Stage + ?Sized>(&mut self, input: TickInput, stage: &mut S) {
        if input.reset {
            self.reset(stage);
            return;
        }
        if self.paradox.is_some() {
            return;
        }
        self.player_pose = input.player_pose;

        if input.trigger {
            self.try_start_act1(stage);
        }

        self.step_debts(input.dt, stage);
        self.step_act(input.dt, stage);
    }

    /// Start a projection if the loop is free to do so.
    pub fn try_start_act1<S: Stage + ?Sized>(&mut self, stage: &mut S) -> bool {
        if self.act != Act::Idle || self.paradox.is_some() {
            return false;
        }
        if self.debts.expired_earliest().is_some() {
            debug!("Trigger ignored: a debt interrupt is pending");
            return false;
        }
        self.start_act1(stage);
        true
    }

    /// Restart the session: drop every debt, ghost and snapshot and send the
    /// player back to the level spawn. Clears a paradox freeze.
    pub fn reset<S: Stage + ?Sized>(&mut self, stage: &mut S) {
        info!("Session reset");
        self.despawn_ghost(stage);
        self.recorder.clear();
        self.future = Trajectory::default();
        self.debts.clear();
        self.paused = None;
        self.paradox = None;
        self.last_paradox_distance = None;
        self.timer = 0.0;
        if self.warning_active {
            self.warning_active = false;
            self.outbox.push(LoopSignal::DebtWarningCleared);
        }
        self.teleport_player(stage, self.spawn_pose);
        self.set_act(Act::Idle);
        self.outbox.push(LoopSignal::SessionReset);
    }

    // -----------------------------------------------------------------------
    // Debt queue
    // -----------------------------------------------------------------------

    fn step_debts<S: Stage + ?Sized>(&mut self, dt: f32, stage: &mut S) {
        self.debts.tick(dt);

        match self.debts.nearest_due() {
            Some(due) if due < self.params.debt_warning_threshold => {
                self.warning_active = true;
                self.outbox.push(LoopSignal::DebtWarning {
                    seconds_left: due.max(0.0),
                });
            }
            _ if self.warning_active => {
                self.warning_active = false;
                self.outbox.push(LoopSignal::DebtWarningCleared);
            }
            _ => {}
        }

        if self.act == Act::Act3 {
            return;
        }
        if let Some(record) = self.debts.expired_earliest().cloned() {
            self.interrupt(record, stage);
        }
    }

    /// Suspend whatever is running and start repaying `record`.
    fn interrupt<S: Stage + ?Sized>(&mut self, record: DebtRecord, stage: &mut S) {
        info!(
            "Debt {} due: repaying trajectory {:08x} ({} samples), interrupting {:?}",
            record.id,
            record.trajectory.fingerprint(),
            record.trajectory.len(),
            self.act
        );
        self.outbox.push(LoopSignal::DebtInterrupt { id: record.id });

        self.paused = Some(self.save());
        self.despawn_ghost(stage);
        self.recorder.clear();
        self.debts.mark_in_repayment(record.id);

        let spawn = safe_spawn_behind(
            record.origin,
            self.params.spawn_offset,
            self.params.spawn_wall_margin,
            stage,
        );
        self.teleport_player(stage, spawn);
        self.spawn_playback(stage, record.trajectory);

        self.timer = self.params.projection_time;
        self.set_act(Act::Act3);
    }

    // -----------------------------------------------------------------------
    // Acts
    // -----------------------------------------------------------------------

    fn step_act<S: Stage + ?Sized>(&mut self, dt: f32, stage: &mut S) {
        match self.act {
            Act::Idle => {}
            Act::Act1 => {
                self.recorder.sample(self.player_pose);
                if self.count_down(dt) {
                    self.finish_act1(stage);
                }
            }
            Act::Act2 => {
                self.recorder.sample(self.player_pose);
                if let Some(step) = self.advance_ghost(dt, stage) {
                    let finished = step == GhostStep::Finished
                        || self.ghost_playback().is_some_and(GhostPlayer::is_finished);
                    if finished {
                        debug!("Act2 ghost reached the end of its recording");
                        self.despawn_ghost(stage);
                    }
                }
                if self.count_down(dt) {
                    self.finish_act2(stage);
                }
            }
            Act::Act3 => {
                // A ghost that runs out of samples early stays parked on its
                // last pose for the paradox check.
                self.advance_ghost(dt, stage);
                if self.count_down(dt) {
                    self.finish_act3(stage);
                }
            }
        }
    }

    /// Decrement the act timer; true once it has run out.
    fn count_down(&mut self, dt: f32) -> bool {
        self.timer -= dt;
        self.timer <= 0.0
    }

    fn start_act1<S: Stage + ?Sized>(&mut self, stage: &mut S) {
        info!("Act1: projecting forward from {}", self.player_pose.position);
        self.puzzle_start = self.player_pose;
        self.spawn_statue(stage, self.puzzle_start);
        self.future = Trajectory::default();
        self.recorder.start();
        self.timer = self.params.projection_time;
        self.set_act(Act::Act1);
    }

    fn finish_act1<S: Stage + ?Sized>(&mut self, stage: &mut S) {
        self.future = self.recorder.stop();
        info!(
            "Act1 done: {} samples recorded, returning to the statue",
            self.future.len()
        );
        let beside_statue = safe_spawn_behind(
            self.puzzle_start,
            self.params.spawn_offset,
            self.params.spawn_wall_margin,
            stage,
        );
        self.teleport_player(stage, beside_statue);
        self.despawn_ghost(stage);
        self.start_act2(stage);
    }

    fn start_act2<S: Stage + ?Sized>(&mut self, stage: &mut S) {
        self.recorder.start();
        self.spawn_playback(stage, self.future.clone());
        self.timer = self.params.projection_time;
        self.set_act(Act::Act2);
    }

    fn finish_act2<S: Stage + ?Sized>(&mut self, stage: &mut S) {
        self.despawn_ghost(stage);
        let past = self.recorder.stop();
        if past.is_empty() {
            warn!("Act2 ended with an empty recording; no debt created");
        } else {
            let fingerprint = past.fingerprint();
            let due = self.params.debt_time;
            let id = self.debts.push(due, self.puzzle_start, past);
            info!("Act2 done: debt {id} ({fingerprint:08x}) due in {due}s");
            self.outbox.push(LoopSignal::DebtCreated {
                id,
                due,
                fingerprint,
            });
        }
        self.timer = 0.0;
        self.set_act(Act::Idle);
    }

    fn finish_act3<S: Stage + ?Sized>(&mut self, stage: &mut S) {
        let debt_id = self.debts.in_repayment();
        let target = debt_id
            .and_then(|id| self.debts.get(id))
            .and_then(|record| record.trajectory.last())
            .map(|pose| pose.position);
        let ghost_position = self
            .ghost
            .as_ref()
            .filter(|ghost| stage.exists(ghost.actor))
            .and_then(|ghost| ghost.playback.as_ref())
            .map(|playback| playback.pose().position);

        match (ghost_position, target) {
            (Some(ghost), Some(target)) => {
                let distance = ghost.distance(target);
                info!("Paradox variance: {distance:.3}m");
                self.last_paradox_distance = Some(distance);
                self.outbox.push(LoopSignal::ParadoxDistance {
                    ghost,
                    target,
                    distance,
                });
                if distance > self.params.paradox_threshold {
                    error!(
                        "PARADOX: ghost ended {distance:.3}m from its recorded endpoint (limit {})",
                        self.params.paradox_threshold
                    );
                    self.paradox = Some(ParadoxFailure {
                        debt: debt_id.unwrap_or_default(),
                        distance,
                        ghost_position: ghost,
                        target,
                    });
                    self.outbox.push(LoopSignal::GameOver { distance });
                    return;
                }
            }
            _ => warn!("Act3 ended without a live ghost; skipping paradox check"),
        }

        info!("Act3 done: loop closed");
        self.despawn_ghost(stage);
        if let Some(id) = debt_id {
            self.debts.remove(id);
            self.outbox.push(LoopSignal::DebtSettled { id });
        }
        if !self.resume(stage) {
            self.timer = 0.0;
            self.set_act(Act::Idle);
        }
    }

    // -----------------------------------------------------------------------
    // Pause / resume
    // -----------------------------------------------------------------------

    /// Snapshot the live state as a [`PausedSession`].
    pub fn save(&self) -> PausedSession {
        match self.act {
            Act::Idle => PausedSession::Idle {
                player_pose: self.player_pose,
            },
            Act::Act1 => PausedSession::Suspended(Box::new(SuspendedAct {
                act: Act::Act1,
                timer: self.timer,
                future: self.recorder.snapshot(),
                past: Trajectory::default(),
                player_pose: self.player_pose,
                puzzle_start: self.puzzle_start,
                ghost_cursor: None,
            })),
            Act::Act2 => PausedSession::Suspended(Box::new(SuspendedAct {
                act: Act::Act2,
                timer: self.timer,
                future: self.future.clone(),
                past: self.recorder.snapshot(),
                player_pose: self.player_pose,
                puzzle_start: self.puzzle_start,
                ghost_cursor: self.ghost_playback().map(GhostPlayer::current_frame),
            })),
            Act::Act3 => {
                debug_assert!(false, "Act3 cannot be suspended");
                PausedSession::Idle {
                    player_pose: self.player_pose,
                }
            }
        }
    }

    /// Restore the paused session, if any. Returns `false` (and does nothing)
    /// when there is nothing to resume.
    pub fn resume<S: Stage + ?Sized>(&mut self, stage: &mut S) -> bool {
        let Some(session) = self.paused.take() else {
            return false;
        };
        self.despawn_ghost(stage);

        match session {
            PausedSession::Idle { player_pose } => {
                info!("Resuming idle play");
                self.teleport_player(stage, player_pose);
                self.recorder.clear();
                self.timer = 0.0;
                self.set_act(Act::Idle);
            }
            PausedSession::Suspended(suspended) => {
                let SuspendedAct {
                    act,
                    timer,
                    future,
                    past,
                    player_pose,
                    puzzle_start,
                    ghost_cursor,
                } = *suspended;
                info!("Resuming {act:?} with {timer:.2}s left");

                self.teleport_player(stage, player_pose);
                self.puzzle_start = puzzle_start;
                self.timer = timer;
                match act {
                    Act::Act1 => {
                        self.future = Trajectory::default();
                        self.recorder.resume_from(&future);
                        self.spawn_statue(stage, puzzle_start);
                    }
                    Act::Act2 => {
                        self.future = future;
                        self.recorder.resume_from(&past);
                        if let Some(cursor) = ghost_cursor {
                            self.spawn_playback(stage, self.future.clone());
                            if let Some(ghost) = self.ghost.as_mut() {
                                if let Some(playback) = ghost.playback.as_mut() {
                                    playback.skip_to_frame(stage, ghost.actor, cursor);
                                }
                            }
                        }
                    }
                    Act::Idle | Act::Act3 => {
                        warn!("Paused session tagged {act:?}; resuming as idle");
                        self.recorder.clear();
                    }
                }
                let resumed = if matches!(act, Act::Act1 | Act::Act2) {
                    act
                } else {
                    Act::Idle
                };
                self.set_act(resumed);
            }
        }
        true
    }

    // -----------------------------------------------------------------------
    // Ghost ownership
    // -----------------------------------------------------------------------

    fn spawn_statue<S: Stage + ?Sized>(&mut self, stage: &mut S, pose: Pose) {
        self.despawn_ghost(stage);
        let actor = stage.spawn(PrefabKind::Statue, pose);
        stage.make_kinematic(actor);
        self.ghost = Some(LiveGhost {
            actor,
            playback: None,
        });
    }

    fn spawn_playback<S: Stage + ?Sized>(&mut self, stage: &mut S, trajectory: Trajectory) {
        self.despawn_ghost(stage);
        let playback = match GhostPlayer::new(trajectory, GhostTuning::from(&self.params)) {
            Ok(playback) => playback,
            Err(e) => {
                warn!("Not spawning ghost: {e}");
                return;
            }
        };
        let actor = stage.spawn(PrefabKind::Ghost, playback.pose());
        stage.make_kinematic(actor);
        self.ghost = Some(LiveGhost {
            actor,
            playback: Some(playback),
        });
    }

    fn despawn_ghost<S: Stage + ?Sized>(&mut self, stage: &mut S) {
        if let Some(ghost) = self.ghost.take() {
            if stage.exists(ghost.actor) {
                stage.destroy(ghost.actor);
            }
        }
    }

    /// Step the playback ghost, dropping the handle if the actor vanished.
    fn advance_ghost<S: Stage + ?Sized>(&mut self, dt: f32, stage: &mut S) -> Option<GhostStep> {
        let ghost = self.ghost.as_mut()?;
        if !stage.exists(ghost.actor) {
            warn!("Ghost {:?} was destroyed externally", ghost.actor);
            self.ghost = None;
            return None;
        }
        let playback = ghost.playback.as_mut()?;
        Some(playback.advance(stage, ghost.actor, dt))
    }

    fn ghost_playback(&self) -> Option<&GhostPlayer> {
        self.ghost.as_ref().and_then(|ghost| ghost.playback.as_ref())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn teleport_player<S: Stage + ?Sized>(&mut self, stage: &mut S, pose: Pose) {
        stage.zero_velocity(self.player);
        stage.set_pose(self.player, pose);
        self.player_pose = pose;
    }

    fn set_act(&mut self, to: Act) {
        let from = self.act;
        if from == to {
            return;
        }
        debug!("Act {from:?} -> {to:?}");
        self.act = to;
        self.outbox.push(LoopSignal::ActChanged { from, to });
        if from.is_projecting() != to.is_projecting() {
            self.outbox.push(LoopSignal::TimeFx {
                active: to.is_projecting(),
            });
        }
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    /// Take every signal emitted since the last drain.
    pub fn drain_signals(&mut self) -> Vec<LoopSignal> {
        std::mem::take(&mut self.outbox)
    }

    pub fn telemetry(&self, tick: u64) -> LoopTelemetry {
        LoopTelemetry {
            tick,
            act: self.act,
            timer: self.timer.max(0.0),
            pending_debts: self.debts.len(),
            nearest_due: self.debts.nearest_due(),
            urgency: self.debts.urgency(self.params.debt_warning_threshold),
            session_paused: self.paused.is_some(),
            ghost_frame: self.ghost_frame(),
            recorded_samples: self.recorder.len(),
            paradox_distance: self.last_paradox_distance,
            frozen: self.paradox.is_some(),
        }
    }

    pub fn act(&self) -> Act {
        self.act
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn params(&self) -> &LoopParams {
        &self.params
    }

    pub fn player(&self) -> Entity {
        self.player
    }

    pub fn player_pose(&self) -> Pose {
        self.player_pose
    }

    pub fn spawn_pose(&self) -> Pose {
        self.spawn_pose
    }

    pub fn puzzle_start(&self) -> Pose {
        self.puzzle_start
    }

    pub fn debts(&self) -> &DebtScheduler {
        &self.debts
    }

    /// Replace the debt queue (checkpoint restore). Only valid while idle.
    pub fn restore_debts(&mut self, records: Vec<DebtRecord>, next_id: DebtId) -> bool {
        if !self.is_quiescent() {
            return false;
        }
        self.debts.replace(records, next_id);
        true
    }

    pub fn paused_session(&self) -> Option<&PausedSession> {
        self.paused.as_ref()
    }

    pub fn paradox(&self) -> Option<&ParadoxFailure> {
        self.paradox.as_ref()
    }

    pub fn is_frozen(&self) -> bool {
        self.paradox.is_some()
    }

    /// Idle with nothing suspended: safe to checkpoint.
    pub fn is_quiescent(&self) -> bool {
        self.act == Act::Idle && self.paused.is_none() && self.paradox.is_none()
    }

    pub fn ghost_actor(&self) -> Option<Entity> {
        self.ghost.as_ref().map(|ghost| ghost.actor)
    }

    /// Whether the live ghost (if any) is the motionless Act1 statue.
    pub fn ghost_is_statue(&self) -> bool {
        self.ghost
            .as_ref()
            .is_some_and(|ghost| ghost.playback.is_none())
    }

    pub fn ghost_frame(&self) -> Option<usize> {
        self.ghost_playback().map(GhostPlayer::current_frame)
    }

    pub fn ghost_pose(&self) -> Option<Pose> {
        self.ghost_playback().map(GhostPlayer::pose)
    }

    /// Finished Act1 recording (empty until Act1 completes).
    pub fn future(&self) -> &Trajectory {
        &self.future
    }

    /// Copy of the recording in progress.
    pub fn recording(&self) -> Trajectory {
        self.recorder.snapshot()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }
}
