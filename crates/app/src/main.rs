//! Headless demo: plays scripted loops through `TimelinePlugin` and prints
//! the final telemetry as JSON.
//!
//! `CLOSE_THE_LOOP_PARAMS=<file.json>` overrides loop parameters.
//! `--paradox` closes a door across each repayment path.

mod scripted_walk;

use bevy::log::LogPlugin;
use bevy::prelude::*;

use timeline::{
    ActorKind, Collider, LoopInput, LoopInputQueue, LoopJournal, LoopParams, LoopPlayer,
    LoopSignal, LoopTelemetry, PuzzleMachine, TimelinePlugin, Velocity,
};

use scripted_walk::ScriptedWalker;

const PARAMS_ENV: &str = "CLOSE_THE_LOOP_PARAMS";
const LOOPS: u32 = 2;
const WALK_SPEED: f32 = 2.0;

fn main() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(LogPlugin::default());

    let params = load_params();
    info!(
        "Projection {}s, debt {}s, paradox threshold {}m, tick {}s",
        params.projection_time, params.debt_time, params.paradox_threshold, params.fixed_dt
    );
    app.add_plugins(TimelinePlugin {
        params: params.clone(),
    });

    let player = app
        .world_mut()
        .spawn((
            LoopPlayer,
            Transform::default(),
            Velocity::default(),
            Collider {
                half_extents: Vec3::new(0.3, 0.9, 0.3),
                kind: ActorKind::Player,
            },
        ))
        .id();

    let close_doors = std::env::args().any(|arg| arg == "--paradox");
    let mut walker = ScriptedWalker::new(LOOPS, WALK_SPEED, close_doors);

    let per_loop = 2.0 * params.projection_time + params.debt_time + params.projection_time;
    let max_ticks = (per_loop * (LOOPS + 1) as f32 / params.fixed_dt).ceil() as u64;

    let mut ticks = 0;
    while ticks < max_ticks {
        let telemetry = app.world().resource::<LoopTelemetry>().clone();
        if walker.is_done(&telemetry) {
            break;
        }

        let decision = walker.decide(&telemetry);
        let world = app.world_mut();
        if decision.trigger {
            world.resource_mut::<LoopInputQueue>().press(LoopInput::Trigger);
        }
        if let Some(mut velocity) = world.get_mut::<Velocity>(player) {
            velocity.0 = decision.velocity;
        }
        if decision.close_door {
            close_door(world);
        }

        world.run_schedule(FixedUpdate);
        ticks += 1;
    }

    report(app.world(), ticks);
}

/// Read loop parameters from the JSON file named by `CLOSE_THE_LOOP_PARAMS`.
fn load_params() -> LoopParams {
    let Ok(path) = std::env::var(PARAMS_ENV) else {
        return LoopParams::default();
    };
    let json = match std::fs::read_to_string(&path) {
        Ok(json) => json,
        Err(e) => {
            warn!("Could not read {PARAMS_ENV}={path}: {e}; using defaults");
            return LoopParams::default();
        }
    };
    LoopParams::from_json(&json).unwrap_or_else(|e| {
        warn!("Ignoring {path}: {e}");
        LoopParams::default()
    })
}

/// Wall across the walkway between the Act2 start point and the statue.
fn close_door(world: &mut World) {
    let Some(start) = world
        .get_resource::<PuzzleMachine>()
        .map(PuzzleMachine::puzzle_start)
    else {
        return;
    };
    let center = start.position - start.flat_forward();
    info!("Closing door at {center}");
    world.spawn((
        Collider::scenery(Vec3::new(3.0, 2.0, 0.1)),
        Transform::from_translation(center),
    ));
}

fn report(world: &World, ticks: u64) {
    let journal = world.resource::<LoopJournal>();
    for (tick, signal) in journal.iter() {
        match signal {
            LoopSignal::DebtCreated { id, fingerprint, .. } => {
                info!("[{tick}] debt {id} created ({fingerprint:08x})")
            }
            LoopSignal::ParadoxDistance { distance, .. } => {
                info!("[{tick}] repayment ended {distance:.3}m from its mark")
            }
            LoopSignal::GameOver { distance } => error!("[{tick}] paradox at {distance:.3}m"),
            _ => {}
        }
    }

    let telemetry = world.resource::<LoopTelemetry>();
    info!("Session ended after {ticks} fixed ticks");
    println!("{}", telemetry.to_json());
}
