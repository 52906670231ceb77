//! Scripted stand-in for a human player.
//!
//! Each fixed tick the walker looks at the timeline telemetry from the
//! previous tick and decides what to press and how to move: trigger when
//! idle and debt-free, walk forward while projecting, stand still otherwise.

use bevy::prelude::*;

use timeline::{Act, LoopTelemetry};

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Decision {
    pub trigger: bool,
    pub velocity: Vec3,
    /// Close a door across the path the next repayment ghost will take.
    pub close_door: bool,
}

#[derive(Debug)]
pub struct ScriptedWalker {
    loops: u32,
    started: u32,
    speed: f32,
    close_doors: bool,
    last_act: Act,
}

impl ScriptedWalker {
    pub fn new(loops: u32, speed: f32, close_doors: bool) -> Self {
        Self {
            loops,
            started: 0,
            speed,
            close_doors,
            last_act: Act::Idle,
        }
    }

    pub fn decide(&mut self, telemetry: &LoopTelemetry) -> Decision {
        let mut decision = Decision::default();
        match telemetry.act {
            Act::Idle => {
                decision.close_door = self.close_doors && self.last_act == Act::Act2;
                if telemetry.pending_debts == 0 && self.started < self.loops {
                    decision.trigger = true;
                    self.started += 1;
                }
            }
            Act::Act1 | Act::Act2 => decision.velocity = Vec3::NEG_Z * self.speed,
            Act::Act3 => {}
        }
        self.last_act = telemetry.act;
        decision
    }

    /// All loops played and repaid, or the session broke.
    pub fn is_done(&self, telemetry: &LoopTelemetry) -> bool {
        telemetry.frozen
            || (self.started >= self.loops
                && telemetry.act == Act::Idle
                && telemetry.pending_debts == 0)
    }
}
