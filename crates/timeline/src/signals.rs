//! Observational outputs of the timeline.
//!
//! Nothing here feeds back into the state machine. Signals are emitted as
//! Bevy events for UI/FX consumers, mirrored into a bounded [`LoopJournal`]
//! for debugging and tests, and summarized every tick in [`LoopTelemetry`].

use std::collections::VecDeque;

use bevy::prelude::*;
use serde::Serialize;

use crate::debt::{DebtId, DebtUrgency};
use crate::puzzle::Act;

#[derive(Event, Debug, Clone, PartialEq)]
pub enum LoopSignal {
    ActChanged { from: Act, to: Act },
    DebtCreated { id: DebtId, due: f32, fingerprint: u32 },
    /// Countdown text for the nearest debt, sent every tick while warning.
    DebtWarning { seconds_left: f32 },
    DebtWarningCleared,
    DebtInterrupt { id: DebtId },
    DebtSettled { id: DebtId },
    /// Debug line between the ghost's end position and its recorded endpoint.
    ParadoxDistance { ghost: Vec3, target: Vec3, distance: f32 },
    /// Show the game-over panel; the simulation is frozen.
    GameOver { distance: f32 },
    /// Time-projection visual effect on/off.
    TimeFx { active: bool },
    SessionReset,
}

/// Max signals retained in the journal.
pub const JOURNAL_CAPACITY: usize = 512;

/// Rolling log of recent signals, tagged with the tick they fired on.
#[derive(Resource, Debug, Default)]
pub struct LoopJournal {
    entries: VecDeque<(u64, LoopSignal)>,
}

impl LoopJournal {
    pub fn push(&mut self, tick: u64, signal: LoopSignal) {
        if self.entries.len() >= JOURNAL_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back((tick, signal));
    }

    pub fn iter(&self) -> impl Iterator<Item = &(u64, LoopSignal)> {
        self.entries.iter()
    }

    pub fn signals(&self) -> impl Iterator<Item = &LoopSignal> {
        self.entries.iter().map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Read-only view of the machine for HUDs and debug overlays.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoopTelemetry {
    pub tick: u64,
    pub act: Act,
    pub timer: f32,
    pub pending_debts: usize,
    pub nearest_due: Option<f32>,
    pub urgency: DebtUrgency,
    pub session_paused: bool,
    pub ghost_frame: Option<usize>,
    pub recorded_samples: usize,
    pub paradox_distance: Option<f32>,
    pub frozen: bool,
}

impl LoopTelemetry {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}
