//! Player input edges for the loop.
//!
//! Keys are sampled every frame in `Update` but the machine only runs in
//! `FixedUpdate`, so presses are latched in [`LoopInputQueue`] until the next
//! fixed tick consumes them. A press is never seen twice and never dropped
//! when several frames pass between fixed ticks.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopInput {
    /// Start a time projection.
    Trigger,
    /// Restart the level session.
    Reset,
}

/// Latched input edges waiting for the next fixed tick.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopInputQueue {
    trigger: bool,
    reset: bool,
}

impl LoopInputQueue {
    pub fn press(&mut self, input: LoopInput) {
        match input {
            LoopInput::Trigger => self.trigger = true,
            LoopInput::Reset => self.reset = true,
        }
    }

    /// Consume pending edges as `(trigger, reset)`.
    pub fn take(&mut self) -> (bool, bool) {
        let edges = (self.trigger, self.reset);
        *self = Self::default();
        edges
    }

    pub fn is_pending(&self, input: LoopInput) -> bool {
        match input {
            LoopInput::Trigger => self.trigger,
            LoopInput::Reset => self.reset,
        }
    }
}

/// Key bindings for the loop actions.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopKeys {
    pub trigger: KeyCode,
    pub reset: KeyCode,
}

impl Default for LoopKeys {
    fn default() -> Self {
        Self {
            trigger: KeyCode::KeyF,
            reset: KeyCode::KeyR,
        }
    }
}

/// Latch bound key presses.
///
/// Uses `Option<Res<ButtonInput<KeyCode>>>` so the system is a no-op when
/// Bevy's `InputPlugin` is absent (headless runs and tests).
pub fn capture_loop_keys(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    bindings: Res<LoopKeys>,
    mut queue: ResMut<LoopInputQueue>,
) {
    let Some(keys) = keys else {
        return;
    };
    if keys.just_pressed(bindings.trigger) {
        queue.press(LoopInput::Trigger);
    }
    if keys.just_pressed(bindings.reset) {
        queue.press(LoopInput::Reset);
    }
}
