//! Assertion helpers for `TestLoop` integration tests.

use crate::puzzle::Act;
use crate::signals::LoopSignal;

use super::TestLoop;

impl TestLoop {
    // -----------------------------------------------------------------------
    // Assertions
    // -----------------------------------------------------------------------

    pub fn assert_act(&self, expected: Act) {
        let act = self.act();
        assert_eq!(
            act,
            expected,
            "Expected {expected:?} after {} ticks, got {act:?}",
            self.ticks_run()
        );
    }

    /// The timeline never keeps more than one ghost or statue alive.
    pub fn assert_at_most_one_ghost(&mut self) {
        let count = self.ghost_count();
        assert!(count <= 1, "Expected at most one ghost, found {count}");
    }

    pub fn assert_signalled(&self, signal: &LoopSignal) {
        let signals = self.signals();
        assert!(
            signals.contains(signal),
            "Expected {signal:?} in journal, got {signals:?}"
        );
    }

    pub fn assert_debts(&self, expected: usize) {
        let pending = self.machine().debts().len();
        assert_eq!(pending, expected, "Expected {expected} pending debts, got {pending}");
    }
}
