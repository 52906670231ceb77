//! Debt scheduler: pending repayment obligations created when Act2 ends.
//!
//! Each debt carries the Act2 ("past") recording and the pose where the
//! puzzle began. Every tick all due-timers count down independently. The
//! nearest one drives an observational warning once it is under
//! `debt_warning_threshold`, and any debt reaching zero forces the machine
//! into Act3 to replay it.
//!
//! Warning levels:
//!
//! - **Calm**: nothing due soon (or no debts)
//! - **Warning**: nearest debt under the threshold
//! - **Overdue**: nearest debt at or below zero, waiting for its interrupt

use std::collections::VecDeque;

use serde::Serialize;

use crate::pose::Pose;
use crate::trajectory::Trajectory;

/// Stable identifier of a debt for its whole lifetime.
pub type DebtId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct DebtRecord {
    pub id: DebtId,
    /// Seconds until the debt forces a repayment.
    pub due: f32,
    /// Act1 start pose of the puzzle that created the debt.
    pub origin: Pose,
    /// The Act2 recording the repayment ghost will replay.
    pub trajectory: Trajectory,
}

impl DebtRecord {
    pub fn is_expired(&self) -> bool {
        self.due <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DebtUrgency {
    #[default]
    Calm,
    Warning,
    Overdue,
}

impl DebtUrgency {
    pub fn from_due(due: Option<f32>, warning_threshold: f32) -> Self {
        match due {
            None => DebtUrgency::Calm,
            Some(d) if d <= 0.0 => DebtUrgency::Overdue,
            Some(d) if d < warning_threshold => DebtUrgency::Warning,
            Some(_) => DebtUrgency::Calm,
        }
    }
}

/// FIFO queue of debts, ordered by creation.
#[derive(Debug, Clone, Default)]
pub struct DebtScheduler {
    records: VecDeque<DebtRecord>,
    next_id: DebtId,
    /// Debt currently being repaid; excluded from expiry selection.
    in_repayment: Option<DebtId>,
}

impl DebtScheduler {
    /// Enqueue a new obligation and return its id.
    pub fn push(&mut self, due: f32, origin: Pose, trajectory: Trajectory) -> DebtId {
        let id = self.next_id;
        self.next_id += 1;
        self.records.push_back(DebtRecord {
            id,
            due,
            origin,
            trajectory,
        });
        id
    }

    /// Count every due-timer down by `dt`.
    pub fn tick(&mut self, dt: f32) {
        for record in self.records.iter_mut() {
            record.due -= dt;
        }
    }

    /// The expired debt with the smallest due-time (oldest first on ties),
    /// excluding the one already being repaid.
    pub fn expired_earliest(&self) -> Option<&DebtRecord> {
        self.records
            .iter()
            .filter(|r| r.is_expired() && Some(r.id) != self.in_repayment)
            .fold(None, |best: Option<&DebtRecord>, r| match best {
                Some(b) if b.due <= r.due => Some(b),
                _ => Some(r),
            })
    }

    /// Smallest due-time among debts not currently being repaid.
    pub fn nearest_due(&self) -> Option<f32> {
        self.records
            .iter()
            .filter(|r| Some(r.id) != self.in_repayment)
            .map(|r| r.due)
            .reduce(f32::min)
    }

    pub fn urgency(&self, warning_threshold: f32) -> DebtUrgency {
        DebtUrgency::from_due(self.nearest_due(), warning_threshold)
    }

    pub fn mark_in_repayment(&mut self, id: DebtId) {
        self.in_repayment = Some(id);
    }

    pub fn in_repayment(&self) -> Option<DebtId> {
        self.in_repayment
    }

    pub fn get(&self, id: DebtId) -> Option<&DebtRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Remove a settled debt. Clears the repayment mark if it was this one.
    pub fn remove(&mut self, id: DebtId) -> Option<DebtRecord> {
        if self.in_repayment == Some(id) {
            self.in_repayment = None;
        }
        let index = self.records.iter().position(|r| r.id == id)?;
        self.records.remove(index)
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.in_repayment = None;
    }

    /// Replace the queue wholesale (checkpoint restore).
    pub fn replace(&mut self, records: Vec<DebtRecord>, next_id: DebtId) {
        let floor = records.iter().map(|r| r.id + 1).max().unwrap_or(0);
        self.records = records.into();
        self.next_id = next_id.max(floor);
        self.in_repayment = None;
    }

    pub fn next_id(&self) -> DebtId {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DebtRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use super::*;

    fn path() -> Trajectory {
        vec![Pose::at(Vec3::ZERO), Pose::at(Vec3::X)].into()
    }

    #[test]
    fn test_urgency_from_due() {
        assert_eq!(DebtUrgency::from_due(None, 5.0), DebtUrgency::Calm);
        assert_eq!(DebtUrgency::from_due(Some(10.0), 5.0), DebtUrgency::Calm);
        assert_eq!(DebtUrgency::from_due(Some(5.0), 5.0), DebtUrgency::Calm);
        assert_eq!(DebtUrgency::from_due(Some(4.9), 5.0), DebtUrgency::Warning);
        assert_eq!(DebtUrgency::from_due(Some(0.0), 5.0), DebtUrgency::Overdue);
        assert_eq!(DebtUrgency::from_due(Some(-1.0), 5.0), DebtUrgency::Overdue);
    }

    #[test]
    fn test_every_record_decrements() {
        let mut debts = DebtScheduler::default();
        debts.push(10.0, Pose::IDENTITY, path());
        debts.push(3.0, Pose::IDENTITY, path());
        debts.tick(0.5);
        let dues: Vec<f32> = debts.iter().map(|r| r.due).collect();
        assert_eq!(dues, vec![9.5, 2.5]);
        assert_eq!(debts.nearest_due(), Some(2.5));
    }

    #[test]
    fn test_expired_earliest_prefers_smallest_due_then_fifo() {
        let mut debts = DebtScheduler::default();
        let a = debts.push(0.5, Pose::IDENTITY, path());
        let b = debts.push(0.25, Pose::IDENTITY, path());
        let c = debts.push(0.25, Pose::IDENTITY, path());
        assert!(debts.expired_earliest().is_none());

        debts.tick(1.0);
        assert_eq!(debts.expired_earliest().map(|r| r.id), Some(b));

        debts.mark_in_repayment(b);
        assert_eq!(debts.expired_earliest().map(|r| r.id), Some(c));

        debts.remove(b);
        debts.remove(c);
        assert_eq!(debts.in_repayment(), None);
        assert_eq!(debts.expired_earliest().map(|r| r.id), Some(a));
    }

    #[test]
    fn test_remove_unknown_is_none() {
        let mut debts = DebtScheduler::default();
        debts.push(1.0, Pose::IDENTITY, path());
        assert!(debts.remove(42).is_none());
        assert_eq!(debts.len(), 1);
    }

    #[test]
    fn test_replace_keeps_ids_unique() {
        let mut debts = DebtScheduler::default();
        let restored = DebtRecord {
            id: 9,
            due: 4.0,
            origin: Pose::IDENTITY,
            trajectory: path(),
        };
        debts.replace(vec![restored], 3);
        assert_eq!(debts.next_id(), 10);
        let fresh = debts.push(1.0, Pose::IDENTITY, path());
        assert_eq!(fresh, 10);
    }
}
