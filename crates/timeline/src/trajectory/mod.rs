//! Recorded movement history.
//!
//! A [`Trajectory`] is the frozen output of a [`TrajectoryRecorder`]: one
//! [`Pose`] per fixed tick, in playback order. It is shared (`Arc`) between
//! the ghost replaying it, the debt queue and pause snapshots, and is never
//! mutated after recording stops.

pub mod recorder;

pub use recorder::TrajectoryRecorder;

use std::sync::Arc;

use xxhash_rust::xxh32::xxh32;

use crate::pose::Pose;

/// Seed for trajectory fingerprints.
const FINGERPRINT_SEED: u32 = 0x4c4f_4f50; // "LOOP"

/// Immutable, cheaply clonable sequence of pose samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    samples: Arc<[Pose]>,
}

impl Default for Trajectory {
    fn default() -> Self {
        Self::from(Vec::new())
    }
}

impl From<Vec<Pose>> for Trajectory {
    fn from(samples: Vec<Pose>) -> Self {
        Self {
            samples: samples.into(),
        }
    }
}

impl FromIterator<Pose> for Trajectory {
    fn from_iter<I: IntoIterator<Item = Pose>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Pose> {
        self.samples.get(index)
    }

    pub fn first(&self) -> Option<&Pose> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Pose> {
        self.samples.last()
    }

    pub fn samples(&self) -> &[Pose] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pose> {
        self.samples.iter()
    }

    /// Deterministic xxHash32 of every sample's float bits, in order.
    ///
    /// Two recordings of the same inputs on the same build hash equal; used in
    /// logs to identify debts and by determinism tests.
    pub fn fingerprint(&self) -> u32 {
        let mut bytes = Vec::with_capacity(self.samples.len() * 7 * 4);
        for pose in self.samples.iter() {
            for v in pose.position.to_array() {
                bytes.extend_from_slice(&v.to_bits().to_le_bytes());
            }
            for v in pose.rotation.to_array() {
                bytes.extend_from_slice(&v.to_bits().to_le_bytes());
            }
        }
        xxh32(&bytes, FINGERPRINT_SEED)
    }
}

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use super::*;

    fn line(n: usize) -> Trajectory {
        (0..n).map(|i| Pose::at(Vec3::new(i as f32, 0.0, 0.0))).collect()
    }

    #[test]
    fn test_accessors() {
        let t = line(3);
        assert_eq!(t.len(), 3);
        assert!(!t.is_empty());
        assert_eq!(t.first().unwrap().position.x, 0.0);
        assert_eq!(t.last().unwrap().position.x, 2.0);
        assert!(t.get(3).is_none());
        assert!(Trajectory::default().last().is_none());
    }

    #[test]
    fn test_fingerprint_is_stable_and_order_sensitive() {
        assert_eq!(line(5).fingerprint(), line(5).fingerprint());
        let reversed: Trajectory = line(5).iter().rev().copied().collect();
        assert_ne!(line(5).fingerprint(), reversed.fingerprint());
    }

    #[test]
    fn test_clone_shares_samples() {
        let a = line(4);
        let b = a.clone();
        assert!(Arc::ptr_eq(&a.samples, &b.samples));
    }
}
