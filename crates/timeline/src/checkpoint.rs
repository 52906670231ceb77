// ---------------------------------------------------------------------------
// checkpoint: versioned binary snapshot of the idle timeline
// ---------------------------------------------------------------------------
//
// Layout (16-byte header, little-endian):
//   [0..4]   Magic "LOOP"
//   [4..8]   Format version (u32)
//   [8..12]  Payload length (u32)
//   [12..16] xxHash32 of the payload
//   [16..]   bitcode-encoded CheckpointData
//
// Only outstanding debts survive a checkpoint. Acts in flight, the paused
// session and the live ghost are transient and never written, so a
// checkpoint can only be taken (or applied) while the machine is idle.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use xxhash_rust::xxh32::xxh32;

use crate::debt::{DebtId, DebtRecord};
use crate::error::TimelineError;
use crate::pose::Pose;
use crate::puzzle::PuzzleMachine;
use crate::trajectory::Trajectory;

pub const MAGIC: [u8; 4] = *b"LOOP";

pub const HEADER_SIZE: usize = 16;

pub const FORMAT_VERSION: u32 = 1;

const CHECKSUM_SEED: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode)]
struct SavedPose {
    position: [f32; 3],
    rotation: [f32; 4],
}

impl From<&Pose> for SavedPose {
    fn from(pose: &Pose) -> Self {
        Self {
            position: pose.position.to_array(),
            rotation: pose.rotation.to_array(),
        }
    }
}

impl From<SavedPose> for Pose {
    fn from(saved: SavedPose) -> Self {
        Pose::new(
            Vec3::from_array(saved.position),
            Quat::from_array(saved.rotation),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
struct SavedDebt {
    id: DebtId,
    due: f32,
    origin: SavedPose,
    samples: Vec<SavedPose>,
}

#[derive(Debug, Clone, PartialEq, Default, Encode, Decode)]
struct CheckpointData {
    next_id: DebtId,
    debts: Vec<SavedDebt>,
}

/// Outstanding debts of an idle timeline, ready to carry across a scene
/// transition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimelineCheckpoint {
    data: CheckpointData,
}

impl TimelineCheckpoint {
    /// Capture the debt queue. Fails unless the machine is idle with nothing
    /// suspended.
    pub fn capture(machine: &PuzzleMachine) -> Result<Self, TimelineError> {
        if !machine.is_quiescent() {
            return Err(TimelineError::NotQuiescent);
        }
        let debts = machine
            .debts()
            .iter()
            .map(|record| SavedDebt {
                id: record.id,
                due: record.due,
                origin: SavedPose::from(&record.origin),
                samples: record.trajectory.iter().map(SavedPose::from).collect(),
            })
            .collect();
        Ok(Self {
            data: CheckpointData {
                next_id: machine.debts().next_id(),
                debts,
            },
        })
    }

    pub fn debt_count(&self) -> usize {
        self.data.debts.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let payload = bitcode::encode(&self.data);
        let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&xxh32(&payload, CHECKSUM_SEED).to_le_bytes());
        out.extend_from_slice(&payload);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TimelineError> {
        if bytes.len() < MAGIC.len() || bytes[..4] != MAGIC {
            return Err(TimelineError::BadMagic);
        }
        if bytes.len() < HEADER_SIZE {
            return Err(TimelineError::Truncated {
                expected: HEADER_SIZE,
                found: bytes.len(),
            });
        }

        let version = read_u32(bytes, 4);
        if version > FORMAT_VERSION {
            return Err(TimelineError::UnsupportedVersion {
                expected_max: FORMAT_VERSION,
                found: version,
            });
        }

        let length = read_u32(bytes, 8) as usize;
        let expected = HEADER_SIZE + length;
        if bytes.len() < expected {
            return Err(TimelineError::Truncated {
                expected,
                found: bytes.len(),
            });
        }
        let payload = &bytes[HEADER_SIZE..expected];

        let checksum = read_u32(bytes, 12);
        let computed = xxh32(payload, CHECKSUM_SEED);
        if computed != checksum {
            return Err(TimelineError::ChecksumMismatch {
                expected: checksum,
                found: computed,
            });
        }

        let data: CheckpointData = bitcode::decode(payload)?;
        Ok(Self { data })
    }

    /// Replace the machine's debt queue with the checkpointed one.
    ///
    /// Debts with no samples cannot be replayed and are dropped.
    pub fn apply(&self, machine: &mut PuzzleMachine) -> Result<usize, TimelineError> {
        let records: Vec<DebtRecord> = self
            .data
            .debts
            .iter()
            .filter_map(|saved| {
                if saved.samples.is_empty() {
                    warn!("Dropping checkpointed debt {} with no samples", saved.id);
                    return None;
                }
                let trajectory: Trajectory =
                    saved.samples.iter().copied().map(Pose::from).collect();
                Some(DebtRecord {
                    id: saved.id,
                    due: saved.due,
                    origin: Pose::from(saved.origin),
                    trajectory,
                })
            })
            .collect();

        let restored = records.len();
        if !machine.restore_debts(records, self.data.next_id) {
            return Err(TimelineError::NotQuiescent);
        }
        info!("Restored {restored} debt(s) from checkpoint");
        Ok(restored)
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
