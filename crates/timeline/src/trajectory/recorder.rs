//! Trajectory recorder: appends the player's pose once per fixed tick while
//! an act is recording.

use bevy::prelude::*;

use crate::pose::Pose;

use super::Trajectory;

/// Growable pose buffer with a hard sample cap.
#[derive(Debug, Clone)]
pub struct TrajectoryRecorder {
    samples: Vec<Pose>,
    recording: bool,
    max_samples: usize,
    /// Set once the cap has been hit in the current recording.
    truncated: bool,
}

impl TrajectoryRecorder {
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: Vec::new(),
            recording: false,
            max_samples: max_samples.max(1),
            truncated: false,
        }
    }

    /// Clear any previous buffer and start recording.
    pub fn start(&mut self) {
        self.samples.clear();
        self.truncated = false;
        self.recording = true;
    }

    /// Re-seed the buffer with an earlier recording and keep appending to it.
    pub fn resume_from(&mut self, trajectory: &Trajectory) {
        self.samples.clear();
        self.samples.extend_from_slice(trajectory.samples());
        self.truncated = self.samples.len() >= self.max_samples;
        self.recording = true;
    }

    /// Append a sample. No-op unless recording; drops samples past the cap.
    pub fn sample(&mut self, pose: Pose) {
        if !self.recording {
            return;
        }
        if self.samples.len() >= self.max_samples {
            if !self.truncated {
                warn!(
                    "Trajectory recorder hit its cap of {} samples; dropping further samples",
                    self.max_samples
                );
                self.truncated = true;
            }
            return;
        }
        self.samples.push(pose);
    }

    /// Stop recording and hand off the buffer as an immutable trajectory.
    pub fn stop(&mut self) -> Trajectory {
        self.recording = false;
        Trajectory::from(std::mem::take(&mut self.samples))
    }

    /// Copy of the in-progress buffer (for pause snapshots).
    pub fn snapshot(&self) -> Trajectory {
        Trajectory::from(self.samples.clone())
    }

    /// Stop and discard everything.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.recording = false;
        self.truncated = false;
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}
