// ---------------------------------------------------------------------------
// TimelineError: typed errors for playback preconditions, config and checkpoints
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors surfaced by the timeline core.
///
/// Gameplay failures (paradox, missing ghost) are not errors: they are
/// outcomes of the state machine. This enum covers precondition violations,
/// bad configuration and corrupt checkpoint bytes.
#[derive(Debug)]
pub enum TimelineError {
    /// A zero-length trajectory was handed to playback.
    EmptyTrajectory,
    /// Configuration failed validation.
    InvalidParams(String),
    /// Configuration JSON could not be parsed.
    Config(serde_json::Error),
    /// A checkpoint was requested while an act or repayment is in flight.
    NotQuiescent,
    /// Checkpoint bytes do not start with the `LOOP` magic.
    BadMagic,
    /// Checkpoint was written by a newer build.
    UnsupportedVersion { expected_max: u32, found: u32 },
    /// Checkpoint is shorter than its header claims.
    Truncated { expected: usize, found: usize },
    /// Payload checksum does not match the header.
    ChecksumMismatch { expected: u32, found: u32 },
    /// Bitcode decoding failed.
    Decode(String),
}

impl fmt::Display for TimelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimelineError::EmptyTrajectory => write!(f, "cannot play back an empty trajectory"),
            TimelineError::InvalidParams(msg) => write!(f, "invalid loop parameters: {msg}"),
            TimelineError::Config(e) => write!(f, "config parse error: {e}"),
            TimelineError::NotQuiescent => {
                write!(f, "timeline is mid-act; checkpoints are only taken while idle")
            }
            TimelineError::BadMagic => write!(f, "not a timeline checkpoint (bad magic)"),
            TimelineError::UnsupportedVersion {
                expected_max,
                found,
            } => write!(
                f,
                "checkpoint is v{found}, but this build only supports up to v{expected_max}"
            ),
            TimelineError::Truncated { expected, found } => {
                write!(f, "checkpoint truncated: expected {expected} bytes, got {found}")
            }
            TimelineError::ChecksumMismatch { expected, found } => write!(
                f,
                "checkpoint checksum mismatch: header {expected:#010x}, payload {found:#010x}"
            ),
            TimelineError::Decode(msg) => write!(f, "checkpoint decode error: {msg}"),
        }
    }
}

impl std::error::Error for TimelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TimelineError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TimelineError {
    fn from(e: serde_json::Error) -> Self {
        TimelineError::Config(e)
    }
}

impl From<bitcode::Error> for TimelineError {
    fn from(e: bitcode::Error) -> Self {
        TimelineError::Decode(e.to_string())
    }
}
