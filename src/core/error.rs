use std::io;

use thiserror::Error;

/// Errors surfaced by the per-cycle API and configuration loading.
#[derive(Debug, Error)]
pub enum BrainError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("expected {expected} sensor values, got {got}")]
    SensorWidth { expected: usize, got: usize },

    /// A collaborator handed back a vector of the wrong width.
    #[error("{stage} produced {got} values, expected {expected}")]
    Collaborator {
        stage: &'static str,
        expected: usize,
        got: usize,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Why a brain image was not accepted.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot i/o: {0}")]
    Io(#[from] io::Error),

    #[error("malformed snapshot: {0}")]
    Format(String),

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    #[error("snapshot {field} is {stored}, this brain has {current}")]
    Mismatch {
        field: &'static str,
        stored: String,
        current: String,
    },
}

impl SnapshotError {
    pub(crate) fn mismatch(
        field: &'static str,
        stored: impl ToString,
        current: impl ToString,
    ) -> Self {
        Self::Mismatch {
            field,
            stored: stored.to_string(),
            current: current.to_string(),
        }
    }

    /// Geometry or schema disagreement, as opposed to an unreadable file.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }
}
