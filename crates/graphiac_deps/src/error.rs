//! Error types for dependency analysis.

use std::collections::BTreeSet;

use thiserror::Error;

/// Result type alias for dependency analysis operations.
pub type DepsResult<T> = Result<T, DepsError>;

/// Errors that can occur during dependency analysis.
#[derive(Error, Debug)]
pub enum DepsError {
    /// Group ordering could not complete. `groups` holds every group that was
    /// never released; `cycles` holds the strongly connected components among
    /// them that actually form a cycle.
    #[error("Dependency cycle detected among groups: {}", format_groups(.groups))]
    CycleDetected {
        groups: BTreeSet<String>,
        cycles: Vec<Vec<String>>,
    },

    #[error("Invalid analyzer configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unsupported snapshot format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DepsError {
    /// Whether this error is a dependency cycle.
    pub fn is_cycle(&self) -> bool {
        matches!(self, DepsError::CycleDetected { .. })
    }
}

fn format_groups(groups: &BTreeSet<String>) -> String {
    groups.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
