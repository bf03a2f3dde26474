use thiserror::Error;

/// Domain error taxonomy shared by every crate in the workspace.
///
/// Mirrors the split the teacher draws between a small closed set of
/// domain errors (here) and `anyhow::Error` used at async/I/O
/// boundaries (report writer, ingester) for lower-level causes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("insufficient stock for part {part_id}: requested {requested}, available {available}")]
    InsufficientStock {
        part_id: String,
        requested: u32,
        available: u32,
    },

    #[error("request processing failed: {0}")]
    RequestProcessing(String),
}
