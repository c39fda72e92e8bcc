//! Error type shared by every fallible operation in the crate.

/// Errors raised while validating, building, or running a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SirdError {
    /// A scalar parameter is outside its allowed range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name as it appears in the run input.
        name: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// Contact-graph construction could not reach its edge target.
    #[error("contact graph unsatisfiable: accepted {accepted} of {target} edges after {attempts} attempts")]
    GraphUnsatisfiable {
        /// Number of edges requested.
        target: usize,
        /// Number of edges accepted before giving up.
        accepted: usize,
        /// Number of candidate pairs drawn.
        attempts: u64,
    },

    /// A grid cell held something other than `S`, `I`, `R` or `D`.
    #[error("unknown health status `{0}`")]
    UnknownStatus(String),

    /// A supplied grid does not have the expected dimensions.
    #[error("grid shape mismatch: expected {expected_rows}x{expected_cols}, found {rows}x{cols}")]
    GridShape {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },

    /// A grid row is longer or shorter than the first row.
    #[error("grid row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        expected: usize,
        found: usize,
    },

    /// The run context received nothing on stdin.
    #[error("no input on stdin")]
    EmptyInput,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, SirdError>;

impl SirdError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SirdError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
