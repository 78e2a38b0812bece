/// Errors returned by archive loading, sorting, scaling and scoring.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when objective names, directions or epsilons disagree, or
    /// a required path or identifier is unset.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Returned when no archive matches a requested run variant.
    #[error("no archive found for variant '{variant}' matching '{pattern}*'")]
    MissingData {
        /// The run variant that was requested.
        variant: String,
        /// The file-name prefix that was searched for.
        pattern: String,
    },

    /// Returned when an objective vector has the wrong number of coordinates.
    #[error("dimension mismatch: expected {expected} objectives but row {row} has {got}")]
    DimensionMismatch {
        /// The expected number of objectives.
        expected: usize,
        /// The actual number of coordinates.
        got: usize,
        /// The index of the offending row.
        row: usize,
    },

    /// Returned when an objective value is NaN or infinite.
    #[error("non-finite objective value {value} at row {row}, column {column}")]
    NonFinite {
        /// The index of the offending row.
        row: usize,
        /// The objective index within the row.
        column: usize,
        /// The offending value.
        value: f64,
    },

    /// Returned when a scaler is fitted on an empty basis.
    #[error("cannot fit a scaler on an empty basis")]
    EmptyBasis,

    /// Returned when pooled tables do not share a column layout.
    #[error("column mismatch in '{source_name}': expected {expected} columns, got {got}")]
    ColumnMismatch {
        /// The table that did not match.
        source_name: String,
        /// The expected number of columns.
        expected: usize,
        /// The actual number of columns.
        got: usize,
    },

    /// Returned when a delimited table cannot be parsed.
    #[error("parse error in '{source_name}' at line {line}: {reason}")]
    Parse {
        /// The file or archive member being parsed.
        source_name: String,
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        reason: String,
    },

    /// Returned when an archive bundle is malformed.
    #[error("archive error: {0}")]
    Archive(String),

    /// Returned when a configuration file cannot be decoded.
    #[cfg(feature = "serde")]
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    /// Returned when reading or writing a file fails.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error stems from invalid configuration rather than data.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidConfiguration(_))
    }

    /// Whether this error means an expected archive was not found.
    ///
    /// Batch callers treat this as recoverable.
    #[must_use]
    pub fn is_missing_data(&self) -> bool {
        matches!(self, Self::MissingData { .. })
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }
}

/// A `Result` alias with [`Error`] as the error type.
pub type Result<T> = core::result::Result<T, Error>;
