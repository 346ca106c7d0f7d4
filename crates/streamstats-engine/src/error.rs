//! Import failure taxonomy.

use std::time::Duration;
use streamstats_common::StatsError;
use thiserror::Error;

/// Why a file, or a whole selection, could not be imported.
///
/// Per-file variants end that file in the `Error` status and never stop the
/// rest of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// Reading the file failed, or its content is not text.
    #[error("Could not read '{file}': {reason}")]
    Unreadable {
        /// File name
        file: String,
        /// Underlying failure
        reason: String,
    },

    /// The file was read but no record survived schema matching and retention.
    #[error("No valid listening records in '{file}'")]
    NoValidRecords {
        /// File name
        file: String,
    },

    /// Every file of a selection failed the type check.
    #[error("None of the {count} selected files is a JSON or CSV export")]
    InvalidSelection {
        /// Size of the rejected selection
        count: usize,
    },

    /// Only pending files can be removed from a batch.
    #[error("'{file}' is no longer pending")]
    NotPending {
        /// File name
        file: String,
    },

    /// No batch entry has this id.
    #[error("No file with id {0} in the batch")]
    UnknownEntry(uuid::Uuid),

    /// Reading the file took longer than the configured bound.
    #[error("Reading '{file}' timed out after {}s", .after.as_secs())]
    Timeout {
        /// File name
        file: String,
        /// Configured bound
        after: Duration,
    },

    /// The run was cancelled while the file was being read.
    #[error("Import of '{file}' was cancelled")]
    Cancelled {
        /// File name
        file: String,
    },
}

impl ImportError {
    /// Fluent message id describing this failure to users.
    pub const fn message_id(&self) -> &'static str {
        match self {
            Self::Unreadable { .. } => "import-error-unreadable",
            Self::NoValidRecords { .. } => "import-error-no-valid-records",
            Self::InvalidSelection { .. } => "import-error-invalid-selection",
            Self::NotPending { .. } | Self::UnknownEntry(_) => "import-error-not-pending",
            Self::Timeout { .. } => "import-error-timeout",
            Self::Cancelled { .. } => "import-error-cancelled",
        }
    }
}

impl From<ImportError> for StatsError {
    fn from(err: ImportError) -> Self {
        Self::import_with_source(err.to_string(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_and_empty_are_distinct() {
        let unreadable = ImportError::Unreadable {
            file: "a.json".to_string(),
            reason: "permission denied".to_string(),
        };
        let empty = ImportError::NoValidRecords {
            file: "a.json".to_string(),
        };
        assert_ne!(unreadable.message_id(), empty.message_id());
        assert_eq!(unreadable.to_string(), "Could not read 'a.json': permission denied");
    }

    #[test]
    fn test_timeout_display() {
        let err = ImportError::Timeout {
            file: "big.json".to_string(),
            after: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "Reading 'big.json' timed out after 30s");
    }

    #[test]
    fn test_converts_to_stats_error() {
        let stats: StatsError = ImportError::InvalidSelection { count: 3 }.into();
        assert!(matches!(stats, StatsError::Import { .. }));
    }
}
