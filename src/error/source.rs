// Channel data source error types and constants

use crate::error::ErrorCode;
use std::fmt;
use std::path::PathBuf;

/// Source error code constants
///
/// Error code range: 4001-4004
pub struct SourceErrorCodes {}

impl SourceErrorCodes {
    /// Recording directory is missing or unreadable
    pub const DIRECTORY_UNREADABLE: i32 = 4001;

    /// Fewer recordings than configured channels
    pub const NOT_ENOUGH_RECORDINGS: i32 = 4002;

    /// Recording could not be opened or parsed as CSV
    pub const RECORDING_UNREADABLE: i32 = 4003;

    /// A row lacks the time/velocity columns or holds non-numeric values
    pub const MALFORMED_ROW: i32 = 4004;
}

/// Errors raised while preparing recorded channels for replay
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    DirectoryUnreadable { path: PathBuf, reason: String },
    NotEnoughRecordings { expected: usize, found: usize },
    RecordingUnreadable { path: PathBuf, reason: String },
    MalformedRow { path: PathBuf, row: usize, reason: String },
}

impl ErrorCode for SourceError {
    fn code(&self) -> i32 {
        match self {
            SourceError::DirectoryUnreadable { .. } => SourceErrorCodes::DIRECTORY_UNREADABLE,
            SourceError::NotEnoughRecordings { .. } => SourceErrorCodes::NOT_ENOUGH_RECORDINGS,
            SourceError::RecordingUnreadable { .. } => SourceErrorCodes::RECORDING_UNREADABLE,
            SourceError::MalformedRow { .. } => SourceErrorCodes::MALFORMED_ROW,
        }
    }

    fn message(&self) -> String {
        match self {
            SourceError::DirectoryUnreadable { path, reason } => {
                format!("Cannot list recordings in {}: {}", path.display(), reason)
            }
            SourceError::NotEnoughRecordings { expected, found } => {
                format!(
                    "Found {} CSV recordings, need one per channel ({})",
                    found, expected
                )
            }
            SourceError::RecordingUnreadable { path, reason } => {
                format!("Cannot read recording {}: {}", path.display(), reason)
            }
            SourceError::MalformedRow { path, row, reason } => {
                format!("{} row {}: {}", path.display(), row, reason)
            }
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SourceError (code {}): {}",
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SourceError {}
