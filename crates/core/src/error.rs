use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the segment extractor and importer.
///
/// None of these are retried here; the invoking workflow decides what to do
/// with them.
#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to read {location}: {message}")]
    StorageRead { location: String, message: String },

    #[error("Failed to upload {location}: {message}")]
    StorageWrite { location: String, message: String },

    #[error("Malformed record on line {line}: {message}")]
    MalformedRecord { line: usize, message: String },

    #[error("Job output file contains no records")]
    NoRecords,

    #[error("Local file error at {}: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SegmentError {
    /// Stable name reported to the workflow engine.
    pub fn error_type(&self) -> &'static str {
        match self {
            SegmentError::InvalidInput(_) => "InvalidInputError",
            SegmentError::StorageRead { .. } => "StorageReadError",
            SegmentError::StorageWrite { .. } => "StorageWriteError",
            SegmentError::MalformedRecord { .. } => "MalformedRecordError",
            SegmentError::NoRecords => "NoRecordsError",
            SegmentError::LocalIo { .. } => "LocalIOError",
            SegmentError::Config(_) => "ConfigError",
        }
    }

    pub fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SegmentError::LocalIo {
            path: path.into(),
            source,
        }
    }
}
