use std::path::PathBuf;

use crate::domain::ImportDestination;
use crate::error::SegmentError;

pub const BUCKET_VAR: &str = "SEGMENT_IMPORT_BUCKET";
pub const PREFIX_VAR: &str = "SEGMENT_IMPORT_PREFIX";
pub const WORK_DIR_VAR: &str = "SEGMENT_IMPORT_WORK_DIR";
pub const KEEP_LOCAL_FILE_VAR: &str = "SEGMENT_IMPORT_KEEP_LOCAL_FILE";

const DEFAULT_WORK_DIR: &str = "/tmp";

/// Settings for the segment importer, resolved once per process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImporterConfig {
    pub destination: ImportDestination,
    /// Directory the CSV is written to before upload
    pub work_dir: PathBuf,
    /// Leave the CSV on disk after a successful upload
    pub keep_local_file: bool,
}

impl ImporterConfig {
    /// Reads the importer settings from the process environment
    pub fn from_env() -> Result<Self, SegmentError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SegmentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bucket = lookup(BUCKET_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SegmentError::Config(format!("{} must be set", BUCKET_VAR)))?;

        let prefix = lookup(PREFIX_VAR).unwrap_or_default();

        let work_dir = lookup(WORK_DIR_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORK_DIR));

        let keep_local_file = match lookup(KEEP_LOCAL_FILE_VAR) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                SegmentError::Config(format!("{} must be true or false, got '{}'", KEEP_LOCAL_FILE_VAR, raw))
            })?,
            None => false,
        };

        Ok(Self {
            destination: ImportDestination { bucket, prefix },
            work_dir,
            keep_local_file,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
