use chrono::NaiveDateTime;

use crate::error::SegmentError;

/// Timestamp layout appended to every segment name (`YYYYMMDD-HHMMSS`)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Keeps only ASCII letters, dropping digits, spaces and punctuation
pub fn letters_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_alphabetic()).collect()
}

/// Formats a timestamp as `YYYYMMDD-HHMMSS`
pub fn timestamp_suffix(now: NaiveDateTime) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Joins a base name and the invocation timestamp into a segment name
pub fn segment_name(base: &str, now: NaiveDateTime) -> String {
    format!("{}_{}", base, timestamp_suffix(now))
}

/// Rejects segment names that cannot be used as a single local file name
pub fn validate_segment_name(name: &str) -> Result<(), SegmentError> {
    if name.trim().is_empty() {
        return Err(SegmentError::InvalidInput("segmentName is empty".into()));
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(SegmentError::InvalidInput(format!(
            "segmentName '{}' must not contain path separators",
            name
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(SegmentError::InvalidInput(
            "segmentName must not contain control characters".into(),
        ));
    }
    Ok(())
}
