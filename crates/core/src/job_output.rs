//! Parsing of batch-inference job output files.
//!
//! A job output file is newline-delimited JSON, one record per line:
//!
//! ```json
//! {"input": {"itemId": "105"}, "output": {"usersList": ["12", "7", "31"]}}
//! ```

use serde::Deserialize;

use crate::error::SegmentError;
use crate::utils::letters_only;

#[derive(Debug, Clone, Deserialize)]
pub struct JobOutputRecord {
    pub input: RecordInput,
    pub output: RecordOutput,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInput {
    #[serde(default)]
    pub item_attributes: Option<String>,
    #[serde(default)]
    pub item_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutput {
    pub users_list: Vec<String>,
}

impl JobOutputRecord {
    /// Segment base name: letters of `itemAttributes`, else `item_<itemId>`
    pub fn base_name(&self) -> Option<String> {
        match (&self.input.item_attributes, &self.input.item_id) {
            (Some(attributes), _) => Some(letters_only(attributes)),
            (None, Some(item_id)) => Some(format!("item_{}", item_id)),
            (None, None) => None,
        }
    }
}

/// What survives a pass over the whole file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastRecord {
    pub base_name: String,
    pub users: Vec<String>,
    pub records_seen: usize,
}

/// Parses one line. `line_no` is 1-based and only used for error reporting.
pub fn parse_record(line_no: usize, line: &str) -> Result<JobOutputRecord, SegmentError> {
    serde_json::from_str(line).map_err(|e| SegmentError::MalformedRecord {
        line: line_no,
        message: e.to_string(),
    })
}

/// Walks every non-empty line and keeps the last record's users and name.
///
/// Only zero-length lines are skipped. A line holding just whitespace is a
/// malformed record; a trailing `\r` on a record line is trimmed.
/// Each record overwrites the previous one; nothing is merged.
pub fn extract_last(body: &str) -> Result<LastRecord, SegmentError> {
    let mut last: Option<LastRecord> = None;
    let mut records_seen = 0;

    for (idx, raw) in body.split('\n').enumerate() {
        if raw.is_empty() {
            continue;
        }

        let record = parse_record(idx + 1, raw.trim())?;
        let base_name = record.base_name().ok_or_else(|| SegmentError::MalformedRecord {
            line: idx + 1,
            message: "record has neither input.itemAttributes nor input.itemId".into(),
        })?;
        records_seen += 1;

        last = Some(LastRecord {
            base_name,
            users: record.output.users_list,
            records_seen,
        });
    }

    last.ok_or(SegmentError::NoRecords)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_attributes_take_precedence() {
        let record = parse_record(
            1,
            r#"{"input":{"itemAttributes":"Item #42!","itemId":"42"},"output":{"usersList":["a"]}}"#,
        )
        .unwrap();
        assert_eq!(record.base_name().as_deref(), Some("Item"));
    }

    #[test]
    fn test_item_id_fallback() {
        let record = parse_record(
            1,
            r#"{"input":{"itemId":"abc123"},"output":{"usersList":[]}}"#,
        )
        .unwrap();
        assert_eq!(record.base_name().as_deref(), Some("item_abc123"));
    }

    #[test]
    fn test_last_record_wins() {
        let body = concat!(
            r#"{"input":{"itemId":"1"},"output":{"usersList":["u1","u2"]}}"#,
            "\n",
            r#"{"input":{"itemId":"2"},"output":{"usersList":["u9","u3","u5"]}}"#,
            "\n"
        );
        let last = extract_last(body).unwrap();
        assert_eq!(last.base_name, "item_2");
        assert_eq!(last.users, vec!["u9", "u3", "u5"]);
        assert_eq!(last.records_seen, 2);
    }

    #[test]
    fn test_crlf_record_lines_are_trimmed() {
        let body = "{\"input\":{\"itemId\":\"7\"},\"output\":{\"usersList\":[\"x\"]}}\r\n\n";
        let last = extract_last(body).unwrap();
        assert_eq!(last.base_name, "item_7");
        assert_eq!(last.records_seen, 1);
    }

    #[test]
    fn test_whitespace_only_lines_are_malformed() {
        for body in ["   \n", "\r\n", "{\"input\":{\"itemId\":\"7\"},\"output\":{\"usersList\":[]}}\n \t"] {
            match extract_last(body) {
                Err(SegmentError::MalformedRecord { .. }) => {}
                other => panic!("body {:?}: unexpected {:?}", body, other),
            }
        }
    }

    #[test]
    fn test_empty_body_has_no_records() {
        assert!(matches!(extract_last(""), Err(SegmentError::NoRecords)));
        assert!(matches!(extract_last("\n\n"), Err(SegmentError::NoRecords)));
    }

    #[test]
    fn test_invalid_json_reports_line() {
        let body = "{\"input\":{\"itemId\":\"1\"},\"output\":{\"usersList\":[]}}\n{not json";
        match extract_last(body) {
            Err(SegmentError::MalformedRecord { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_missing_users_list_is_malformed() {
        let err = extract_last(r#"{"input":{"itemId":"1"},"output":{}}"#).unwrap_err();
        assert_eq!(err.error_type(), "MalformedRecordError");
        assert!(err.to_string().contains("usersList"));
    }

    #[test]
    fn test_missing_name_source_is_malformed() {
        let err = extract_last(r#"{"input":{},"output":{"usersList":["a"]}}"#).unwrap_err();
        assert_eq!(err.error_type(), "MalformedRecordError");
    }
}
