use std::fmt;

use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::SegmentError;

/// A bucket + key pair in object storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parses an `s3://bucket/key` URI.
    ///
    /// The host is the bucket and the percent-decoded path (minus the leading
    /// slash) is the key. Both must be non-empty.
    pub fn parse(uri: &str) -> Result<Self, SegmentError> {
        let url = Url::parse(uri.trim())
            .map_err(|e| SegmentError::InvalidInput(format!("'{}' is not a valid URI: {}", uri, e)))?;

        if url.scheme() != "s3" {
            return Err(SegmentError::InvalidInput(format!(
                "'{}' must use the s3:// scheme",
                uri
            )));
        }

        let bucket = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| SegmentError::InvalidInput(format!("'{}' has no bucket", uri)))?;

        let key = percent_decode_str(url.path().trim_start_matches('/'))
            .decode_utf8()
            .map_err(|e| SegmentError::InvalidInput(format!("'{}' has an invalid key: {}", uri, e)))?;
        if key.is_empty() {
            return Err(SegmentError::InvalidInput(format!("'{}' has no object key", uri)));
        }

        Ok(Self::new(bucket, key.into_owned()))
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Extractor invocation payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    #[serde(default)]
    pub job_output_file: Option<String>,
}

impl ExtractRequest {
    /// Decodes a raw invocation payload, reporting a bad shape as `InvalidInput`
    pub fn from_value(payload: Value) -> Result<Self, SegmentError> {
        decode_payload(payload, "extract")
    }
}

/// Named user list pulled out of a batch job output file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub segment_name: String,
    pub users: Vec<String>,
}

/// Importer invocation payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub segment_name: String,
    pub endpoints: Vec<String>,
}

impl ImportRequest {
    /// Decodes a raw invocation payload, reporting a bad shape as `InvalidInput`
    pub fn from_value(payload: Value) -> Result<Self, SegmentError> {
        decode_payload(payload, "import")
    }
}

fn decode_payload<T: DeserializeOwned>(payload: Value, kind: &str) -> Result<T, SegmentError> {
    serde_json::from_value(payload)
        .map_err(|e| SegmentError::InvalidInput(format!("malformed {} request: {}", kind, e)))
}

impl From<ExtractionResult> for ImportRequest {
    fn from(result: ExtractionResult) -> Self {
        Self {
            segment_name: result.segment_name,
            endpoints: result.users,
        }
    }
}

/// Where imported segment files are uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDestination {
    pub bucket: String,
    pub prefix: String,
}

impl ImportDestination {
    pub fn location_for(&self, segment_name: &str) -> ObjectLocation {
        ObjectLocation::new(
            self.bucket.clone(),
            format!("{}{}.csv", self.prefix, segment_name),
        )
    }
}
