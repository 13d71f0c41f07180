//! Lambda entry points for the segment extractor and importer.
//!
//! Each binary builds its service once per cold start and hands every
//! invocation to one of the handlers below.

use std::sync::Arc;

use csv_adapter::CsvSegmentWriter;
use lambda_runtime::{Diagnostic, LambdaEvent};
use segment_core::application::{SegmentExtractor, SegmentImporter};
use segment_core::config::ImporterConfig;
use segment_core::domain::{ExtractRequest, ExtractionResult, ImportRequest};
use segment_core::error::SegmentError;
use segment_core::ports::ObjectUploader;
use serde_json::Value;
use thiserror::Error;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Failure returned to the Lambda runtime.
///
/// The reported error type is the segment error name (`NoRecordsError`,
/// `StorageWriteError`, ...) so workflow retry rules can match on it.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct HandlerError(#[from] pub SegmentError);

impl From<HandlerError> for Diagnostic {
    fn from(err: HandlerError) -> Self {
        Diagnostic {
            error_type: err.0.error_type().into(),
            error_message: err.0.to_string().into(),
        }
    }
}

/// JSON logs on stderr, filtered by `RUST_LOG` (default `info`)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Wires the CSV writer and uploader into an importer; the work dir comes from `config`
pub fn build_importer(uploader: Arc<dyn ObjectUploader>, config: ImporterConfig) -> SegmentImporter {
    let writer = CsvSegmentWriter::new(config.work_dir);
    SegmentImporter::new(Box::new(writer), uploader, config.destination)
        .with_keep_local_file(config.keep_local_file)
}

/// Payloads arrive untyped so a bad shape is reported as `InvalidInputError`
/// instead of failing inside the runtime's deserializer.
pub async fn handle_extract(
    extractor: &SegmentExtractor,
    event: LambdaEvent<Value>,
) -> Result<ExtractionResult, HandlerError> {
    let request_id = event.context.request_id;
    let request = ExtractRequest::from_value(event.payload).map_err(|e| report(e, &request_id))?;

    extractor
        .extract(&request)
        .await
        .map_err(|e| report(e, &request_id))
}

pub async fn handle_import(
    importer: &SegmentImporter,
    event: LambdaEvent<Value>,
) -> Result<(), HandlerError> {
    let request_id = event.context.request_id;
    let request = ImportRequest::from_value(event.payload).map_err(|e| report(e, &request_id))?;

    importer
        .import(&request)
        .await
        .map(|_| ())
        .map_err(|e| report(e, &request_id))
}

fn report(err: SegmentError, request_id: &str) -> HandlerError {
    error!(
        request_id,
        error_type = err.error_type(),
        error = %err,
        "Invocation failed"
    );
    HandlerError(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lambda_runtime::Context;
    use segment_core::domain::{ImportDestination, ObjectLocation};
    use segment_core::ports::{ObjectReader, Result};
    use serde_json::json;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct StaticObject(&'static str);

    #[async_trait]
    impl ObjectReader for StaticObject {
        async fn get_object(&self, _location: &ObjectLocation) -> Result<Vec<u8>> {
            Ok(self.0.as_bytes().to_vec())
        }
    }

    /// Records uploads and checks the file is on disk when the upload happens
    #[derive(Default)]
    struct RecordingUploader {
        uploads: Mutex<Vec<(PathBuf, ObjectLocation)>>,
    }

    #[async_trait]
    impl ObjectUploader for RecordingUploader {
        async fn upload_file(&self, path: &Path, location: &ObjectLocation) -> Result<()> {
            assert!(path.exists(), "{} missing at upload time", path.display());
            self.uploads
                .lock()
                .unwrap()
                .push((path.to_path_buf(), location.clone()));
            Ok(())
        }
    }

    fn event(payload: Value) -> LambdaEvent<Value> {
        LambdaEvent::new(payload, Context::default())
    }

    fn importer_config(work_dir: &Path, keep_local_file: bool) -> ImporterConfig {
        ImporterConfig {
            destination: ImportDestination {
                bucket: "segments".into(),
                prefix: "imports/".into(),
            },
            work_dir: work_dir.to_path_buf(),
            keep_local_file,
        }
    }

    #[tokio::test]
    async fn test_handle_extract_returns_result() {
        let extractor = SegmentExtractor::new(Arc::new(StaticObject(
            r#"{"input":{"itemId":"abc123"},"output":{"usersList":["1","2"]}}"#,
        )));

        let result = handle_extract(&extractor, event(json!({"jobOutputFile": "s3://jobs/out.json.out"})))
            .await
            .unwrap();
        assert!(result.segment_name.starts_with("item_abc123_"));
        assert_eq!(result.users, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_handle_extract_reports_error_type() {
        let extractor = SegmentExtractor::new(Arc::new(StaticObject("\n")));

        let err = handle_extract(&extractor, event(json!({"jobOutputFile": "s3://jobs/empty.out"})))
            .await
            .unwrap_err();
        let diagnostic = Diagnostic::from(err);
        assert_eq!(diagnostic.error_type, "NoRecordsError");
        assert_eq!(diagnostic.error_message, "Job output file contains no records");
    }

    #[tokio::test]
    async fn test_handle_extract_bad_payload_is_invalid_input() {
        let extractor = SegmentExtractor::new(Arc::new(StaticObject("")));

        let err = handle_extract(&extractor, event(json!({"jobOutputFile": 42})))
            .await
            .unwrap_err();
        assert_eq!(Diagnostic::from(err).error_type, "InvalidInputError");
    }

    #[tokio::test]
    async fn test_handle_import_bad_payloads_are_invalid_input() {
        let dir = TempDir::new().unwrap();
        let uploader = Arc::new(RecordingUploader::default());
        let importer = build_importer(uploader.clone(), importer_config(dir.path(), false));

        for payload in [json!({"segmentName": "x"}), json!({"endpoints": ["a"]})] {
            let err = handle_import(&importer, event(payload.clone())).await.unwrap_err();
            assert_eq!(
                Diagnostic::from(err).error_type,
                "InvalidInputError",
                "payload: {}",
                payload
            );
        }
        assert!(uploader.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_build_importer_writes_into_configured_work_dir() {
        let dir = TempDir::new().unwrap();
        let work_dir = dir.path().join("segments");
        let uploader = Arc::new(RecordingUploader::default());
        let importer = build_importer(uploader.clone(), importer_config(&work_dir, true));

        handle_import(
            &importer,
            event(json!({"segmentName": "Shoes_20261018-090807", "endpoints": ["a", "b"]})),
        )
        .await
        .unwrap();

        let uploads = uploader.uploads.lock().unwrap();
        let expected = work_dir.join("Shoes_20261018-090807.csv");
        assert_eq!(uploads[0].0, expected);
        assert_eq!(
            uploads[0].1,
            ObjectLocation::new("segments", "imports/Shoes_20261018-090807.csv")
        );
        assert_eq!(std::fs::read_to_string(&expected).unwrap(), "Id\na\nb\n");
    }

    #[tokio::test]
    async fn test_build_importer_discards_by_default() {
        let dir = TempDir::new().unwrap();
        let importer = build_importer(
            Arc::new(RecordingUploader::default()),
            importer_config(dir.path(), false),
        );

        handle_import(&importer, event(json!({"segmentName": "Gone", "endpoints": []})))
            .await
            .unwrap();
        assert!(!dir.path().join("Gone.csv").exists());
    }
}
