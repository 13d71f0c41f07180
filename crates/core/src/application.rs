use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{
    ExtractRequest, ExtractionResult, ImportDestination, ImportRequest, ObjectLocation,
};
use crate::error::SegmentError;
use crate::job_output::extract_last;
use crate::ports::{Clock, ObjectReader, ObjectUploader, Result, SegmentFileWriter, SystemClock};
use crate::utils::{segment_name, validate_segment_name};

/// Turns a batch job output file into a named user list
pub struct SegmentExtractor {
    reader: Arc<dyn ObjectReader>,
    clock: Box<dyn Clock>,
}

impl SegmentExtractor {
    /// Creates an extractor stamping names with the local system clock
    pub fn new(reader: Arc<dyn ObjectReader>) -> Self {
        Self {
            reader,
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Fetches the job output file and returns the last record's users
    pub async fn extract(&self, request: &ExtractRequest) -> Result<ExtractionResult> {
        let uri = request
            .job_output_file
            .as_deref()
            .ok_or_else(|| SegmentError::InvalidInput("jobOutputFile is required".into()))?;
        let location = ObjectLocation::parse(uri)?;

        info!(%location, "Reading job output file");
        let bytes = self.reader.get_object(&location).await?;
        let body = String::from_utf8(bytes).map_err(|e| {
            let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
            SegmentError::MalformedRecord {
                line: valid.iter().filter(|b| **b == b'\n').count() + 1,
                message: format!("object body is not valid UTF-8: {}", e.utf8_error()),
            }
        })?;

        let last = extract_last(&body)?;
        if last.records_seen > 1 {
            // Only the final record is returned; earlier ones are dropped.
            warn!(
                %location,
                records = last.records_seen,
                discarded = last.records_seen - 1,
                "Job output has multiple records, keeping the last one"
            );
        }

        let result = ExtractionResult {
            segment_name: segment_name(&last.base_name, self.clock.now()),
            users: last.users,
        };
        info!(
            segment = %result.segment_name,
            users = result.users.len(),
            "Extracted segment"
        );
        Ok(result)
    }
}

/// Writes a segment as CSV and uploads it for import
pub struct SegmentImporter {
    writer: Box<dyn SegmentFileWriter>,
    uploader: Arc<dyn ObjectUploader>,
    destination: ImportDestination,
    keep_local_file: bool,
}

impl SegmentImporter {
    /// Creates an importer that removes the local file after each upload.
    /// The local directory is owned by `writer`.
    pub fn new(
        writer: Box<dyn SegmentFileWriter>,
        uploader: Arc<dyn ObjectUploader>,
        destination: ImportDestination,
    ) -> Self {
        Self {
            writer,
            uploader,
            destination,
            keep_local_file: false,
        }
    }

    pub fn with_keep_local_file(mut self, keep_local_file: bool) -> Self {
        self.keep_local_file = keep_local_file;
        self
    }

    /// Writes the local file, uploads it and returns the uploaded location
    pub async fn import(&self, request: &ImportRequest) -> Result<ObjectLocation> {
        validate_segment_name(&request.segment_name)?;

        let path = self.writer.write(&request.segment_name, &request.endpoints)?;
        debug!(path = %path.display(), endpoints = request.endpoints.len(), "Wrote segment file");

        let location = self.destination.location_for(&request.segment_name);
        self.uploader.upload_file(&path, &location).await?;
        info!(%location, endpoints = request.endpoints.len(), "Uploaded segment");

        if !self.keep_local_file {
            if let Err(e) = self.writer.discard(&path) {
                warn!(path = %path.display(), error = %e, "Could not remove local segment file");
            }
        }

        Ok(location)
    }
}
