use std::sync::Arc;

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use s3_adapter::S3ObjectStore;
use segment_core::application::SegmentExtractor;
use segment_lambda::{handle_extract, init_tracing};
use serde_json::Value;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let extractor = SegmentExtractor::new(Arc::new(S3ObjectStore::from_env().await));
    info!("Segment extractor initialized");

    run(service_fn(|event: LambdaEvent<Value>| {
        handle_extract(&extractor, event)
    }))
    .await
}
