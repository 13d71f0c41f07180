use std::sync::Arc;

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use s3_adapter::S3ObjectStore;
use segment_core::config::ImporterConfig;
use segment_lambda::{build_importer, handle_import, init_tracing};
use serde_json::Value;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ImporterConfig::from_env()?;
    info!(
        bucket = %config.destination.bucket,
        prefix = %config.destination.prefix,
        work_dir = %config.work_dir.display(),
        keep_local_file = config.keep_local_file,
        "Segment importer initialized"
    );
    let importer = build_importer(Arc::new(S3ObjectStore::from_env().await), config);

    run(service_fn(|event: LambdaEvent<Value>| {
        handle_import(&importer, event)
    }))
    .await
}
