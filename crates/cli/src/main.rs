use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use csv_adapter::CsvSegmentWriter;
use s3_adapter::S3ObjectStore;
use segment_core::application::{SegmentExtractor, SegmentImporter};
use segment_core::config::{BUCKET_VAR, KEEP_LOCAL_FILE_VAR, PREFIX_VAR, WORK_DIR_VAR};
use segment_core::domain::{ExtractRequest, ExtractionResult, ImportDestination, ImportRequest};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Runs the segment extractor or importer locally against S3
#[derive(Parser, Debug)]
#[command(name = "segment-cli")]
#[command(about = "Extracts recommended users from batch job output and imports them as segments")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the segment name and users of a batch job output file as JSON
    Extract {
        /// S3 URI of the job output file (s3://bucket/key)
        #[arg(short = 'j', long = "job-output-file", required = true)]
        job_output_file: String,
    },
    /// Write a segment CSV and upload it to the import bucket
    Import(ImportArgs),
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// JSON import request (or extraction result), `-` reads stdin
    #[arg(short = 'i', long = "input", default_value = "-")]
    input: String,

    /// Destination bucket
    #[arg(long, env = BUCKET_VAR)]
    bucket: String,

    /// Key prefix prepended to `<segmentName>.csv`
    #[arg(long, env = PREFIX_VAR, default_value = "")]
    prefix: String,

    /// Where the CSV is written before upload (defaults to the system temp dir)
    #[arg(long, env = WORK_DIR_VAR)]
    work_dir: Option<PathBuf>,

    /// Leave the CSV on disk after upload
    #[arg(long, env = KEEP_LOCAL_FILE_VAR)]
    keep_local_file: bool,
}

/// The importer takes either its own request shape or the extractor's output
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum ImportInput {
    Request(ImportRequest),
    Extraction(ExtractionResult),
}

impl From<ImportInput> for ImportRequest {
    fn from(input: ImportInput) -> Self {
        match input {
            ImportInput::Request(request) => request,
            ImportInput::Extraction(result) => result.into(),
        }
    }
}

fn parse_import_input(raw: &str) -> Result<ImportRequest> {
    let input: ImportInput = serde_json::from_str(raw)
        .context("input must contain segmentName with endpoints or users")?;
    Ok(input.into())
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read import request from stdin")?;
        Ok(buf)
    } else {
        fs::read_to_string(input).with_context(|| format!("failed to read {}", input))
    }
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Extract { job_output_file } => {
            let extractor = SegmentExtractor::new(Arc::new(S3ObjectStore::from_env().await));
            let result = extractor
                .extract(&ExtractRequest {
                    job_output_file: Some(job_output_file),
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Import(args) => {
            let request = parse_import_input(&read_input(&args.input)?)?;
            let destination = ImportDestination {
                bucket: args.bucket,
                prefix: args.prefix,
            };

            // Instantiate concrete adapters and inject them into the core service
            let writer = CsvSegmentWriter::new(args.work_dir.unwrap_or_else(std::env::temp_dir));
            let uploader = Arc::new(S3ObjectStore::from_env().await);
            let importer = SegmentImporter::new(Box::new(writer), uploader, destination)
                .with_keep_local_file(args.keep_local_file);

            let location = importer.import(&request).await?;
            println!("Uploaded {} endpoints to {}", request.endpoints.len(), location);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli.command).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_import_input_accepts_request() {
        let request =
            parse_import_input(r#"{"segmentName":"Shoes_20261018-090807","endpoints":["a","b"]}"#)
                .unwrap();
        assert_eq!(request.segment_name, "Shoes_20261018-090807");
        assert_eq!(request.endpoints, vec!["a", "b"]);
    }

    #[test]
    fn test_import_input_accepts_extraction_result() {
        let request =
            parse_import_input(r#"{"segmentName":"item_1_20261018-090807","users":["u1"]}"#).unwrap();
        assert_eq!(request.endpoints, vec!["u1"]);
    }

    #[test]
    fn test_import_input_rejects_other_shapes() {
        assert!(parse_import_input(r#"{"segmentName":"x"}"#).is_err());
        assert!(parse_import_input("not json").is_err());
    }

    #[test]
    fn test_parse_import_flags() {
        let cli = Cli::try_parse_from([
            "segment-cli",
            "import",
            "--input",
            "event.json",
            "--bucket",
            "segments",
            "--prefix",
            "imports/",
            "--keep-local-file",
        ])
        .unwrap();
        match cli.command {
            Command::Import(args) => {
                assert_eq!(args.input, "event.json");
                assert_eq!(args.bucket, "segments");
                assert_eq!(args.prefix, "imports/");
                assert!(args.keep_local_file);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
