use b2_upload::*;
use clap::Parser;
use futures::future::ready;
use std::{path::PathBuf, process::ExitCode};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Upload files to a Backblaze B2 bucket and print their public URLs.
#[derive(Parser, Debug)]
#[command(name = "upload", version)]
struct Args {
    /// Files to upload
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,

    /// B2 application key ID
    #[arg(long, env = "B2_APPLICATION_KEY_ID", hide_env_values = true)]
    key_id: Option<String>,
    /// B2 application key
    #[arg(long, env = "B2_APPLICATION_KEY", hide_env_values = true)]
    key: Option<String>,
    /// Public URL the bucket is served under; object names are appended to it
    #[arg(long, env = "B2_CUSTOM_URL")]
    custom_url: Option<String>,
    /// Destination bucket
    #[arg(long, env = "B2_BUCKET_NAME")]
    bucket: Option<String>,
    /// Bucket region
    #[arg(long, env = "B2_REGION", default_value = DEFAULT_REGION)]
    region: String,
    /// S3-compatible endpoint [default: https://s3.<region>.backblazeb2.com]
    #[arg(long, env = "B2_ENDPOINT")]
    endpoint: Option<String>,
    /// Maximum number of simultaneous uploads [default: all files at once]
    #[arg(long, env = "B2_MAX_CONCURRENT")]
    max_concurrent: Option<usize>,

    /// Upload every file below directory arguments
    #[arg(short, long)]
    recursive: bool,
    /// Exit with status 1 if any upload failed
    #[arg(long)]
    fail_on_error: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            key_id: self.key_id.clone().unwrap_or_default(),
            key: self.key.clone().unwrap_or_default(),
            base_url: self.custom_url.clone().unwrap_or_default(),
            bucket: self.bucket.clone().unwrap_or_default(),
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
            max_concurrent: self.max_concurrent,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let result = run(&args).await;
    if let Err(e) = &result {
        error!("{}", e);
    }
    ExitCode::from(exit_status(&args, &result))
}

/// Exit status of a run: 1 if it aborted, or if an upload failed and `--fail-on-error` is set.
/// A batch with failed uploads otherwise still exits 0.
fn exit_status(args: &Args, result: &Result<BatchReport, Error>) -> u8 {
    match result {
        Ok(report) if args.fail_on_error && report.has_failures() => 1,
        Ok(_) => 0,
        Err(_) => 1,
    }
}

async fn run(args: &Args) -> Result<BatchReport, Error> {
    let config = args.config().validate()?;
    let client = b2_client(&config).await;
    let uploader = Uploader::connect(client, config).await?;

    let files = expand_inputs(args.files.iter().cloned(), args.recursive);
    let report = uploader
        .upload_files(files, |outcome| {
            if let Ok(report) = &outcome.result {
                println!("{}", report.url);
            }
            ready(())
        })
        .await;
    Ok(report)
}
