use snafu::Snafu;
use std::{io, path::PathBuf};

/// Error returned by an [`ObjectStore`](crate::ObjectStore) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Snafu, Debug)]
#[snafu(visibility = "pub")]
pub enum Error {
    // Configuration errors. These abort the run before any upload starts.
    #[snafu(display("Missing configuration value '{}' ({} is unset or empty)", name, env))]
    MissingConfig {
        name: &'static str,
        env: &'static str,
    },
    #[snafu(display("Invalid configuration value '{}': {}", name, reason))]
    InvalidConfig { name: &'static str, reason: String },
    #[snafu(display("Failed to look up bucket '{}': {}", bucket, source))]
    BucketLookup { bucket: String, source: BoxError },

    // Per-file errors. Logged at the task boundary, siblings keep going.
    #[snafu(display("Failed to open file {}: {}", path.display(), source))]
    Open { path: PathBuf, source: io::Error },
    #[snafu(display("Failed to open file {}: not a regular file", path.display()))]
    NotAFile { path: PathBuf },
    #[snafu(display("Failed to upload file {}: {}", path.display(), source))]
    Stream { path: PathBuf, source: BoxError },
    #[snafu(display(
        "Failed to commit object '{}' for file {}: {}",
        key,
        path.display(),
        source
    ))]
    Commit {
        path: PathBuf,
        key: String,
        source: BoxError,
    },
    #[snafu(display("Upload task for {} did not finish: {}", path.display(), source))]
    TaskPanicked {
        path: PathBuf,
        source: tokio::task::JoinError,
    },
}

impl Error {
    /// True for errors that happen before any upload is attempted.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::MissingConfig { .. } | Error::InvalidConfig { .. } | Error::BucketLookup { .. }
        )
    }
}
