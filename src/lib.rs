//! # B2 upload
//! Upload local files to a Backblaze B2 bucket concurrently and get back their public URLs.
//!
//! https://www.backblaze.com/docs/cloud-storage-s3-compatible-api
//!
//! - Check the configuration and the bucket with `Uploader::connect`.
//! - Upload many files at once with `Uploader::upload_files`, or one with
//! `Uploader::upload_file`.
//!
//! Every file is stored under a name generated by [`naming::object_name`] and tagged with a
//! content type guessed from its extension. Failed uploads are logged and reported, never
//! retried.

use std::{path::PathBuf, sync::Arc, time::Duration};

mod config;
pub mod content_type;
pub mod err;
pub mod naming;
mod store;
mod upload;

pub use config::*;
pub use err::Error;
pub use store::*;
pub use upload::*;

#[cfg(test)]
mod mock;

/// Uploads files to the bucket named in its [`Config`]. Cloning is cheap and clones share
/// the store handle and the configuration.
#[derive(Clone)]
pub struct Uploader<S> {
    store: S,
    config: Arc<Config>,
}
impl<S> Uploader<S> {
    fn new(store: S, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// One file to upload.
#[derive(Debug, Clone)]
pub struct UploadTask {
    /// Position of the file in the input list
    pub seq: usize,
    pub path: PathBuf,
}

/// A successful upload.
#[derive(Debug, Clone)]
pub struct UploadReport {
    /// Public URL of the object: the base URL followed by `key`
    pub url: String,
    /// Generated object name
    pub key: String,
    pub content_type: String,
    /// Size in bytes
    pub size: u64,
    /// Time from opening the file until the store committed the object
    pub duration: Duration,
}

/// What happened to one [`UploadTask`].
#[derive(Debug)]
pub struct UploadOutcome {
    pub task: UploadTask,
    pub result: Result<UploadReport, Error>,
}

/// Counts over a whole batch, returned by `Uploader::upload_files`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}
impl BatchReport {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
