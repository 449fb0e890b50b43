use super::*;
use crate::err::{self, BoxError};
use aws_sdk_s3::primitives::ByteStream;
use chrono::Local;
use futures::{future::Future, stream, StreamExt};
use futures_stopwatch::try_stopwatch;
use snafu::{ensure, ResultExt};
use std::path::Path;
use tracing::{debug, error, info};

impl<S: ObjectStore + Clone + Send + Sync + 'static> Uploader<S> {
    /// Validate `config` and look up its bucket. Nothing is uploaded if this fails.
    pub async fn connect(store: S, config: Config) -> Result<Self, Error> {
        let config = config.validate()?;
        store
            .lookup_bucket(&config.bucket)
            .await
            .context(err::BucketLookup {
                bucket: config.bucket.clone(),
            })?;
        debug!(bucket = %config.bucket, endpoint = %config.endpoint(), "bucket found");
        Ok(Self::new(store, config))
    }

    /// Upload every file in `files`, one spawned task per file.
    ///
    /// All uploads start at once unless `max_concurrent` is configured. `on_result` is called
    /// with the outcome of each upload in completion order, and this returns once every upload
    /// has either succeeded or failed. A failed upload is logged and counted in the returned
    /// [`BatchReport`], it never stops the others.
    pub async fn upload_files<I, P, F>(&self, files: I, mut on_result: P) -> BatchReport
    where
        I: IntoIterator<Item = PathBuf>,
        P: FnMut(UploadOutcome) -> F,
        F: Future<Output = ()>,
    {
        let tasks: Vec<UploadTask> = files
            .into_iter()
            .enumerate()
            .map(|(seq, path)| UploadTask { seq, path })
            .collect();
        let parallelization = self.config.max_concurrent.unwrap_or(tasks.len()).max(1);
        info!(
            files = tasks.len(),
            parallelization,
            bucket = %self.config.bucket,
            "starting upload"
        );

        let jobs = tasks.into_iter().map(|task| {
            let uploader = self.clone();
            async move {
                let path = task.path.clone();
                let handle = tokio::spawn(async move { uploader.upload_file(&path).await });
                let result = match handle.await {
                    Ok(result) => result,
                    Err(source) => Err(Error::TaskPanicked {
                        path: task.path.clone(),
                        source,
                    }),
                };
                UploadOutcome { task, result }
            }
        });

        let mut report = BatchReport::default();
        let mut outcomes = stream::iter(jobs).buffer_unordered(parallelization);
        while let Some(outcome) = outcomes.next().await {
            report.attempted += 1;
            match &outcome.result {
                Ok(_) => report.succeeded += 1,
                Err(e) => {
                    report.failed += 1;
                    error!(path = %outcome.task.path.display(), "{}", e);
                }
            }
            on_result(outcome).await;
        }

        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            "upload finished"
        );
        report
    }

    /// Upload a single file under a freshly generated name and return where it ended up.
    pub async fn upload_file(&self, path: &Path) -> Result<UploadReport, Error> {
        let (object, duration) = try_stopwatch(self.put_file(path)).await?;
        let url = format!("{}{}", self.config.base_url, object.key);
        info!(
            path = %path.display(),
            url = %url,
            size = object.size,
            ms = duration.as_millis() as u64,
            "uploaded"
        );
        Ok(UploadReport {
            url,
            key: object.key,
            content_type: object.content_type,
            size: object.size,
            duration,
        })
    }

    async fn put_file(&self, path: &Path) -> Result<CommittedObject, Error> {
        let file = tokio::fs::File::open(path)
            .await
            .context(err::Open { path })?;
        let metadata = file.metadata().await.context(err::Open { path })?;
        ensure!(metadata.is_file(), err::NotAFile { path });

        let key = naming::object_name(path, Local::now().date_naive(), &mut rand::thread_rng());
        let content_type = content_type::content_type(path);
        let size = metadata.len();
        debug!(path = %path.display(), %key, %content_type, size, "streaming file");

        let body = ByteStream::read_from()
            .file(file)
            .build()
            .await
            .map_err(BoxError::from)
            .context(err::Stream { path })?;

        let put = self.store.put(PutRequest {
            bucket: self.config.bucket.clone(),
            key: key.clone(),
            content_type: content_type.clone(),
            content_length: size,
            body,
        });
        match put.await {
            Ok(()) => Ok(CommittedObject {
                key,
                content_type,
                size,
            }),
            Err(PutError::Stream(source)) => Err(Error::Stream {
                path: path.to_owned(),
                source,
            }),
            Err(PutError::Commit(source)) => Err(Error::Commit {
                path: path.to_owned(),
                key,
                source,
            }),
        }
    }
}

/// An object the store has acknowledged.
struct CommittedObject {
    key: String,
    content_type: String,
    size: u64,
}

/// Expand the command line inputs into the files to upload.
///
/// With `recursive`, every directory is replaced by the regular files below it (see
/// [`files_recursive`]). Everything else is passed through untouched, so that a missing file
/// still gets its own failed upload.
pub fn expand_inputs<I>(inputs: I, recursive: bool) -> Vec<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    inputs
        .into_iter()
        .flat_map(|path| {
            if recursive && path.is_dir() {
                files_recursive(path).collect::<Vec<_>>()
            } else {
                vec![path]
            }
        })
        .collect()
}

/// Convenience function (using `walkdir`) to list all regular files below `src_dir`, in a
/// stable order.
pub fn files_recursive(src_dir: PathBuf) -> impl Iterator<Item = PathBuf> {
    walkdir::WalkDir::new(src_dir)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        .into_iter()
        .filter_map(|entry| {
            entry.ok().and_then(|entry| {
                if entry.file_type().is_file() {
                    Some(entry.into_path())
                } else {
                    None
                }
            })
        })
}
