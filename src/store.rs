//! The remote side of an upload. [`ObjectStore`] is implemented for the AWS SDK S3 client,
//! which talks to B2 through its S3-compatible API.
use crate::{err::BoxError, Config};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{
    config::{Credentials, RequestChecksumCalculation},
    error::SdkError,
    primitives::ByteStream,
    Client,
};
use futures::future::{BoxFuture, FutureExt};
use std::fmt;

/// One object to be written.
#[derive(Debug)]
pub struct PutRequest {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub content_length: u64,
    pub body: ByteStream,
}

/// Why a put failed.
#[derive(Debug)]
pub enum PutError {
    /// The body could not be read or sent. The store never saw the whole object.
    Stream(BoxError),
    /// The store received the request but did not commit the object.
    Commit(BoxError),
}

impl PutError {
    /// Sort an SDK error into the two kinds of put failures. Failures to build or dispatch the
    /// request (including reading the body) and timeouts are stream failures, anything the
    /// service answered is a commit failure.
    pub fn from_sdk<E, R>(err: SdkError<E, R>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
        R: fmt::Debug + Send + Sync + 'static,
    {
        match err {
            SdkError::ConstructionFailure(_)
            | SdkError::DispatchFailure(_)
            | SdkError::TimeoutError(_) => PutError::Stream(err.into()),
            _ => PutError::Commit(err.into()),
        }
    }
}

pub trait ObjectStore {
    /// Resolve `bucket` by name. Fails if it does not exist or is not accessible with the
    /// configured credentials.
    fn lookup_bucket(&self, bucket: &str) -> BoxFuture<'_, Result<(), BoxError>>;
    /// Write one object. Resolves to `Ok` only once the store has committed it.
    fn put(&self, request: PutRequest) -> BoxFuture<'_, Result<(), PutError>>;
}

impl ObjectStore for Client {
    fn lookup_bucket(&self, bucket: &str) -> BoxFuture<'_, Result<(), BoxError>> {
        let request = self.head_bucket().bucket(bucket);
        async move { request.send().await.map(drop).map_err(BoxError::from) }.boxed()
    }

    fn put(&self, request: PutRequest) -> BoxFuture<'_, Result<(), PutError>> {
        let PutRequest {
            bucket,
            key,
            content_type,
            content_length,
            body,
        } = request;
        let request = self
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .content_length(content_length as i64)
            .body(body);
        async move { request.send().await.map(drop).map_err(PutError::from_sdk) }.boxed()
    }
}

/// S3 client for the B2 endpoint described by `config`, authenticated with its application
/// key. `config` is expected to be validated.
pub async fn b2_client(config: &Config) -> Client {
    let credentials = Credentials::new(&config.key_id, &config.key, None, None, "b2-upload");
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .endpoint_url(config.endpoint())
        .credentials_provider(credentials)
        .load()
        .await;
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(true)
        // B2 rejects the flexible checksum headers the SDK sends by default
        .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
        .build();
    Client::from_conf(s3_config)
}
