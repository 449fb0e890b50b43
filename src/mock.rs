use crate::{err::BoxError, ObjectStore, PutError, PutRequest};
use bytes::Bytes;
use futures::future::{ready, BoxFuture, FutureExt};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bucket: String,
    pub content_type: String,
    pub content_length: u64,
    pub data: Bytes,
}

#[derive(Default)]
struct State {
    objects: HashMap<String, StoredObject>,
    bucket_lookups: usize,
    put_attempts: usize,
    in_flight: usize,
    max_in_flight: usize,
}

/// In-memory store. Knows exactly one bucket, can be told to reject every put and to hold
/// each put for a while so that concurrency can be observed.
#[derive(Clone)]
pub struct MemoryStore {
    bucket: String,
    reject_puts: bool,
    break_body: bool,
    put_delay: Duration,
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_owned(),
            reject_puts: false,
            break_body: false,
            put_delay: Duration::from_millis(0),
            state: Arc::new(Mutex::new(State::default())),
        }
    }
    pub fn rejecting(mut self) -> Self {
        self.reject_puts = true;
        self
    }
    /// Fail every put as if the connection dropped while the body was being sent.
    pub fn breaking_body(mut self) -> Self {
        self.break_body = true;
        self
    }
    pub fn with_put_delay(mut self, delay: Duration) -> Self {
        self.put_delay = delay;
        self
    }

    pub fn objects(&self) -> HashMap<String, StoredObject> {
        self.state.lock().unwrap().objects.clone()
    }
    pub fn bucket_lookups(&self) -> usize {
        self.state.lock().unwrap().bucket_lookups
    }
    pub fn put_attempts(&self) -> usize {
        self.state.lock().unwrap().put_attempts
    }
    pub fn max_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_in_flight
    }
}

impl ObjectStore for MemoryStore {
    fn lookup_bucket(&self, bucket: &str) -> BoxFuture<'_, Result<(), BoxError>> {
        self.state.lock().unwrap().bucket_lookups += 1;
        let result: Result<(), BoxError> = if bucket == self.bucket {
            Ok(())
        } else {
            Err(format!("no such bucket: {}", bucket).into())
        };
        ready(result).boxed()
    }

    fn put(&self, request: PutRequest) -> BoxFuture<'_, Result<(), PutError>> {
        async move {
            {
                let mut state = self.state.lock().unwrap();
                state.put_attempts += 1;
                state.in_flight += 1;
                state.max_in_flight = state.max_in_flight.max(state.in_flight);
            }
            let data = request.body.collect().await.map(|b| b.into_bytes());
            tokio::time::sleep(self.put_delay).await;

            let mut state = self.state.lock().unwrap();
            state.in_flight -= 1;
            let data = data.map_err(|e| PutError::Stream(e.into()))?;
            if self.break_body {
                return Err(PutError::Stream("connection reset while sending body".into()));
            }
            if self.reject_puts {
                return Err(PutError::Commit("access denied".into()));
            }
            if request.bucket != self.bucket {
                return Err(PutError::Commit(
                    format!("no such bucket: {}", request.bucket).into(),
                ));
            }
            state.objects.insert(
                request.key,
                StoredObject {
                    bucket: request.bucket,
                    content_type: request.content_type,
                    content_length: request.content_length,
                    data,
                },
            );
            Ok::<(), PutError>(())
        }
        .boxed()
    }
}
