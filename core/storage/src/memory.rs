//! In-memory remote source for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use dropweb_common::Result;

use crate::provider::{RemoteResponse, RemoteSource};

/// Stored remote object.
#[derive(Debug, Clone)]
struct Object {
    body: Vec<u8>,
    etag: Option<String>,
}

/// In-memory remote source.
///
/// Useful for testing. Objects are keyed by URL, and every probe and fetch
/// is counted so tests can assert how much traffic an operation caused.
/// Unknown URLs answer 404.
#[derive(Default)]
pub struct MemoryRemote {
    objects: Arc<RwLock<HashMap<String, Object>>>,
    probe_status: RwLock<Option<u16>>,
    fetch_status: RwLock<Option<u16>>,
    delay: RwLock<Option<Duration>>,
    revision: AtomicU64,
    probes: AtomicUsize,
    fetches: AtomicUsize,
}

impl MemoryRemote {
    /// Create a new empty memory remote.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object under a fresh generated validator.
    ///
    /// Returns the validator.
    pub fn put(&self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> String {
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        let etag = format!("\"rev-{}\"", revision);
        self.put_with_etag(url, body, Some(&etag));
        etag
    }

    /// Store an object with an explicit validator (or none).
    pub fn put_with_etag(
        &self,
        url: impl Into<String>,
        body: impl Into<Vec<u8>>,
        etag: Option<&str>,
    ) {
        let object = Object {
            body: body.into(),
            etag: etag.map(str::to_string),
        };
        self.objects.write().unwrap().insert(url.into(), object);
    }

    /// Remove an object.
    pub fn remove(&self, url: &str) {
        self.objects.write().unwrap().remove(url);
    }

    /// Answer every probe with this status instead of the object's metadata.
    pub fn set_probe_status(&self, status: Option<u16>) {
        *self.probe_status.write().unwrap() = status;
    }

    /// Answer every full fetch with this status instead of the object.
    pub fn set_fetch_status(&self, status: Option<u16>) {
        *self.fetch_status.write().unwrap() = status;
    }

    /// Delay every request, to exercise caller timeouts.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write().unwrap() = delay;
    }

    /// Number of probes served so far.
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Number of full fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        let delay = *self.delay.read().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn lookup(&self, url: &str) -> Option<Object> {
        self.objects.read().unwrap().get(url).cloned()
    }
}

#[async_trait]
impl RemoteSource for MemoryRemote {
    fn name(&self) -> &str {
        "memory"
    }

    async fn probe(&self, url: &str) -> Result<RemoteResponse> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.wait().await;

        if let Some(status) = *self.probe_status.read().unwrap() {
            return Ok(RemoteResponse::status(status));
        }

        Ok(match self.lookup(url) {
            Some(object) => RemoteResponse::ok(object.etag, Vec::new()),
            None => RemoteResponse::status(404),
        })
    }

    async fn fetch(&self, url: &str) -> Result<RemoteResponse> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.wait().await;

        if let Some(status) = *self.fetch_status.read().unwrap() {
            return Ok(RemoteResponse::status(status));
        }

        Ok(match self.lookup(url) {
            Some(object) => RemoteResponse::ok(object.etag, object.body),
            None => RemoteResponse::status(404),
        })
    }
}
