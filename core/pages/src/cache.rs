//! Revalidating page cache.
//!
//! A lookup costs one cheap probe when the stored page is current, and one
//! probe plus one full fetch when it is not. Failed fetches never touch the
//! stored record: the updated page is built on a copy and only persisted
//! once the fetch has succeeded.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use dropweb_common::{Account, Error, PageName, Result};
use dropweb_storage::RemoteSource;

use crate::config::{CacheConfig, ProbeMode};
use crate::freshness::{self, Freshness, StaleReason};
use crate::page::Page;
use crate::store::{AccountSource, PageStore};

/// Cache of page records that revalidates against the remote source.
///
/// Lookups of different names run fully in parallel. Lookups of the same
/// name are serialized, so concurrent callers cause at most one full fetch.
pub struct RevalidatingCache {
    remote: Arc<dyn RemoteSource>,
    store: Arc<dyn PageStore>,
    accounts: Arc<dyn AccountSource>,
    config: CacheConfig,
    locks: Mutex<HashMap<PageName, Arc<AsyncMutex<()>>>>,
}

impl RevalidatingCache {
    /// Create a new cache.
    pub fn new(
        remote: Arc<dyn RemoteSource>,
        store: Arc<dyn PageStore>,
        accounts: Arc<dyn AccountSource>,
        config: CacheConfig,
    ) -> Self {
        Self {
            remote,
            store,
            accounts,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Return an up-to-date record for `name`.
    ///
    /// # Postconditions
    /// - At most one probe and one full fetch were issued
    /// - No full fetch was issued if the remote validator is unchanged
    ///
    /// # Errors
    /// - `Error::Configuration` if not exactly one account exists
    /// - `Error::Fetch` if the probe or the full fetch returned a
    ///   non-success status; the stored record is left unchanged
    /// - `Error::Timeout` / `Error::Network` on transport failure; the
    ///   stored record is left unchanged
    /// - Store errors
    pub async fn get_page(&self, name: &PageName) -> Result<Page> {
        let account = self.accounts.load_account().await?;
        let url = account.url_for(name);

        let lock = self.lock_for(name);
        let _guard = lock.lock().await;

        let stored = match self.store.get(name).await? {
            Some(page) => page,
            None => Page::new(name.clone(), url.clone()),
        };

        match self.freshness(&stored, &url).await? {
            Freshness::Fresh => {
                debug!("Page '{}' is fresh", name);
                Ok(stored)
            }
            Freshness::Stale(reason) => {
                info!("Refreshing page '{}': {}", name, reason);
                self.refresh(stored, &url, &account).await
            }
        }
    }

    /// Decide whether `page` needs a full fetch, probing only when that
    /// can avoid one.
    async fn freshness(&self, page: &Page, url: &str) -> Result<Freshness> {
        let Some(etag) = page.etag() else {
            return Ok(Freshness::Stale(StaleReason::NeverFetched));
        };
        if page.url() != url {
            return Ok(Freshness::Stale(StaleReason::UrlChanged));
        }
        if self.config.probe == ProbeMode::AlwaysFetch {
            return Ok(Freshness::Stale(StaleReason::ProbingDisabled));
        }

        let probe = self.bounded(self.remote.probe(url)).await?;
        let freshness = freshness::classify(etag, &probe)?;

        if freshness == Freshness::Stale(StaleReason::ProbeUnsupported) {
            warn!(
                "Remote {} rejected probe with status {}, fetching in full",
                self.remote.name(),
                probe.status
            );
        }

        Ok(freshness)
    }

    /// Fetch, decode and persist a new version of `page`.
    async fn refresh(&self, mut page: Page, url: &str, account: &Account) -> Result<Page> {
        let response = self
            .bounded(self.remote.fetch(url))
            .await?
            .error_for_status()?;

        debug!(
            "Fetched {} bytes for '{}' (etag {:?})",
            response.body.len(),
            page.name(),
            response.etag
        );

        page.set_content(url, response.body, response.etag, account.password.as_bytes());
        self.store.put(&page).await?;

        Ok(page)
    }

    /// Run a remote request under the configured timeout.
    async fn bounded<T>(&self, request: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.config.timeout, request)
            .await
            .map_err(|_| Error::Timeout(self.config.timeout))?
    }

    /// Per-name lock; created on first use and kept for the cache's lifetime.
    fn lock_for(&self, name: &PageName) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(name.clone()).or_default().clone()
    }
}
