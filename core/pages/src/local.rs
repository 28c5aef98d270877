//! Local filesystem page store.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use dropweb_common::{Error, PageName, Result};

use crate::page::Page;
use crate::store::PageStore;

/// Page store keeping one JSON document per page in a directory.
///
/// Writes go to a temporary file that is then renamed over the old record,
/// so a crash never leaves a half-written page behind.
pub struct LocalPageStore {
    root: PathBuf,
}

impl LocalPageStore {
    /// Create a store rooted at `root`.
    ///
    /// # Postconditions
    /// - Root directory is created if it doesn't exist
    ///
    /// # Errors
    /// - Permission denied
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            std::fs::create_dir_all(&root)?;
        }

        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the record for `name`.
    ///
    /// Names may contain `/` and other characters that are not valid in
    /// file names, so the whole name is percent-encoded.
    fn record_path(&self, name: &PageName) -> PathBuf {
        let encoded = utf8_percent_encode(name.as_str(), NON_ALPHANUMERIC).to_string();
        self.root.join(format!("{}.json", encoded))
    }
}

#[async_trait]
impl PageStore for LocalPageStore {
    async fn get(&self, name: &PageName) -> Result<Option<Page>> {
        let path = self.record_path(name);

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let page: Page = serde_json::from_slice(&data).map_err(|e| {
            Error::Storage(format!("Corrupt page record {}: {}", path.display(), e))
        })?;

        if page.name() != name {
            return Err(Error::Storage(format!(
                "Page record {} belongs to '{}'",
                path.display(),
                page.name()
            )));
        }

        Ok(Some(page))
    }

    async fn put(&self, page: &Page) -> Result<()> {
        let path = self.record_path(page.name());
        let tmp_path = path.with_extension("json.tmp");

        let data = serde_json::to_vec_pretty(page)?;
        fs::write(&tmp_path, &data).await?;
        fs::rename(&tmp_path, &path).await?;

        debug!("Stored page record {}", path.display());
        Ok(())
    }
}
