//! Page records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use dropweb_common::PageName;
use dropweb_crypto::container;

use crate::metadata::{self, Metadata};
use crate::render;

/// Cached copy of one published document.
///
/// The text and metadata are always derived from `raw_bytes` in the same
/// update; they cannot be changed on their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    name: PageName,
    url: String,
    #[serde(with = "base64_bytes")]
    raw_bytes: Vec<u8>,
    decrypted_text: String,
    etag: Option<String>,
    metadata: Metadata,
    fetched_at: Option<DateTime<Utc>>,
}

/// Metadata handed to the rendering layer alongside the HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub title: String,
    pub tags: Vec<String>,
    pub date_published: Option<NaiveDate>,
    /// The document was stored encrypted.
    pub private: bool,
    /// Only the owner may see the page.
    pub restricted: bool,
}

impl Page {
    /// Create an empty, never-fetched record.
    pub fn new(name: PageName, url: impl Into<String>) -> Self {
        Self {
            name,
            url: url.into(),
            raw_bytes: Vec::new(),
            decrypted_text: String::new(),
            etag: None,
            metadata: Metadata::default(),
            fetched_at: None,
        }
    }

    /// Replace the content with freshly fetched bytes.
    ///
    /// Decrypts the bytes if they carry the legacy container, re-extracts
    /// metadata and records the validator, all in one step.
    pub fn set_content(
        &mut self,
        url: impl Into<String>,
        raw_bytes: Vec<u8>,
        etag: Option<String>,
        password: &[u8],
    ) {
        let decrypted_text = match container::open(&raw_bytes, password) {
            Some(plain) => String::from_utf8_lossy(&plain).into_owned(),
            None => String::from_utf8_lossy(&raw_bytes).into_owned(),
        };

        self.metadata = metadata::extract(&decrypted_text);
        self.url = url.into();
        self.raw_bytes = raw_bytes;
        self.decrypted_text = decrypted_text;
        self.etag = etag;
        self.fetched_at = Some(Utc::now());
    }

    pub fn name(&self) -> &PageName {
        &self.name
    }

    /// Remote address the content was fetched from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Bytes exactly as last fetched.
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw_bytes
    }

    pub fn decrypted_text(&self) -> &str {
        &self.decrypted_text
    }

    /// Validator of the stored content; `None` until the first fetch.
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref().filter(|etag| !etag.is_empty())
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.metadata.tags
    }

    pub fn date_published(&self) -> Option<NaiveDate> {
        self.metadata.date_published
    }

    /// When the content was last fetched.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// Whether decryption took place.
    ///
    /// Follows the container marker rather than comparing text and bytes,
    /// since plaintext that is not valid UTF-8 is decoded lossily.
    pub fn is_private(&self) -> bool {
        container::is_encrypted(&self.raw_bytes)
    }

    /// Whether only the owner may see the page.
    ///
    /// Encrypted pages are restricted, and so are pages whose legacy
    /// `access` field is anything but `public`.
    pub fn is_restricted(&self) -> bool {
        self.is_private() || self.metadata.is_access_restricted()
    }

    /// Metadata for the rendering layer.
    pub fn meta(&self) -> PageMeta {
        PageMeta {
            title: self.metadata.title.clone(),
            tags: self.metadata.tags.iter().cloned().collect(),
            date_published: self.metadata.date_published,
            private: self.is_private(),
            restricted: self.is_restricted(),
        }
    }

    /// Render the body (without its metadata header) and collect its metadata.
    pub fn rendered_html_and_meta(&self) -> (String, PageMeta) {
        let (_, body) = metadata::split(&self.decrypted_text);
        (render::markdown_to_html(body), self.meta())
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
