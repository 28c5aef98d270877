//! Metadata header extraction.
//!
//! Documents may start with a block of `key: value` lines:
//!
//! ```text
//! title: Spring cleaning
//! tags: home, chores
//!     garden
//! datepublished: Mar 3, 2011
//!
//! Body starts here.
//! ```
//!
//! Keys are case-insensitive. Lines indented by four or more spaces add
//! another value to the previous key. The block ends at the first blank
//! line, or at the first line that is not a metadata line, which then
//! belongs to the body.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use dropweb_common::{Error, Result};

/// Format of the `datepublished` value, e.g. `Jan 5, 2010`.
pub const DATE_FORMAT: &str = "%b %d, %Y";

/// Structured fields taken from a document's metadata header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// First `title` value; empty when the header has none.
    pub title: String,
    /// Words of all `tags` values, split on commas and whitespace.
    pub tags: BTreeSet<String>,
    /// Parsed `datepublished`; `None` for undated pages.
    pub date_published: Option<NaiveDate>,
    /// Legacy `access` value.
    pub access: Option<String>,
}

impl Metadata {
    /// Whether the legacy `access` field restricts the page.
    ///
    /// Anything other than `public` (case-insensitive) restricts it.
    pub fn is_access_restricted(&self) -> bool {
        self.access
            .as_deref()
            .is_some_and(|access| !access.trim().eq_ignore_ascii_case("public"))
    }

    fn from_fields(fields: &BTreeMap<String, Vec<String>>) -> Self {
        let first = |key: &str| fields.get(key).and_then(|values| values.first());

        let tags = fields
            .get("tags")
            .into_iter()
            .flatten()
            .flat_map(|value| value.split(|c: char| c == ',' || c.is_whitespace()))
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();

        let date_published = match first("datepublished")
            .map(String::as_str)
            .map(parse_published_date)
        {
            Some(Ok(date)) => Some(date),
            Some(Err(e)) => {
                warn!("Treating page as undated: {}", e);
                None
            }
            None => None,
        };

        Self {
            title: first("title").cloned().unwrap_or_default(),
            tags,
            date_published,
            access: first("access").cloned(),
        }
    }
}

/// Parse a `datepublished` value.
///
/// # Errors
/// - Returns `Error::Metadata` if the value does not match `Mon DD, YYYY`
pub fn parse_published_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| Error::Metadata(format!("Invalid publish date '{}': {}", value, e)))
}

/// Split a document into its metadata and the body that follows the header.
///
/// Never fails: malformed values degrade to absent fields.
pub fn split(text: &str) -> (Metadata, &str) {
    let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut current: Option<String> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);

        if content.trim().is_empty() {
            offset += line.len();
            break;
        }

        if let Some((key, value)) = key_value(content) {
            fields.entry(key.clone()).or_default().push(value);
            current = Some(key);
        } else if let (Some(key), Some(value)) = (&current, continuation(content)) {
            fields.entry(key.clone()).or_default().push(value);
        } else {
            break;
        }

        offset += line.len();
    }

    (Metadata::from_fields(&fields), &text[offset..])
}

/// Extract only the metadata of a document.
pub fn extract(text: &str) -> Metadata {
    split(text).0
}

/// Parse `key: value` with at most three leading spaces.
fn key_value(line: &str) -> Option<(String, String)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }

    let (key, value) = line[indent..].split_once(':')?;
    let valid_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid_key {
        return None;
    }

    Some((key.to_ascii_lowercase(), value.trim().to_string()))
}

/// Parse an indented continuation value.
fn continuation(line: &str) -> Option<String> {
    if line.starts_with("    ") || line.starts_with('\t') {
        Some(line.trim().to_string())
    } else {
        None
    }
}
