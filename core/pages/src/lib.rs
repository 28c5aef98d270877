//! Page records and the revalidating page cache for dropweb.
//!
//! This module provides:
//! - `Page` records holding fetched bytes, decrypted text and metadata
//! - Metadata header extraction and Markdown rendering
//! - Narrow page and account store interfaces with memory and file backends
//! - `RevalidatingCache`, which re-fetches a document only when its
//!   validator changes

pub mod cache;
pub mod config;
pub mod freshness;
pub mod local;
pub mod metadata;
pub mod page;
pub mod render;
pub mod store;

pub use cache::RevalidatingCache;
pub use config::{CacheConfig, ProbeMode, PublisherConfig};
pub use freshness::{Freshness, StaleReason};
pub use local::LocalPageStore;
pub use metadata::{parse_published_date, Metadata};
pub use page::{Page, PageMeta};
pub use store::{AccountSource, MemoryPageStore, PageStore, StaticAccounts};
