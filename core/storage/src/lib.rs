//! Remote source abstraction for dropweb.
//!
//! This module provides a trait-based interface for the object store that
//! hosts published documents, with an HTTP implementation and an in-memory
//! fake for tests.
//!
//! # Design Principles
//! - Two operations only: a metadata-only probe and a full fetch
//! - Status codes are returned, not interpreted; callers decide what fails
//! - Each call performs exactly one request; no retries

pub mod http;
pub mod memory;
pub mod provider;

pub use http::{HttpRemote, DEFAULT_TIMEOUT};
pub use memory::MemoryRemote;
pub use provider::{RemoteResponse, RemoteSource};
