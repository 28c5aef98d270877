//! Freshness of a cached page relative to its remote source.

use std::fmt;

use dropweb_common::{Error, Result};
use dropweb_storage::RemoteResponse;

/// Whether a cached page can be served as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The remote validator matches the stored one.
    Fresh,
    /// The page must be fetched again.
    Stale(StaleReason),
}

/// Why a page needs a full fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// No successful fetch yet.
    NeverFetched,
    /// The document now resolves to a different address.
    UrlChanged,
    /// The probe returned a different validator.
    ValidatorChanged,
    /// The probe returned no validator.
    ValidatorMissing,
    /// The source does not answer metadata-only requests.
    ProbeUnsupported,
    /// Probing is switched off in configuration.
    ProbingDisabled,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            StaleReason::NeverFetched => "never fetched",
            StaleReason::UrlChanged => "url changed",
            StaleReason::ValidatorChanged => "validator changed",
            StaleReason::ValidatorMissing => "validator missing",
            StaleReason::ProbeUnsupported => "probe unsupported",
            StaleReason::ProbingDisabled => "probing disabled",
        };
        f.write_str(reason)
    }
}

/// Compare a probe response against the stored validator.
///
/// # Errors
/// - `Error::Fetch` if the probe failed with a status other than
///   405/501 (which mean probing is unsupported and fall back to a fetch)
pub fn classify(stored_etag: &str, probe: &RemoteResponse) -> Result<Freshness> {
    if probe.probe_unsupported() {
        return Ok(Freshness::Stale(StaleReason::ProbeUnsupported));
    }

    if !probe.is_success() {
        return Err(Error::Fetch {
            status: probe.status,
        });
    }

    Ok(match probe.validator() {
        None => Freshness::Stale(StaleReason::ValidatorMissing),
        Some(etag) if etag == stored_etag => Freshness::Fresh,
        Some(_) => Freshness::Stale(StaleReason::ValidatorChanged),
    })
}
