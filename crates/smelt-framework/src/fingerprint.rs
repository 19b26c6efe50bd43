//! Change-detection fingerprint.
//!
//! The digest covers everything that drives plugin behavior: id, class,
//! requested plugins, configuration and the expanded plugin list. The
//! identity, any previous hash and the cache mapping never participate.
//!
//! The covered fields are serialized with `serde_json` straight into a blake3
//! hasher. Object keys come out sorted since `serde_json::Map` is a `BTreeMap`
//! unless `preserve_order` is enabled, so the digest does not depend on
//! insertion order.

use blake3::Hasher;
use chrono::{DateTime, Utc};
use serde::Serialize;
use smelt_core::{Config, ResolvedService};

/// Controls which optional fields participate in the fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerprintOptions {
    /// Include the resolution timestamp. Off by default, which keeps a
    /// re-resolution of an unchanged spec hashing identically.
    pub include_timestamp: bool,
}

/// The hashed subset of a [`ResolvedService`].
#[derive(Serialize)]
struct Fingerprinted<'a> {
    id: &'a str,
    class: &'a str,
    plugins: &'a [String],
    expanded_plugins: &'a [String],
    config: &'a Config,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<&'a DateTime<Utc>>,
}

/// Computes the hex-encoded blake3 fingerprint of `service`.
///
/// # Errors
///
/// Fails only if a configuration value cannot be serialized.
pub fn fingerprint(
    service: &ResolvedService,
    options: FingerprintOptions,
) -> serde_json::Result<String> {
    let view = Fingerprinted {
        id: &service.id,
        class: &service.class,
        plugins: &service.plugins,
        expanded_plugins: &service.expanded_plugins,
        config: &service.config,
        timestamp: options.include_timestamp.then_some(&service.timestamp),
    };

    let mut hasher = Hasher::new();
    serde_json::to_writer(&mut hasher, &view)?;
    Ok(hasher.finalize().to_hex().to_string())
}
