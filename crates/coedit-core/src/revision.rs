//! Revision keys identifying one version of an artifact at the document
//! service.
//!
//! The document service uses the key as its cache and co-editing session
//! identity, so every client opening the same version must compute the same
//! key, in any process, on any host. Keys are at most
//! [`MAX_KEY_LENGTH`] characters from `[0-9A-Za-z_=-]`.

use std::fmt;

use serde::{Deserialize, Serialize};
use twox_hash::xxh3::hash64;

use crate::{Error, Result};

/// Maximum length of a revision key accepted by the document service.
pub const MAX_KEY_LENGTH: usize = 20;

/// Bounded, URL-safe identifier of an artifact version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionKey(String);

impl RevisionKey {
    /// Derives the key of a fingerprint, see [`derive_key`].
    pub fn derive(fingerprint: &str) -> Result<Self> {
        derive_key(fingerprint)
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key and returns the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RevisionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RevisionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derives the revision key of a fingerprint.
///
/// Fingerprints of at most [`MAX_KEY_LENGTH`] characters are kept, with every
/// character outside `[0-9A-Za-z_=-]` replaced by `_`. Longer fingerprints are
/// replaced by the decimal form of their unseeded xxh3-64 hash, which is
/// stable across processes and never exceeds 20 digits.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidArgument`](crate::ErrorKind::InvalidArgument)
/// for an empty fingerprint.
pub fn derive_key(fingerprint: &str) -> Result<RevisionKey> {
    if fingerprint.is_empty() {
        return Err(Error::invalid_argument()
            .with_message("fingerprint must not be empty")
            .with_context("derive_key"));
    }

    let key: String = if fingerprint.chars().count() <= MAX_KEY_LENGTH {
        fingerprint.chars().map(sanitize).collect()
    } else {
        hash64(fingerprint.as_bytes()).to_string()
    };

    Ok(RevisionKey(key.chars().take(MAX_KEY_LENGTH).collect()))
}

fn sanitize(c: char) -> char {
    if c.is_ascii_alphanumeric() || matches!(c, '_' | '=' | '-') {
        c
    } else {
        '_'
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_short_fingerprint_is_kept() {
        let key = derive_key("42_3_1234567890").unwrap();
        assert_eq!(key.as_str(), "42_3_1234567890");
    }

    #[test]
    fn test_short_fingerprint_is_sanitized() {
        let key = derive_key("ab c/d").unwrap();
        assert_eq!(key.as_str(), "ab_c_d");

        let key = derive_key("v1.0+=ü").unwrap();
        assert_eq!(key.as_str(), "v1_0_=_");
    }

    #[test]
    fn test_boundary_length_keeps_original_path() {
        let twenty = "abcdefghij0123456789";
        assert_eq!(derive_key(twenty).unwrap().as_str(), twenty);

        let twenty_one = "abcdefghij0123456789x";
        let key = derive_key(twenty_one).unwrap();
        assert!(key.as_str().chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_long_fingerprint_is_numeric_and_bounded() {
        let fingerprint = "1234567890_17_a-very-long-content-hash/with spaces";
        let key = derive_key(fingerprint).unwrap();

        assert!(key.as_str().len() <= MAX_KEY_LENGTH);
        assert!(key.as_str().chars().all(|c| c.is_ascii_digit()));
        assert_eq!(key.as_str(), hash64(fingerprint.as_bytes()).to_string());
    }

    #[test]
    fn test_long_fingerprint_key_is_stable() {
        // Keys are shared with the document service cache across releases.
        let fingerprint = "1234567890_17_a-very-long-content-hash/with spaces";
        let key = derive_key(fingerprint).unwrap();
        assert_eq!(key.as_str(), "8112483998287552204");

        let key = derive_key("abcdefghij0123456789x").unwrap();
        assert_eq!(key.as_str(), "17896179039862796086");
    }

    #[test]
    fn test_determinism() {
        for fingerprint in ["a", "ab c/d", "9_1_4294967295", &"x".repeat(500)] {
            let first = derive_key(fingerprint).unwrap();
            let second = derive_key(fingerprint).unwrap();
            assert_eq!(first, second);
            assert!(first.as_str().len() <= MAX_KEY_LENGTH);
        }
    }

    #[test]
    fn test_long_inputs_do_not_collide() {
        let keys: HashSet<RevisionKey> = (0..1000)
            .map(|i| format!("artifact-{i:05}_version-{}_hash-{}", i % 7, i * 31))
            .map(|fingerprint| derive_key(&fingerprint).unwrap())
            .collect();

        assert_eq!(keys.len(), 1000);
    }

    #[test]
    fn test_empty_fingerprint_is_rejected() {
        let error = derive_key("").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_key_is_url_safe() {
        let key = derive_key("a?b&c#d").unwrap();
        assert!(
            key.as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '=' | '-'))
        );
    }
}
