//! URL handling module for Burrow
//!
//! This module provides the [`Address`] crawl key together with the
//! eligibility filter and normalization rules that produce it.

mod filter;
mod normalize;

use crate::UrlError;
use std::fmt;

pub use filter::{has_image_extension, is_eligible, IMAGE_EXTENSIONS};
pub use normalize::{normalize_url, NormalizePolicy};

/// A normalized absolute `http`/`https` URL used as the unique crawl key
///
/// An `Address` can only be built through [`Address::new`], so every value in
/// the frontier, the visited registry and the store has already passed the
/// scheme and image-extension checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(String);

impl Address {
    /// Normalizes and validates a raw URL string
    ///
    /// # Returns
    ///
    /// * `Ok(Address)` - The string is an eligible crawl target
    /// * `Err(UrlError)` - Malformed, wrong scheme, or an excluded file type
    pub fn new(raw: &str, policy: NormalizePolicy) -> Result<Self, UrlError> {
        let url = normalize_url(raw, policy)?;
        let serialized = String::from(url);

        if has_image_extension(&serialized) {
            return Err(UrlError::ExcludedExtension(serialized));
        }

        Ok(Self(serialized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase host portion, used to label seeds in logs
    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.0)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}
