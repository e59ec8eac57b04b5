//! In-memory representation of secrets and shares.
//!
//! Both are opaque text as far as this tool is concerned: ssss decides
//! their format (`N-hexdigits` for shares, ASCII or hex for the secret).
//! Values live in zeroizing buffers and are never printed through `Debug`.

use std::fmt;
use zeroize::{Zeroize, Zeroizing};

/// The plaintext secret, held only as long as needed.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Zeroizing<String>> for Secret {
    fn from(mut value: Zeroizing<String>) -> Self {
        Self(std::mem::take(&mut *value))
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(<{} bytes redacted>)", self.0.len())
    }
}

/// One opaque share token.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Share(String);

impl Share {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<Zeroizing<String>> for Share {
    fn from(mut value: Zeroizing<String>) -> Self {
        Self(std::mem::take(&mut *value))
    }
}

impl fmt::Debug for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Share(<redacted>)")
    }
}

/// A share produced by a split, tagged with its 1-based position in the
/// order ssss emitted it.
#[derive(Debug, Clone)]
pub struct IndexedShare {
    pub index: u32,
    pub share: Share,
}

/// Assign 1-based ordinals in emission order.
pub fn index_shares(shares: Vec<Share>) -> Vec<IndexedShare> {
    shares
        .into_iter()
        .zip(1u32..)
        .map(|(share, index)| IndexedShare { index, share })
        .collect()
}
