//! Deterministic pseudonymous identity derived from a phone number

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity bound to a verified phone number: `uid_` + 24 hex characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DerivedUid(String);

impl DerivedUid {
    /// Prefix of every derived uid
    pub const PREFIX: &'static str = "uid_";

    /// Hex characters of the digest kept after the prefix (96 bits)
    pub const HEX_LEN: usize = 24;

    /// Build a uid from a hex digest, truncating it to `HEX_LEN`
    pub(crate) fn from_digest_hex(digest_hex: &str) -> Self {
        let len = digest_hex.len().min(Self::HEX_LEN);
        DerivedUid(format!("{}{}", Self::PREFIX, &digest_hex[..len]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DerivedUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
