use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Opaque identifier for games and players: coarse timestamp in hex followed
/// by a bit-interleaved (machine id, counter) tail. Minted by
/// `rush_core`'s `IdentFactory`; treated as an opaque string everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Ident(String);

impl Ident {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shape check: at least four lowercase hex digits.
    pub fn is_valid(raw: &str) -> bool {
        raw.len() >= 4 && raw.chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Ident {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}
