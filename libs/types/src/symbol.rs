//! Trading-pair symbol identifier
//!
//! The venue addresses streams by lowercase symbol (`btcusdt@depth@100ms`)
//! but tags REST resources and event payloads with the uppercase form. The
//! mirror keys everything by the lowercase identifier; this newtype enforces
//! that at construction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowercase trading-pair identifier (e.g. `btcusdt`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a symbol, normalizing to lowercase.
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().trim().to_lowercase())
    }

    /// The lowercase identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The uppercase form used by the venue's REST API and event payloads.
    pub fn to_uppercase(&self) -> String {
        self.0.to_uppercase()
    }

    /// Whether the identifier is empty after normalization.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_normalizes_case() {
        let sym = Symbol::new("BTCUSDT");
        assert_eq!(sym.as_str(), "btcusdt");
        assert_eq!(sym.to_uppercase(), "BTCUSDT");
    }

    #[test]
    fn test_symbol_trims_whitespace() {
        let sym = Symbol::new(" ethusdt ");
        assert_eq!(sym.as_str(), "ethusdt");
    }

    #[test]
    fn test_symbol_serde_transparent() {
        let sym = Symbol::new("btcusdt");
        let json = serde_json::to_string(&sym).unwrap();
        assert_eq!(json, "\"btcusdt\"");
    }
}
