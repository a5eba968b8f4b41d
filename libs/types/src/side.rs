//! Side selectors for book queries and taker simulations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Taker side for a simulated market order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy order (consumes asks)
    Buy,
    /// Sell order (consumes bids)
    Sell,
}

impl Side {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Stable lowercase name (used in logs and response payloads).
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(format!("invalid side: {other}")),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which side(s) of the book an accumulation query walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideFilter {
    Bids,
    Asks,
    Both,
}

impl SideFilter {
    pub fn includes_bids(&self) -> bool {
        matches!(self, SideFilter::Bids | SideFilter::Both)
    }

    pub fn includes_asks(&self) -> bool {
        matches!(self, SideFilter::Asks | SideFilter::Both)
    }
}

impl FromStr for SideFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bids" => Ok(SideFilter::Bids),
            "asks" => Ok(SideFilter::Asks),
            "both" => Ok(SideFilter::Both),
            other => Err(format!("invalid side filter: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_side_from_str() {
        assert_eq!("buy".parse::<Side>().unwrap(), Side::Buy);
        assert_eq!("SELL".parse::<Side>().unwrap(), Side::Sell);
        assert!("hold".parse::<Side>().is_err());
    }

    #[test]
    fn test_side_filter_inclusion() {
        assert!(SideFilter::Both.includes_bids());
        assert!(SideFilter::Both.includes_asks());
        assert!(SideFilter::Bids.includes_bids());
        assert!(!SideFilter::Bids.includes_asks());
        assert!(!SideFilter::Asks.includes_bids());
    }

    #[test]
    fn test_side_filter_from_str() {
        assert_eq!("both".parse::<SideFilter>().unwrap(), SideFilter::Both);
        assert!("all".parse::<SideFilter>().is_err());
    }
}
