//! Instrument identity.

use std::fmt;

/// Venue an order or quote is associated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Venue {
    Coinbase,
    Kraken,
    Binance,
    Nasdaq,
    Nyse,
    Simulated,
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// `{ticker, venue}` pair identifying a tradable instrument.
///
/// Immutable once constructed. The ticker is normalized to upper-case at
/// construction; equality and hashing cover both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Symbol {
    ticker: String,
    venue: Venue,
}

impl Symbol {
    pub fn new(ticker: impl AsRef<str>, venue: Venue) -> Self {
        Self {
            ticker: ticker.as_ref().to_ascii_uppercase(),
            venue,
        }
    }

    #[inline]
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    #[inline]
    pub fn venue(&self) -> Venue {
        self.venue
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.ticker, self.venue)
    }
}
