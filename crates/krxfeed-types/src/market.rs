//! Exchange boards.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Board of the Korea Exchange a security is listed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    /// Main board (유가증권시장), wire code `STK`.
    Kospi,
    /// Growth board, wire code `KSQ`.
    Kosdaq,
    /// Start-up board, wire code `KNX`.
    Konex,
}

impl Market {
    /// Returns the display name (`KOSPI`, `KOSDAQ`, `KONEX`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Kospi => "KOSPI",
            Self::Kosdaq => "KOSDAQ",
            Self::Konex => "KONEX",
        }
    }

    /// Returns the code the exchange uses in requests and responses.
    #[must_use]
    pub const fn wire_code(&self) -> &'static str {
        match self {
            Self::Kospi => "STK",
            Self::Kosdaq => "KSQ",
            Self::Konex => "KNX",
        }
    }

    /// Parses an exchange wire code, returning `None` for boards outside the equity markets.
    #[must_use]
    pub fn from_wire_code(code: &str) -> Option<Self> {
        match code.trim() {
            "STK" => Some(Self::Kospi),
            "KSQ" => Some(Self::Kosdaq),
            "KNX" => Some(Self::Konex),
            _ => None,
        }
    }

    /// Returns all markets.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Kospi, Self::Kosdaq, Self::Konex]
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Market {
    type Err = MarketParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "KOSPI" | "STK" => Ok(Self::Kospi),
            "KOSDAQ" | "KSQ" => Ok(Self::Kosdaq),
            "KONEX" | "KNX" => Ok(Self::Konex),
            _ => Err(MarketParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid market string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketParseError(String);

impl std::fmt::Display for MarketParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid market '{}', expected one of: kospi, kosdaq, konex",
            self.0
        )
    }
}

impl std::error::Error for MarketParseError {}

impl From<MarketParseError> for crate::KrxError {
    fn from(err: MarketParseError) -> Self {
        Self::UnknownMarket(err.0)
    }
}
