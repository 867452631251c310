//! Underlying token symbols and per-token amount tables

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the three tokens backing UNITY
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenSymbol {
    #[serde(rename = "VET")]
    Vet,
    #[serde(rename = "VTHO")]
    Vtho,
    #[serde(rename = "B3TR")]
    B3tr,
}

impl TokenSymbol {
    /// Fixed iteration order used everywhere a table is walked
    pub const ALL: [TokenSymbol; 3] = [TokenSymbol::Vet, TokenSymbol::Vtho, TokenSymbol::B3tr];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSymbol::Vet => "VET",
            TokenSymbol::Vtho => "VTHO",
            TokenSymbol::B3tr => "B3TR",
        }
    }
}

impl fmt::Display for TokenSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown token symbol: {0}")]
pub struct UnknownToken(pub String);

impl FromStr for TokenSymbol {
    type Err = UnknownToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VET" => Ok(TokenSymbol::Vet),
            "VTHO" => Ok(TokenSymbol::Vtho),
            "B3TR" => Ok(TokenSymbol::B3tr),
            _ => Err(UnknownToken(s.to_string())),
        }
    }
}

/// A decimal quantity for each of the three tokens.
///
/// Used for prices, weights, circulating supply and reserve holdings; the
/// aliases below only document intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenAmounts {
    #[serde(rename = "VET")]
    pub vet: Decimal,
    #[serde(rename = "VTHO")]
    pub vtho: Decimal,
    #[serde(rename = "B3TR")]
    pub b3tr: Decimal,
}

pub type TokenPrices = TokenAmounts;
pub type TokenWeights = TokenAmounts;
pub type CirculatingSupply = TokenAmounts;
pub type ReserveAmounts = TokenAmounts;

impl TokenAmounts {
    pub const ZERO: TokenAmounts = TokenAmounts {
        vet: Decimal::ZERO,
        vtho: Decimal::ZERO,
        b3tr: Decimal::ZERO,
    };

    pub fn new(vet: Decimal, vtho: Decimal, b3tr: Decimal) -> Self {
        Self { vet, vtho, b3tr }
    }

    pub fn get(&self, token: TokenSymbol) -> Decimal {
        match token {
            TokenSymbol::Vet => self.vet,
            TokenSymbol::Vtho => self.vtho,
            TokenSymbol::B3tr => self.b3tr,
        }
    }

    pub fn set(&mut self, token: TokenSymbol, value: Decimal) {
        match token {
            TokenSymbol::Vet => self.vet = value,
            TokenSymbol::Vtho => self.vtho = value,
            TokenSymbol::B3tr => self.b3tr = value,
        }
    }

    /// Build a table by evaluating `f` once per token
    pub fn from_fn(mut f: impl FnMut(TokenSymbol) -> Decimal) -> Self {
        Self {
            vet: f(TokenSymbol::Vet),
            vtho: f(TokenSymbol::Vtho),
            b3tr: f(TokenSymbol::B3tr),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (TokenSymbol, Decimal)> + '_ {
        TokenSymbol::ALL.into_iter().map(move |t| (t, self.get(t)))
    }

    pub fn sum(&self) -> Decimal {
        self.vet + self.vtho + self.b3tr
    }

    pub fn is_non_negative(&self) -> bool {
        self.iter().all(|(_, v)| v >= Decimal::ZERO)
    }

    /// Round every entry to the persisted precision
    pub fn rounded(&self) -> Self {
        Self::from_fn(|t| crate::round_persisted(self.get(t)))
    }
}
