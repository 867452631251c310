//! Burn release pricing calculations

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use unity_core::{round_persisted, PriceResult, TokenSymbol};

/// How much of an underlying token a UNITY burn releases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnQuote {
    pub unity_amount: Decimal,
    pub unity_price_usd: Decimal,
    pub unity_value_usd: Decimal,
    pub fee_rate: Decimal,
    pub net_value_usd: Decimal,
    pub token: TokenSymbol,
    pub token_price_usd: Decimal,
    pub token_amount: Decimal,
}

pub struct PriceCalculator;

impl PriceCalculator {
    /// `amount × unityPrice`, less the burn fee, converted at the release
    /// token's price. A zero token price releases nothing. `None` when the
    /// value does not fit a decimal.
    pub fn calculate_burn_release(
        unity_amount: Decimal,
        price: &PriceResult,
        token: TokenSymbol,
        fee_rate: Decimal,
    ) -> Option<BurnQuote> {
        let unity_value_usd = unity_amount.checked_mul(price.unity_price_usd)?;
        let net_value_usd = unity_value_usd.checked_mul(Decimal::ONE - fee_rate)?;
        let token_price_usd = price.token_prices.get(token);
        let token_amount = if token_price_usd > Decimal::ZERO {
            round_persisted(net_value_usd.checked_div(token_price_usd)?)
        } else {
            Decimal::ZERO
        };

        Some(BurnQuote {
            unity_amount,
            unity_price_usd: price.unity_price_usd,
            unity_value_usd,
            fee_rate,
            net_value_usd,
            token,
            token_price_usd,
            token_amount,
        })
    }
}
