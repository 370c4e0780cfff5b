use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::black_scholes::{option_premium, PricingInputs};
use crate::spreads::strategy::SpreadStrategy;
use crate::types::Money;
use crate::SpreadResult;

/// Market state shared by every candidate of one search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketParams {
    pub spot: Money,
    pub days_to_expiry: Decimal,
    pub implied_vol_pct: Decimal,
    pub risk_free_rate_pct: Decimal,
}

impl MarketParams {
    fn pricing_inputs(&self, strike: Money) -> PricingInputs {
        PricingInputs {
            spot_price: self.spot,
            strike_price: strike,
            days_to_expiry: self.days_to_expiry,
            volatility_pct: self.implied_vol_pct,
            risk_free_rate_pct: self.risk_free_rate_pct,
        }
    }
}

/// A priced strike pair: long leg at `low_strike`, short leg at `high_strike`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadCandidate {
    pub low_strike: Money,
    pub high_strike: Money,
    pub low_leg_price: Money,
    pub high_leg_price: Money,
    pub break_even_point: Money,
}

impl SpreadCandidate {
    /// Whether the break-even falls inside [low_strike, high_strike].
    ///
    /// Outside that interval the four-segment split of the terminal
    /// distribution no longer follows the payoff breakpoints.
    pub fn break_even_within_strikes(&self) -> bool {
        self.low_strike <= self.break_even_point && self.break_even_point <= self.high_strike
    }
}

/// Price both legs of a spread and derive its break-even point.
pub fn price_spread(
    strategy: SpreadStrategy,
    market: &MarketParams,
    low_strike: Money,
    high_strike: Money,
) -> SpreadResult<SpreadCandidate> {
    let option_type = strategy.option_type();
    let low_leg_price = option_premium(&market.pricing_inputs(low_strike), option_type)?;
    let high_leg_price = option_premium(&market.pricing_inputs(high_strike), option_type)?;
    let break_even_point =
        strategy.break_even(low_strike, high_strike, low_leg_price, high_leg_price);

    Ok(SpreadCandidate {
        low_strike,
        high_strike,
        low_leg_price,
        high_leg_price,
        break_even_point,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpreadError;
    use rust_decimal_macros::dec;

    fn market() -> MarketParams {
        MarketParams {
            spot: dec!(60),
            days_to_expiry: dec!(30),
            implied_vol_pct: dec!(40),
            risk_free_rate_pct: dec!(2.5136),
        }
    }

    #[test]
    fn test_bull_call_candidate() {
        let c = price_spread(SpreadStrategy::BullCallSpread, &market(), dec!(55), dec!(65)).unwrap();
        assert_eq!(c.low_leg_price, dec!(5.94));
        assert_eq!(c.high_leg_price, dec!(1.06));
        assert_eq!(c.break_even_point, dec!(59.88));
        assert!(c.break_even_within_strikes());
    }

    #[test]
    fn test_bull_put_candidate() {
        let c = price_spread(SpreadStrategy::BullPutSpread, &market(), dec!(55), dec!(65)).unwrap();
        assert_eq!(c.low_leg_price, dec!(0.82));
        assert_eq!(c.high_leg_price, dec!(5.92));
        assert_eq!(c.break_even_point, dec!(59.9));
        assert!(c.break_even_within_strikes());
    }

    #[test]
    fn test_long_leg_costs_more_for_calls() {
        let c = price_spread(SpreadStrategy::BullCallSpread, &market(), dec!(58), dec!(61)).unwrap();
        assert!(c.low_leg_price > c.high_leg_price);
        let p = price_spread(SpreadStrategy::BullPutSpread, &market(), dec!(58), dec!(61)).unwrap();
        assert!(p.low_leg_price < p.high_leg_price);
    }

    #[test]
    fn test_pricing_errors_propagate() {
        let bad = MarketParams {
            days_to_expiry: dec!(0),
            ..market()
        };
        match price_spread(SpreadStrategy::BullCallSpread, &bad, dec!(55), dec!(65)) {
            Err(SpreadError::InvalidInput { field, .. }) => assert_eq!(field, "days_to_expiry"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }
}
