use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SpreadError;
use crate::math::to_f64;
use crate::pricing::black_scholes::OptionType;
use crate::spreads::pricer::SpreadCandidate;
use crate::types::Money;
use crate::SpreadResult;

/// Shares per option contract.
pub const CONTRACT_MULTIPLIER: Decimal = dec!(100);

/// Two-leg vertical spreads the engine can evaluate.
///
/// Both are built from a long leg at the lower strike and a short leg at the
/// higher strike; they differ in option type and therefore in which side of
/// the payoff is flat at which value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadStrategy {
    BullCallSpread,
    BullPutSpread,
}

impl SpreadStrategy {
    pub const ALL: [SpreadStrategy; 2] = [SpreadStrategy::BullCallSpread, SpreadStrategy::BullPutSpread];

    pub fn tag(&self) -> &'static str {
        match self {
            SpreadStrategy::BullCallSpread => "bull_call_spread",
            SpreadStrategy::BullPutSpread => "bull_put_spread",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SpreadStrategy::BullCallSpread => "Bull Call Spread",
            SpreadStrategy::BullPutSpread => "Bull Put Spread",
        }
    }

    /// Title handed to the chart collaborator alongside the payoff curve.
    pub fn chart_title(&self) -> String {
        format!("Profit / Loss Profile\nStrategy: {}", self.tag())
    }

    /// Option type of both legs.
    pub fn option_type(&self) -> OptionType {
        match self {
            SpreadStrategy::BullCallSpread => OptionType::Call,
            SpreadStrategy::BullPutSpread => OptionType::Put,
        }
    }

    /// Terminal price at which the position neither gains nor loses.
    pub fn break_even(
        &self,
        low_strike: Money,
        high_strike: Money,
        low_leg_price: Money,
        high_leg_price: Money,
    ) -> Money {
        let anchor = match self {
            SpreadStrategy::BullCallSpread => low_strike,
            SpreadStrategy::BullPutSpread => high_strike,
        };
        (anchor - high_leg_price + low_leg_price).round_dp(2)
    }

    /// Per-share result on the flat region below the low strike.
    pub fn flat_below(&self, c: &SpreadCandidate) -> Money {
        match self {
            SpreadStrategy::BullCallSpread => c.high_leg_price - c.low_leg_price,
            SpreadStrategy::BullPutSpread => c.low_strike - c.break_even_point,
        }
    }

    /// Per-share result on the flat region at or above the high strike.
    pub fn flat_above(&self, c: &SpreadCandidate) -> Money {
        match self {
            SpreadStrategy::BullCallSpread => c.high_strike - c.break_even_point,
            SpreadStrategy::BullPutSpread => c.high_leg_price - c.low_leg_price,
        }
    }

    /// Result at expiration for one contract when the underlying ends at `price`.
    pub fn payoff_at(&self, c: &SpreadCandidate, price: Money) -> Money {
        let per_share = if price <= c.low_strike {
            self.flat_below(c)
        } else if price < c.high_strike {
            price - c.break_even_point
        } else {
            self.flat_above(c)
        };
        per_share * CONTRACT_MULTIPLIER
    }

    /// Per-segment contributions to the Expected Result.
    ///
    /// `probabilities` are the four segment probabilities and `partial` the
    /// probability-weighted mean of S_T over the two interior segments
    /// (already multiplied through by S*exp(sigma_p^2/2)).
    pub fn expected_result_terms(
        &self,
        c: &SpreadCandidate,
        probabilities: &[f64; 4],
        partial: &[f64; 2],
    ) -> SpreadResult<[f64; 4]> {
        let bep = to_f64(c.break_even_point, "break_even_point")?;
        let below = to_f64(self.flat_below(c), "flat_below")?;
        let above = to_f64(self.flat_above(c), "flat_above")?;
        Ok([
            below * probabilities[0],
            partial[0] - bep * probabilities[1],
            partial[1] - bep * probabilities[2],
            above * probabilities[3],
        ])
    }

    /// (max gain, max loss) per share. Losses carry a negative sign.
    pub fn max_gain_loss(&self, c: &SpreadCandidate) -> (Money, Money) {
        match self {
            SpreadStrategy::BullCallSpread => (
                (c.high_strike - c.break_even_point).round_dp(2),
                (c.high_leg_price - c.low_leg_price).round_dp(2),
            ),
            SpreadStrategy::BullPutSpread => (
                (c.high_leg_price - c.low_leg_price).round_dp(2),
                (c.low_strike - c.break_even_point).round_dp(2),
            ),
        }
    }
}

impl fmt::Display for SpreadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for SpreadStrategy {
    type Err = SpreadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpreadStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.tag() == s)
            .ok_or_else(|| SpreadError::InvalidStrategy(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn call_candidate() -> SpreadCandidate {
        SpreadCandidate {
            low_strike: dec!(55),
            high_strike: dec!(65),
            low_leg_price: dec!(5.94),
            high_leg_price: dec!(1.06),
            break_even_point: dec!(59.88),
        }
    }

    fn put_candidate() -> SpreadCandidate {
        SpreadCandidate {
            low_strike: dec!(55),
            high_strike: dec!(65),
            low_leg_price: dec!(0.82),
            high_leg_price: dec!(5.92),
            break_even_point: dec!(59.9),
        }
    }

    #[test]
    fn test_parse_known_tags() {
        assert_eq!(
            "bull_call_spread".parse::<SpreadStrategy>().unwrap(),
            SpreadStrategy::BullCallSpread
        );
        assert_eq!(
            "bull_put_spread".parse::<SpreadStrategy>().unwrap(),
            SpreadStrategy::BullPutSpread
        );
    }

    #[test]
    fn test_parse_unknown_tag() {
        match "short_straddle".parse::<SpreadStrategy>() {
            Err(SpreadError::InvalidStrategy(tag)) => assert_eq!(tag, "short_straddle"),
            other => panic!("Expected InvalidStrategy, got {other:?}"),
        }
        assert!("Bull_Call_Spread".parse::<SpreadStrategy>().is_err());
    }

    #[test]
    fn test_tag_roundtrips_through_serde() {
        let json = serde_json::to_string(&SpreadStrategy::BullPutSpread).unwrap();
        assert_eq!(json, "\"bull_put_spread\"");
        assert_eq!(SpreadStrategy::BullPutSpread.to_string(), "bull_put_spread");
    }

    #[test]
    fn test_break_even_bull_call() {
        let bep = SpreadStrategy::BullCallSpread.break_even(dec!(55), dec!(65), dec!(5.94), dec!(1.06));
        assert_eq!(bep, dec!(59.88));
    }

    #[test]
    fn test_break_even_bull_put() {
        let bep = SpreadStrategy::BullPutSpread.break_even(dec!(55), dec!(65), dec!(0.82), dec!(5.92));
        assert_eq!(bep, dec!(59.9));
    }

    #[test]
    fn test_payoff_regions_bull_call() {
        let s = SpreadStrategy::BullCallSpread;
        let c = call_candidate();
        // Below/at low strike: net debit lost
        assert_eq!(s.payoff_at(&c, dec!(40)), dec!(-488));
        assert_eq!(s.payoff_at(&c, dec!(55)), dec!(-488));
        // Linear region
        assert_eq!(s.payoff_at(&c, dec!(59.88)), dec!(0));
        assert_eq!(s.payoff_at(&c, dec!(62)), dec!(212));
        // At/above high strike: capped
        assert_eq!(s.payoff_at(&c, dec!(65)), dec!(512));
        assert_eq!(s.payoff_at(&c, dec!(80)), dec!(512));
    }

    #[test]
    fn test_payoff_regions_bull_put() {
        let s = SpreadStrategy::BullPutSpread;
        let c = put_candidate();
        assert_eq!(s.payoff_at(&c, dec!(50)), dec!(-490));
        assert_eq!(s.payoff_at(&c, dec!(59.9)), dec!(0));
        assert_eq!(s.payoff_at(&c, dec!(65)), dec!(510));
    }

    #[test]
    fn test_payoff_continuous_at_strikes() {
        // Flat values equal the linear segment evaluated at the strikes
        for (s, c) in [
            (SpreadStrategy::BullCallSpread, call_candidate()),
            (SpreadStrategy::BullPutSpread, put_candidate()),
        ] {
            assert_eq!(s.flat_above(&c), c.high_strike - c.break_even_point);
            assert_eq!(s.flat_below(&c), c.low_strike - c.break_even_point);
        }
    }

    #[test]
    fn test_max_gain_loss() {
        assert_eq!(
            SpreadStrategy::BullCallSpread.max_gain_loss(&call_candidate()),
            (dec!(5.12), dec!(-4.88))
        );
        assert_eq!(
            SpreadStrategy::BullPutSpread.max_gain_loss(&put_candidate()),
            (dec!(5.1), dec!(-4.9))
        );
    }

    #[test]
    fn test_expected_result_terms_flat_segments() {
        let c = call_candidate();
        let probs = [0.25, 0.25, 0.25, 0.25];
        let terms = SpreadStrategy::BullCallSpread
            .expected_result_terms(&c, &probs, &[0.0, 0.0])
            .unwrap();
        assert!((terms[0] - (1.06 - 5.94) * 0.25).abs() < 1e-12);
        assert!((terms[3] - (65.0 - 59.88) * 0.25).abs() < 1e-12);
        assert!((terms[1] + 59.88 * 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_chart_title() {
        assert_eq!(
            SpreadStrategy::BullPutSpread.chart_title(),
            "Profit / Loss Profile\nStrategy: bull_put_spread"
        );
    }
}
