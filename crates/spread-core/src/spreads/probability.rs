//! Expected Result of a spread under a driftless lognormal terminal price.
//!
//! With sigma_p the volatility over the holding period and Z standard normal,
//! the terminal price is S_T = S * exp(sigma_p * Z - sigma_p^2 / 2). The
//! z-axis is cut at the low strike, the break-even and the high strike, with
//! +/-4 standing in for the infinite tails. On each interior segment [a, b]
//!
//!   E[S_T ; a <= Z <= b] = S * exp(sigma_p^2 / 2) * (Phi(b - sigma_p) - Phi(a - sigma_p))
//!
//! and the flat segments only need their probability.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SpreadError;
use crate::math::{ensure_finite, norm_cdf, round_dp, to_f64, DAYS_PER_YEAR};
use crate::spreads::pricer::{MarketParams, SpreadCandidate};
use crate::spreads::strategy::SpreadStrategy;
use crate::types::Rate;
use crate::SpreadResult;

/// z-score used in place of -infinity / +infinity.
pub const TAIL_Z: f64 = 4.0;

/// Decimal places for ER and the gain/loss probabilities.
pub const PROBABILITY_DP: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityBreakdown {
    pub period_volatility: f64,
    /// z0..z4: -4, low strike, break-even, high strike, +4.
    pub segment_boundaries: [f64; 5],
    pub segment_probabilities: [f64; 4],
    pub segment_expected_results: [f64; 4],
    pub expected_result: Decimal,
    pub probability_of_gain: Rate,
    pub probability_of_loss: Rate,
}

impl ProbabilityBreakdown {
    /// Sum of the four segment probabilities; 1 up to tail truncation.
    pub fn total_probability(&self) -> f64 {
        self.segment_probabilities.iter().sum()
    }
}

/// Volatility over the life of the trade: IV * sqrt(DTE / 365).
pub fn period_volatility(days_to_expiry: Decimal, implied_vol_pct: Decimal) -> SpreadResult<f64> {
    let days = to_f64(days_to_expiry, "days_to_expiry")?;
    let iv = to_f64(implied_vol_pct, "implied_vol_pct")?;
    let sigma_p = iv / 100.0 * (days / DAYS_PER_YEAR).sqrt();
    if !sigma_p.is_finite() || sigma_p <= 0.0 {
        return Err(SpreadError::InvalidInput {
            field: "period_volatility".into(),
            reason: format!(
                "must be positive (days_to_expiry={days_to_expiry}, implied_vol_pct={implied_vol_pct})"
            ),
        });
    }
    Ok(sigma_p)
}

fn z_score(level: f64, spot: f64, sigma_p: f64, field: &str) -> SpreadResult<f64> {
    if level <= 0.0 {
        return Err(SpreadError::InvalidInput {
            field: field.into(),
            reason: "must be positive to place on the lognormal axis".into(),
        });
    }
    ensure_finite((level / spot).ln() / sigma_p, field)
}

/// Segment the terminal distribution of `candidate` and aggregate its
/// Expected Result and gain/loss probabilities.
pub fn compute_probability(
    strategy: SpreadStrategy,
    candidate: &SpreadCandidate,
    market: &MarketParams,
) -> SpreadResult<ProbabilityBreakdown> {
    let sigma_p = period_volatility(market.days_to_expiry, market.implied_vol_pct)?;

    let spot = to_f64(market.spot, "spot")?;
    if spot <= 0.0 {
        return Err(SpreadError::InvalidInput {
            field: "spot".into(),
            reason: "must be positive".into(),
        });
    }

    let z = [
        -TAIL_Z,
        z_score(to_f64(candidate.low_strike, "low_strike")?, spot, sigma_p, "low_strike")?,
        z_score(
            to_f64(candidate.break_even_point, "break_even_point")?,
            spot,
            sigma_p,
            "break_even_point",
        )?,
        z_score(to_f64(candidate.high_strike, "high_strike")?, spot, sigma_p, "high_strike")?,
        TAIL_Z,
    ];

    let probabilities: [f64; 4] = std::array::from_fn(|i| norm_cdf(z[i + 1]) - norm_cdf(z[i]));

    let scale = spot * (sigma_p * sigma_p / 2.0).exp();
    let partial = [
        scale * (norm_cdf(z[2] - sigma_p) - norm_cdf(z[1] - sigma_p)),
        scale * (norm_cdf(z[3] - sigma_p) - norm_cdf(z[2] - sigma_p)),
    ];

    let terms = strategy.expected_result_terms(candidate, &probabilities, &partial)?;

    let expected_result = round_dp(terms.iter().sum::<f64>(), PROBABILITY_DP, "expected_result")?;

    let gain: f64 = terms
        .iter()
        .zip(probabilities.iter())
        .filter(|(er, _)| **er > 0.0)
        .map(|(_, pr)| *pr)
        .sum();
    let probability_of_gain = round_dp(gain, PROBABILITY_DP, "probability_of_gain")?;
    let probability_of_loss = (Decimal::ONE - probability_of_gain).round_dp(PROBABILITY_DP);

    Ok(ProbabilityBreakdown {
        period_volatility: sigma_p,
        segment_boundaries: z,
        segment_probabilities: probabilities,
        segment_expected_results: terms,
        expected_result,
        probability_of_gain,
        probability_of_loss,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
