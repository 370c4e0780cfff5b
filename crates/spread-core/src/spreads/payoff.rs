use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SpreadError;
use crate::spreads::pricer::SpreadCandidate;
use crate::spreads::strategy::SpreadStrategy;
use crate::types::Money;
use crate::SpreadResult;

/// Payoff at expiration sampled over a stock-price grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffCurve {
    pub stock_prices: Vec<Money>,
    pub payoffs: Vec<Money>,
}

impl PayoffCurve {
    pub fn len(&self) -> usize {
        self.stock_prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stock_prices.is_empty()
    }

    /// (stock price, payoff) pairs in grid order.
    pub fn points(&self) -> impl Iterator<Item = (Money, Money)> + '_ {
        self.stock_prices
            .iter()
            .copied()
            .zip(self.payoffs.iter().copied())
    }
}

/// Stock prices from `low_strike - half_width` (floored at zero) to
/// `high_strike + half_width`, both ends included.
pub fn payoff_grid(
    low_strike: Money,
    high_strike: Money,
    half_width: Decimal,
    step: Decimal,
) -> SpreadResult<Vec<Money>> {
    if step <= Decimal::ZERO {
        return Err(SpreadError::InvalidInput {
            field: "payoff_step".into(),
            reason: "must be positive".into(),
        });
    }
    if half_width < Decimal::ZERO {
        return Err(SpreadError::InvalidInput {
            field: "payoff_half_width".into(),
            reason: "must not be negative".into(),
        });
    }

    let start = (low_strike - half_width).max(Decimal::ZERO);
    let end = high_strike + half_width;

    let mut grid = Vec::new();
    let mut price = start;
    while price <= end {
        grid.push(price.normalize());
        price += step;
    }
    Ok(grid)
}

/// Build the payoff curve of one contract of `candidate`.
pub fn build_payoff_curve(
    strategy: SpreadStrategy,
    candidate: &SpreadCandidate,
    half_width: Decimal,
    step: Decimal,
) -> SpreadResult<PayoffCurve> {
    let stock_prices = payoff_grid(candidate.low_strike, candidate.high_strike, half_width, step)?;
    let payoffs = stock_prices
        .iter()
        .map(|&price| strategy.payoff_at(candidate, price))
        .collect();
    Ok(PayoffCurve {
        stock_prices,
        payoffs,
    })
}
