use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "parallel")]
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::SpreadError;
use crate::spreads::gain_loss::{compute_gain_loss, GainLoss};
use crate::spreads::payoff::{build_payoff_curve, PayoffCurve};
use crate::spreads::pricer::{price_spread, MarketParams, SpreadCandidate};
use crate::spreads::probability::{compute_probability, ProbabilityBreakdown};
use crate::spreads::strategy::SpreadStrategy;
use crate::types::*;
use crate::SpreadResult;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Advisory input ranges. Values outside them are evaluated but flagged.
pub const RECOMMENDED_SPOT: (Decimal, Decimal) = (dec!(10), dec!(200));
pub const RECOMMENDED_DAYS_TO_EXPIRY: (Decimal, Decimal) = (dec!(1), dec!(360));
pub const RECOMMENDED_IMPLIED_VOL_PCT: (Decimal, Decimal) = (dec!(10), dec!(150));
pub const RECOMMENDED_RATE_PCT: (Decimal, Decimal) = (dec!(1), dec!(4));

/// Grid geometry and the liquidity/signal floor applied to candidates.
///
/// Older versions of the tool used 0.05 as the Expected Result floor and
/// 0.08 for leg prices; both are plain knobs here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchPolicy {
    /// Both leg premiums must be strictly above this.
    pub min_leg_price: Money,
    /// Expected Result must be strictly above this.
    pub min_expected_result: Decimal,
    /// Strikes span spot +/- this width (bounds truncated to integers).
    pub strike_half_width: Decimal,
    pub strike_step: Decimal,
    /// Payoff curve spans the strikes +/- this width.
    pub payoff_half_width: Decimal,
    pub payoff_step: Decimal,
    /// Wall-clock budget for evaluating the whole grid.
    pub deadline_ms: Option<u64>,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            min_leg_price: dec!(0.08),
            min_expected_result: dec!(0.08),
            strike_half_width: dec!(5),
            strike_step: dec!(0.5),
            payoff_half_width: dec!(15),
            payoff_step: dec!(0.5),
            deadline_ms: None,
        }
    }
}

impl SearchPolicy {
    pub fn validate(&self) -> SpreadResult<()> {
        let positive = [
            ("strike_half_width", self.strike_half_width),
            ("strike_step", self.strike_step),
            ("payoff_step", self.payoff_step),
        ];
        for (field, value) in positive {
            if value <= Decimal::ZERO {
                return Err(SpreadError::InvalidInput {
                    field: format!("policy.{field}"),
                    reason: "must be positive".into(),
                });
            }
        }
        if self.payoff_half_width < Decimal::ZERO {
            return Err(SpreadError::InvalidInput {
                field: "policy.payoff_half_width".into(),
                reason: "must not be negative".into(),
            });
        }
        Ok(())
    }

    /// Liquidity and Expected Result floor.
    pub fn retains(&self, row: &ResultRow) -> bool {
        row.low_leg_price > self.min_leg_price
            && row.high_leg_price > self.min_leg_price
            && row.expected_result > self.min_expected_result
    }
}

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadSearchInput {
    pub spot: Money,
    pub days_to_expiry: Decimal,
    pub implied_vol_pct: Decimal,
    pub risk_free_rate_pct: Decimal,
    /// "bull_call_spread" or "bull_put_spread"
    pub strategy: String,
    #[serde(default)]
    pub want_chart: bool,
    #[serde(default)]
    pub policy: SearchPolicy,
}

impl SpreadSearchInput {
    pub fn market(&self) -> MarketParams {
        MarketParams {
            spot: self.spot,
            days_to_expiry: self.days_to_expiry,
            implied_vol_pct: self.implied_vol_pct,
            risk_free_rate_pct: self.risk_free_rate_pct,
        }
    }
}

/// One ranked candidate, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub low_strike: Money,
    pub low_leg_price: Money,
    pub high_strike: Money,
    pub high_leg_price: Money,
    pub break_even_point: Money,
    pub probability_of_gain: Rate,
    pub probability_of_loss: Rate,
    pub max_gain: Money,
    pub max_loss: Money,
    pub expected_result: Decimal,
}

impl ResultRow {
    /// Fields in reporting order.
    pub fn to_array(&self) -> [Decimal; 10] {
        [
            self.low_strike,
            self.low_leg_price,
            self.high_strike,
            self.high_leg_price,
            self.break_even_point,
            self.probability_of_gain,
            self.probability_of_loss,
            self.max_gain,
            self.max_loss,
            self.expected_result,
        ]
    }
}

/// Everything computed for one strike pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEvaluation {
    pub candidate: SpreadCandidate,
    pub breakdown: ProbabilityBreakdown,
    pub gain_loss: GainLoss,
    pub row: ResultRow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadSearchOutput {
    pub strategy: SpreadStrategy,
    /// Best to worst by Expected Result.
    pub rows: Vec<ResultRow>,
    pub payoff_curve: Option<PayoffCurve>,
    pub chart_title: Option<String>,
    pub candidates_evaluated: usize,
    pub candidates_retained: usize,
}

impl SpreadSearchOutput {
    pub fn best(&self) -> Option<&ResultRow> {
        self.rows.first()
    }
}

// ---------------------------------------------------------------------------
// Grid construction
// ---------------------------------------------------------------------------

/// Strikes from trunc(spot - w) to trunc(spot + w), inclusive, every `strike_step`.
pub fn strike_grid(spot: Money, policy: &SearchPolicy) -> SpreadResult<Vec<Money>> {
    let floor = policy.strike_half_width + Decimal::ONE;
    if spot <= floor {
        return Err(SpreadError::InvalidInput {
            field: "spot".into(),
            reason: format!("must exceed {floor} so that every strike in the grid is positive"),
        });
    }

    let low = (spot - policy.strike_half_width).trunc();
    let high = (spot + policy.strike_half_width).trunc();

    let mut grid = Vec::new();
    let mut strike = low;
    while strike <= high {
        // Accumulating the step would otherwise leave 56.0, 57.0, ...
        grid.push(strike.normalize());
        strike += policy.strike_step;
    }
    Ok(grid)
}

/// Ordered (low, high) pairs with low < high, low strike in the outer loop.
pub fn strike_pairs(grid: &[Money]) -> Vec<(Money, Money)> {
    grid.iter()
        .flat_map(|&low| {
            grid.iter()
                .filter(move |&&high| low < high)
                .map(move |&high| (low, high))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Price, segment and summarise a single strike pair.
pub fn evaluate_candidate(
    strategy: SpreadStrategy,
    market: &MarketParams,
    low_strike: Money,
    high_strike: Money,
) -> SpreadResult<CandidateEvaluation> {
    let candidate = price_spread(strategy, market, low_strike, high_strike)?;
    let breakdown = compute_probability(strategy, &candidate, market)?;
    let gain_loss = compute_gain_loss(strategy, &candidate);

    let row = ResultRow {
        low_strike: candidate.low_strike,
        low_leg_price: candidate.low_leg_price,
        high_strike: candidate.high_strike,
        high_leg_price: candidate.high_leg_price,
        break_even_point: candidate.break_even_point,
        probability_of_gain: breakdown.probability_of_gain,
        probability_of_loss: breakdown.probability_of_loss,
        max_gain: gain_loss.max_gain,
        max_loss: gain_loss.max_loss,
        expected_result: breakdown.expected_result,
    };

    Ok(CandidateEvaluation {
        candidate,
        breakdown,
        gain_loss,
        row,
    })
}

fn check_deadline(
    start: Instant,
    deadline_ms: Option<u64>,
    evaluated: usize,
    total: usize,
) -> SpreadResult<()> {
    match deadline_ms {
        Some(budget_ms) if start.elapsed() >= Duration::from_millis(budget_ms) => {
            Err(SpreadError::DeadlineExceeded {
                evaluated,
                total,
                budget_ms,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(not(feature = "parallel"))]
fn evaluate_all(
    strategy: SpreadStrategy,
    market: &MarketParams,
    pairs: &[(Money, Money)],
    policy: &SearchPolicy,
    start: Instant,
) -> SpreadResult<Vec<CandidateEvaluation>> {
    let mut evaluations = Vec::with_capacity(pairs.len());
    for (evaluated, &(low, high)) in pairs.iter().enumerate() {
        check_deadline(start, policy.deadline_ms, evaluated, pairs.len())?;
        evaluations.push(evaluate_candidate(strategy, market, low, high)?);
    }
    Ok(evaluations)
}

// Order-preserving: collect() keeps input order, so the stable sort below
// breaks ties exactly as the sequential path does.
#[cfg(feature = "parallel")]
fn evaluate_all(
    strategy: SpreadStrategy,
    market: &MarketParams,
    pairs: &[(Money, Money)],
    policy: &SearchPolicy,
    start: Instant,
) -> SpreadResult<Vec<CandidateEvaluation>> {
    let evaluated = AtomicUsize::new(0);
    pairs
        .par_iter()
        .map(|&(low, high)| {
            check_deadline(
                start,
                policy.deadline_ms,
                evaluated.load(Ordering::Relaxed),
                pairs.len(),
            )?;
            let evaluation = evaluate_candidate(strategy, market, low, high)?;
            evaluated.fetch_add(1, Ordering::Relaxed);
            Ok(evaluation)
        })
        .collect()
}

fn outside_range(value: Decimal, (low, high): (Decimal, Decimal)) -> bool {
    value < low || value > high
}

/// Warnings for inputs outside the recognised ranges.
pub fn recommended_range_warnings(input: &SpreadSearchInput) -> Vec<String> {
    let checks = [
        ("spot", input.spot, RECOMMENDED_SPOT),
        ("days_to_expiry", input.days_to_expiry, RECOMMENDED_DAYS_TO_EXPIRY),
        ("implied_vol_pct", input.implied_vol_pct, RECOMMENDED_IMPLIED_VOL_PCT),
        ("risk_free_rate_pct", input.risk_free_rate_pct, RECOMMENDED_RATE_PCT),
    ];
    checks
        .into_iter()
        .filter(|(_, value, range)| outside_range(*value, *range))
        .map(|(field, value, (low, high))| {
            format!("{field} = {value} is outside the recommended range {low}-{high}")
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Evaluate every strike pair around spot, filter, and rank by Expected Result.
pub fn analyze_spreads(
    input: &SpreadSearchInput,
) -> SpreadResult<ComputationOutput<SpreadSearchOutput>> {
    let start = Instant::now();

    let strategy: SpreadStrategy = input.strategy.parse()?;
    let policy = &input.policy;
    policy.validate()?;

    let market = input.market();
    let mut warnings = recommended_range_warnings(input);

    let grid = strike_grid(market.spot, policy)?;
    let pairs = strike_pairs(&grid);
    let evaluations = evaluate_all(strategy, &market, &pairs, policy, start)?;

    let degenerate = evaluations
        .iter()
        .filter(|e| !e.candidate.break_even_within_strikes())
        .count();
    if degenerate > 0 {
        warnings.push(format!(
            "{degenerate} candidate(s) have a break-even outside [low_strike, high_strike]; \
             their probability segments do not follow the payoff breakpoints"
        ));
    }

    let mut rows: Vec<ResultRow> = evaluations
        .into_iter()
        .map(|e| e.row)
        .filter(|row| policy.retains(row))
        .collect();

    if rows.is_empty() {
        return Err(SpreadError::NoTradeFound {
            strategy: strategy.tag().to_string(),
            candidates: pairs.len(),
        });
    }

    // Stable: equal Expected Results keep grid order
    rows.sort_by(|a, b| b.expected_result.cmp(&a.expected_result));

    // Only the winner's curve is built; the loop above keeps no curves.
    let (payoff_curve, chart_title) = match rows.first() {
        Some(best) if input.want_chart => {
            let candidate = price_spread(strategy, &market, best.low_strike, best.high_strike)?;
            let curve = build_payoff_curve(
                strategy,
                &candidate,
                policy.payoff_half_width,
                policy.payoff_step,
            )?;
            (Some(curve), Some(strategy.chart_title()))
        }
        _ => (None, None),
    };

    let output = SpreadSearchOutput {
        strategy,
        candidates_evaluated: pairs.len(),
        candidates_retained: rows.len(),
        rows,
        payoff_curve,
        chart_title,
    };

    let assumptions = serde_json::json!({
        "strategy": strategy.display_name(),
        "price_model": "Black-Scholes, European exercise, no dividends",
        "terminal_distribution": "lognormal, zero log-drift, tails truncated at z = +/-4",
        "strike_grid": format!(
            "{} to {} step {}",
            grid.first().map(ToString::to_string).unwrap_or_default(),
            grid.last().map(ToString::to_string).unwrap_or_default(),
            policy.strike_step
        ),
        "min_leg_price": policy.min_leg_price.to_string(),
        "min_expected_result": policy.min_expected_result.to_string(),
        "contract_multiplier": 100,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Vertical spread search ranked by lognormal Expected Result",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Engine entry point: rank every strike pair for `strategy` best to worst.
pub fn evaluate(
    spot: Money,
    days_to_expiry: Decimal,
    implied_vol_pct: Decimal,
    risk_free_rate_pct: Decimal,
    strategy: &str,
    want_chart: bool,
) -> SpreadResult<SpreadSearchOutput> {
    let input = SpreadSearchInput {
        spot,
        days_to_expiry,
        implied_vol_pct,
        risk_free_rate_pct,
        strategy: strategy.to_string(),
        want_chart,
        policy: SearchPolicy::default(),
    };
    analyze_spreads(&input).map(|output| output.result)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
