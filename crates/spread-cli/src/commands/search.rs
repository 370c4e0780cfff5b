use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use spread_core::spreads::search::{
    analyze_spreads, recommended_range_warnings, SearchPolicy, SpreadSearchInput,
};

use crate::input;

/// Arguments for the spread search
#[derive(Args)]
pub struct SearchArgs {
    /// Path to JSON input file (overrides the market flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Underlying price
    #[arg(long)]
    pub spot: Option<Decimal>,

    /// Calendar days until expiration
    #[arg(long)]
    pub days_to_expiry: Option<Decimal>,

    /// Implied volatility in percent (40 = 40%)
    #[arg(long)]
    pub implied_vol: Option<Decimal>,

    /// Risk-free rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// bull_call_spread or bull_put_spread
    #[arg(long)]
    pub strategy: Option<String>,

    /// Include the payoff curve of the best spread
    #[arg(long)]
    pub chart: bool,

    /// Minimum premium for each leg (exclusive)
    #[arg(long)]
    pub min_leg_price: Option<Decimal>,

    /// Minimum Expected Result (exclusive)
    #[arg(long)]
    pub min_expected_result: Option<Decimal>,

    /// Abort the search after this many milliseconds
    #[arg(long)]
    pub deadline_ms: Option<u64>,

    /// Reject inputs outside the recommended ranges instead of warning
    #[arg(long)]
    pub strict_ranges: bool,
}

fn load_input(args: &SearchArgs) -> Result<SpreadSearchInput, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_json(path);
    }

    match (
        args.spot,
        args.days_to_expiry,
        args.implied_vol,
        args.rate,
        args.strategy.as_ref(),
    ) {
        (Some(spot), Some(days_to_expiry), Some(implied_vol_pct), Some(risk_free_rate_pct), Some(strategy)) => {
            Ok(SpreadSearchInput {
                spot,
                days_to_expiry,
                implied_vol_pct,
                risk_free_rate_pct,
                strategy: strategy.clone(),
                want_chart: false,
                policy: SearchPolicy::default(),
            })
        }
        (None, None, None, None, None) => input::stdin::read_stdin()?.ok_or_else(|| {
            "--input <file.json>, stdin, or the market flags are required for a search".into()
        }),
        _ => Err("--spot, --days-to-expiry, --implied-vol, --rate and --strategy must be given together".into()),
    }
}

pub fn run_search(args: SearchArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut search_input = load_input(&args)?;

    if args.chart {
        search_input.want_chart = true;
    }
    if let Some(min) = args.min_leg_price {
        search_input.policy.min_leg_price = min;
    }
    if let Some(min) = args.min_expected_result {
        search_input.policy.min_expected_result = min;
    }
    if args.deadline_ms.is_some() {
        search_input.policy.deadline_ms = args.deadline_ms;
    }

    if args.strict_ranges {
        let out_of_range = recommended_range_warnings(&search_input);
        if !out_of_range.is_empty() {
            return Err(out_of_range.join("; ").into());
        }
    }

    tracing::debug!(
        strategy = %search_input.strategy,
        spot = %search_input.spot,
        days_to_expiry = %search_input.days_to_expiry,
        implied_vol_pct = %search_input.implied_vol_pct,
        "starting spread search"
    );

    let result = analyze_spreads(&search_input)?;

    tracing::info!(
        evaluated = result.result.candidates_evaluated,
        retained = result.result.candidates_retained,
        elapsed_us = result.metadata.computation_time_us,
        "spread search complete"
    );

    Ok(serde_json::to_value(result)?)
}
