use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use spread_core::pricing::black_scholes::{quote_option, PricingInputs};

use crate::input;

/// Arguments for a single-strike option quote
#[derive(Args)]
pub struct QuoteArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub spot: Option<Decimal>,

    #[arg(long)]
    pub strike: Option<Decimal>,

    #[arg(long)]
    pub days_to_expiry: Option<Decimal>,

    /// Implied volatility in percent
    #[arg(long)]
    pub implied_vol: Option<Decimal>,

    /// Risk-free rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,
}

pub fn run_quote(args: QuoteArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let pricing_input: PricingInputs = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let (Some(spot), Some(strike), Some(days), Some(vol), Some(rate)) = (
        args.spot,
        args.strike,
        args.days_to_expiry,
        args.implied_vol,
        args.rate,
    ) {
        PricingInputs {
            spot_price: spot,
            strike_price: strike,
            days_to_expiry: days,
            volatility_pct: vol,
            risk_free_rate_pct: rate,
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file.json>, stdin, or all of --spot --strike --days-to-expiry --implied-vol --rate required for a quote".into());
    };

    tracing::debug!(
        spot = %pricing_input.spot_price,
        strike = %pricing_input.strike_price,
        "pricing option pair"
    );

    let result = quote_option(&pricing_input)?;
    Ok(serde_json::to_value(result)?)
}
