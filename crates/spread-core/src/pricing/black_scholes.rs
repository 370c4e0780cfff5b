use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::SpreadError;
use crate::math::{ensure_finite, norm_cdf, norm_pdf, round_dp, to_f64, DAYS_PER_YEAR};
use crate::types::*;
use crate::SpreadResult;

/// Decimal places for option premiums.
pub const PRICE_DP: u32 = 2;
/// Decimal places for Greeks.
pub const GREEK_DP: u32 = 4;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    Call,
    Put,
}

/// Black-Scholes inputs in market units: days, and percentages for
/// volatility and rate (40 = 40%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingInputs {
    pub spot_price: Money,
    pub strike_price: Money,
    pub days_to_expiry: Decimal,
    pub volatility_pct: Decimal,
    pub risk_free_rate_pct: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub option_type: OptionType,
    pub price: Money,
    pub delta: Decimal,
    pub gamma: Decimal,
    pub theta: Decimal,
    pub vega: Decimal,
    pub rho: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionQuotePair {
    pub call: OptionQuote,
    pub put: OptionQuote,
    /// (C - P) - (S - K*e^(-rt)) on unrounded prices; zero up to float noise.
    pub put_call_parity_residual: Decimal,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn positive(value: Decimal, field: &str) -> SpreadResult<()> {
    if value <= Decimal::ZERO {
        return Err(SpreadError::InvalidInput {
            field: field.into(),
            reason: "must be positive".into(),
        });
    }
    Ok(())
}

fn validate_pricing_input(input: &PricingInputs) -> SpreadResult<()> {
    positive(input.spot_price, "spot_price")?;
    positive(input.strike_price, "strike_price")?;
    positive(input.days_to_expiry, "days_to_expiry")?;
    positive(input.volatility_pct, "volatility_pct")?;
    if input.risk_free_rate_pct < Decimal::ZERO {
        return Err(SpreadError::InvalidInput {
            field: "risk_free_rate_pct".into(),
            reason: "must not be negative".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Black-Scholes internals
// ---------------------------------------------------------------------------

struct BsParams {
    s: f64,
    k: f64,
    t: f64,
    r: f64,
    sigma: f64,
    d1: f64,
    d2: f64,
    sqrt_t: f64,
    exp_neg_rt: f64,
}

fn compute_bs_params(input: &PricingInputs) -> SpreadResult<BsParams> {
    validate_pricing_input(input)?;

    let s = to_f64(input.spot_price, "spot_price")?;
    let k = to_f64(input.strike_price, "strike_price")?;
    let t = to_f64(input.days_to_expiry, "days_to_expiry")? / DAYS_PER_YEAR;
    let sigma = to_f64(input.volatility_pct, "volatility_pct")? / 100.0;
    let r = to_f64(input.risk_free_rate_pct, "risk_free_rate_pct")? / 100.0;

    let sqrt_t = t.sqrt();
    let d1 = ensure_finite(
        ((s / k).ln() + (r + sigma * sigma / 2.0) * t) / (sigma * sqrt_t),
        "black_scholes d1",
    )?;
    let d2 = d1 - sigma * sqrt_t;

    Ok(BsParams {
        s,
        k,
        t,
        r,
        sigma,
        d1,
        d2,
        sqrt_t,
        exp_neg_rt: (-r * t).exp(),
    })
}

fn bs_price(p: &BsParams, option_type: OptionType) -> f64 {
    match option_type {
        OptionType::Call => p.s * norm_cdf(p.d1) - p.k * p.exp_neg_rt * norm_cdf(p.d2),
        OptionType::Put => p.k * p.exp_neg_rt * norm_cdf(-p.d2) - p.s * norm_cdf(-p.d1),
    }
}

fn build_quote(p: &BsParams, option_type: OptionType) -> SpreadResult<OptionQuote> {
    let nd1 = norm_pdf(p.d1);
    let call_delta = norm_cdf(p.d1);

    let delta = match option_type {
        OptionType::Call => call_delta,
        OptionType::Put => call_delta - 1.0,
    };

    let gamma = nd1 / (p.s * p.sigma * p.sqrt_t);

    // Per calendar day
    let decay = -p.s * p.sigma * nd1 / (2.0 * p.sqrt_t);
    let carry = p.r * p.k * p.exp_neg_rt;
    let theta = match option_type {
        OptionType::Call => (decay - carry * norm_cdf(p.d2)) / DAYS_PER_YEAR,
        OptionType::Put => (decay + carry * norm_cdf(-p.d2)) / DAYS_PER_YEAR,
    };

    // Per 1% move in volatility
    let vega = p.s * p.sqrt_t * nd1 / 100.0;

    // Per 1% move in rate
    let rho = match option_type {
        OptionType::Call => p.k * p.t * p.exp_neg_rt * norm_cdf(p.d2) / 100.0,
        OptionType::Put => -p.k * p.t * p.exp_neg_rt * norm_cdf(-p.d2) / 100.0,
    };

    Ok(OptionQuote {
        option_type,
        price: round_dp(bs_price(p, option_type), PRICE_DP, "option price")?,
        delta: round_dp(delta, GREEK_DP, "delta")?,
        gamma: round_dp(gamma, GREEK_DP, "gamma")?,
        theta: round_dp(theta, GREEK_DP, "theta")?,
        vega: round_dp(vega, GREEK_DP, "vega")?,
        rho: round_dp(rho, GREEK_DP, "rho")?,
    })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Premium of a single European option, rounded to cents.
pub fn option_premium(input: &PricingInputs, option_type: OptionType) -> SpreadResult<Money> {
    let params = compute_bs_params(input)?;
    round_dp(bs_price(&params, option_type), PRICE_DP, "option price")
}

/// Premium and closed-form Greeks of a single European option.
pub fn price_option(input: &PricingInputs, option_type: OptionType) -> SpreadResult<OptionQuote> {
    let params = compute_bs_params(input)?;
    build_quote(&params, option_type)
}

/// Call and put quotes for the same inputs, with a put-call parity check.
pub fn quote_option(input: &PricingInputs) -> SpreadResult<ComputationOutput<OptionQuotePair>> {
    let start = Instant::now();
    let params = compute_bs_params(input)?;

    let call = build_quote(&params, OptionType::Call)?;
    let put = build_quote(&params, OptionType::Put)?;

    let residual = (bs_price(&params, OptionType::Call) - bs_price(&params, OptionType::Put))
        - (params.s - params.k * params.exp_neg_rt);

    let output = OptionQuotePair {
        call,
        put,
        put_call_parity_residual: round_dp(residual, 10, "put-call parity residual")?,
    };

    let assumptions = serde_json::json!({
        "model": "Black-Scholes, European exercise, no dividends",
        "day_count": "calendar days / 365",
        "price_decimals": PRICE_DP,
        "greek_decimals": GREEK_DP,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Black-Scholes (closed-form)",
        &assumptions,
        Vec::new(),
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn approx_eq(a: Decimal, b: Decimal, tol: Decimal) -> bool {
        (a - b).abs() < tol
    }

    fn default_inputs() -> PricingInputs {
        PricingInputs {
            spot_price: dec!(60),
            strike_price: dec!(55),
            days_to_expiry: dec!(30),
            volatility_pct: dec!(40),
            risk_free_rate_pct: dec!(2.5136),
        }
    }

    fn with_strike(strike: Decimal) -> PricingInputs {
        PricingInputs {
            strike_price: strike,
            ..default_inputs()
        }
    }

    // -----------------------------------------------------------------------
    // Prices
    // -----------------------------------------------------------------------

    #[test]
    fn test_reference_call_prices() {
        // Legs of the bull call spread 55/65 on S=60, 30 DTE, 40% IV
        assert_eq!(
            option_premium(&with_strike(dec!(55)), OptionType::Call).unwrap(),
            dec!(5.94)
        );
        assert_eq!(
            option_premium(&with_strike(dec!(65)), OptionType::Call).unwrap(),
            dec!(1.06)
        );
    }

    #[test]
    fn test_reference_put_prices() {
        assert_eq!(
            option_premium(&with_strike(dec!(55)), OptionType::Put).unwrap(),
            dec!(0.82)
        );
        assert_eq!(
            option_premium(&with_strike(dec!(65)), OptionType::Put).unwrap(),
            dec!(5.92)
        );
    }

    #[test]
    fn test_textbook_atm_call() {
        // S=K=100, T=365d, r=5%, vol=20% -> 10.45
        let input = PricingInputs {
            spot_price: dec!(100),
            strike_price: dec!(100),
            days_to_expiry: dec!(365),
            volatility_pct: dec!(20),
            risk_free_rate_pct: dec!(5),
        };
        let call = price_option(&input, OptionType::Call).unwrap();
        let put = price_option(&input, OptionType::Put).unwrap();
        assert_eq!(call.price, dec!(10.45));
        assert_eq!(put.price, dec!(5.57));
    }

    #[test]
    fn test_put_call_parity_across_strikes() {
        let t: f64 = 30.0 / 365.0;
        let r: f64 = 0.025136;
        for strike in [dec!(50), dec!(55), dec!(60), dec!(62.5), dec!(70)] {
            let input = with_strike(strike);
            let c = option_premium(&input, OptionType::Call).unwrap();
            let p = option_premium(&input, OptionType::Put).unwrap();
            let k = to_f64(strike, "k").unwrap();
            let rhs = round_dp(60.0 - k * (-r * t).exp(), 4, "rhs").unwrap();
            assert!(
                approx_eq(c - p, rhs, dec!(0.011)),
                "Parity failed at K={strike}: C-P={}, S-K*e^(-rt)={rhs}",
                c - p
            );
        }
    }

    #[test]
    fn test_parity_residual_in_quote_pair() {
        let out = quote_option(&default_inputs()).unwrap();
        assert!(out.result.put_call_parity_residual.abs() < dec!(0.0000001));
        assert_eq!(out.result.call.option_type, OptionType::Call);
        assert_eq!(out.result.put.option_type, OptionType::Put);
        assert_eq!(out.methodology, "Black-Scholes (closed-form)");
        assert!(!out.metadata.version.is_empty());
    }

    #[test]
    fn test_deep_otm_call_near_zero() {
        let quote = price_option(&with_strike(dec!(120)), OptionType::Call).unwrap();
        assert_eq!(quote.price, dec!(0.00));
        assert!(quote.price >= Decimal::ZERO);
    }

    // -----------------------------------------------------------------------
    // Greeks
    // -----------------------------------------------------------------------

    #[test]
    fn test_delta_ranges_and_relation() {
        let call = price_option(&default_inputs(), OptionType::Call).unwrap();
        let put = price_option(&default_inputs(), OptionType::Put).unwrap();
        assert!(call.delta > Decimal::ZERO && call.delta < Decimal::ONE);
        assert!(put.delta < Decimal::ZERO && put.delta > -Decimal::ONE);
        assert!(approx_eq(call.delta - put.delta, Decimal::ONE, dec!(0.00011)));
    }

    #[test]
    fn test_gamma_and_vega_shared() {
        let call = price_option(&default_inputs(), OptionType::Call).unwrap();
        let put = price_option(&default_inputs(), OptionType::Put).unwrap();
        assert!(call.gamma > Decimal::ZERO);
        assert_eq!(call.gamma, put.gamma);
        assert!(call.vega > Decimal::ZERO);
        assert_eq!(call.vega, put.vega);
    }

    #[test]
    fn test_theta_and_rho_signs() {
        let call = price_option(&default_inputs(), OptionType::Call).unwrap();
        let put = price_option(&default_inputs(), OptionType::Put).unwrap();
        assert!(call.theta < Decimal::ZERO, "Call theta {} should be negative", call.theta);
        assert!(put.theta < Decimal::ZERO, "Put theta {} should be negative", put.theta);
        assert!(call.rho > Decimal::ZERO);
        assert!(put.rho < Decimal::ZERO);
    }

    #[test]
    fn test_greeks_rounded_to_four_places() {
        let call = price_option(&default_inputs(), OptionType::Call).unwrap();
        for g in [call.delta, call.gamma, call.theta, call.vega, call.rho] {
            assert!(g.scale() <= GREEK_DP, "{g} has more than 4 decimals");
        }
        assert!(call.price.scale() <= PRICE_DP);
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    fn expect_invalid(input: PricingInputs, expected_field: &str) {
        match option_premium(&input, OptionType::Call) {
            Err(SpreadError::InvalidInput { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("Expected InvalidInput for {expected_field}, got {other:?}"),
        }
    }

    #[test]
    fn test_non_positive_inputs_rejected() {
        expect_invalid(
            PricingInputs {
                spot_price: dec!(0),
                ..default_inputs()
            },
            "spot_price",
        );
        expect_invalid(with_strike(dec!(-1)), "strike_price");
        expect_invalid(
            PricingInputs {
                days_to_expiry: dec!(0),
                ..default_inputs()
            },
            "days_to_expiry",
        );
        expect_invalid(
            PricingInputs {
                volatility_pct: dec!(0),
                ..default_inputs()
            },
            "volatility_pct",
        );
    }

    #[test]
    fn test_negative_rate_rejected_zero_rate_allowed() {
        expect_invalid(
            PricingInputs {
                risk_free_rate_pct: dec!(-0.5),
                ..default_inputs()
            },
            "risk_free_rate_pct",
        );
        let zero_rate = PricingInputs {
            risk_free_rate_pct: dec!(0),
            ..default_inputs()
        };
        assert!(price_option(&zero_rate, OptionType::Put).is_ok());
    }
}
