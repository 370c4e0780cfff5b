//! Scalar helpers shared by the pricing and probability engines.
//!
//! Computation runs in `f64`; anything handed back to callers goes through
//! [`round_dp`], which converts the exact binary value to `Decimal` and
//! rounds half-to-even.

use rust_decimal::{Decimal, RoundingStrategy};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

use crate::error::SpreadError;
use crate::SpreadResult;

/// Calendar days per year used for every day-count conversion.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Standard normal CDF.
pub fn norm_cdf(x: f64) -> f64 {
    Normal::standard().cdf(x)
}

/// Standard normal PDF.
pub fn norm_pdf(x: f64) -> f64 {
    Normal::standard().pdf(x)
}

/// Round an `f64` to `dp` decimal places as a `Decimal`.
pub fn round_dp(x: f64, dp: u32, context: &str) -> SpreadResult<Decimal> {
    let exact = Decimal::from_f64_retain(x).ok_or_else(|| SpreadError::NonFiniteValue {
        context: context.to_string(),
    })?;
    Ok(exact.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven))
}

/// Widen a `Decimal` to the nearest `f64`.
///
/// Goes through the decimal string so the result is correctly rounded,
/// the same value a float literal with those digits would produce.
pub fn to_f64(value: Decimal, field: &str) -> SpreadResult<f64> {
    value
        .to_string()
        .parse::<f64>()
        .map_err(|e| SpreadError::InvalidInput {
            field: field.to_string(),
            reason: format!("{value} is not representable as f64: {e}"),
        })
}

/// Fail with `NonFiniteValue` if `x` is NaN or infinite.
pub fn ensure_finite(x: f64, context: &str) -> SpreadResult<f64> {
    if x.is_finite() {
        Ok(x)
    } else {
        Err(SpreadError::NonFiniteValue {
            context: context.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_norm_cdf_reference_points() {
        // statrs erfc is good to ~1.4e-11 around |x| = 1
        assert!(approx_eq(norm_cdf(0.0), 0.5, 1e-12));
        assert!(approx_eq(norm_cdf(1.0), 0.841_344_746_068_542_9, 1e-10));
        assert!(approx_eq(norm_cdf(-1.96), 0.024_997_895_148_220_435, 1e-10));
        assert!(approx_eq(norm_cdf(2.0), 0.977_249_868_051_820_8, 1e-10));
        // Phi(-4) = 3.17e-5: the mass dropped by each truncated tail
        assert!(norm_cdf(-4.0) < 4e-5);
        assert!(1.0 - norm_cdf(4.0) < 4e-5);
    }

    #[test]
    fn test_norm_cdf_symmetry() {
        for x in [0.1, 0.5, 1.3, 2.7, 3.9] {
            assert!(approx_eq(norm_cdf(x) + norm_cdf(-x), 1.0, 1e-12));
        }
    }

    #[test]
    fn test_norm_pdf_peak() {
        assert!(approx_eq(norm_pdf(0.0), 0.398_942_280_401_432_7, 1e-14));
        assert!(approx_eq(norm_pdf(1.0), norm_pdf(-1.0), 1e-15));
    }

    #[test]
    fn test_round_dp_half_even_on_exact_values() {
        // 0.125 and 0.375 are exact in binary, so they are true midpoints
        assert_eq!(round_dp(0.125, 2, "t").unwrap(), dec!(0.12));
        assert_eq!(round_dp(0.375, 2, "t").unwrap(), dec!(0.38));
        assert_eq!(round_dp(5.9412, 2, "t").unwrap(), dec!(5.94));
        assert_eq!(round_dp(-4.8799999, 2, "t").unwrap(), dec!(-4.88));
    }

    #[test]
    fn test_round_dp_rejects_nan() {
        match round_dp(f64::NAN, 2, "nan test") {
            Err(SpreadError::NonFiniteValue { context }) => assert_eq!(context, "nan test"),
            other => panic!("Expected NonFiniteValue, got {other:?}"),
        }
    }

    #[test]
    fn test_to_f64_roundtrip() {
        assert_eq!(to_f64(dec!(59.88), "bep").unwrap(), 59.88);
        assert_eq!(to_f64(dec!(60), "spot").unwrap(), 60.0);
    }
}
