use serde::{Deserialize, Serialize};

use crate::spreads::pricer::SpreadCandidate;
use crate::spreads::strategy::SpreadStrategy;
use crate::types::Money;

/// Per-share extremes of a spread at expiration. `max_loss` is negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GainLoss {
    pub max_gain: Money,
    pub max_loss: Money,
}

pub fn compute_gain_loss(strategy: SpreadStrategy, candidate: &SpreadCandidate) -> GainLoss {
    let (max_gain, max_loss) = strategy.max_gain_loss(candidate);
    GainLoss { max_gain, max_loss }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bull_call_gain_loss() {
        let c = SpreadCandidate {
            low_strike: dec!(55),
            high_strike: dec!(65),
            low_leg_price: dec!(5.94),
            high_leg_price: dec!(1.06),
            break_even_point: dec!(59.88),
        };
        let gl = compute_gain_loss(SpreadStrategy::BullCallSpread, &c);
        assert_eq!(gl.max_gain, dec!(5.12));
        assert_eq!(gl.max_loss, dec!(-4.88));
        // Width of the spread is split between the two extremes
        assert_eq!(gl.max_gain - gl.max_loss, c.high_strike - c.low_strike);
    }

    #[test]
    fn test_bull_put_gain_loss() {
        let c = SpreadCandidate {
            low_strike: dec!(55),
            high_strike: dec!(65),
            low_leg_price: dec!(0.82),
            high_leg_price: dec!(5.92),
            break_even_point: dec!(59.9),
        };
        let gl = compute_gain_loss(SpreadStrategy::BullPutSpread, &c);
        assert_eq!(gl.max_gain, dec!(5.1));
        assert_eq!(gl.max_loss, dec!(-4.9));
        assert_eq!(gl.max_gain - gl.max_loss, dec!(10));
    }
}
