use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpreadError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid strategy: '{0}' (expected one of: bull_call_spread, bull_put_spread)")]
    InvalidStrategy(String),

    #[error("No trade found: none of {candidates} {strategy} candidates passed the liquidity/expected-result filter")]
    NoTradeFound { strategy: String, candidates: usize },

    #[error("Deadline exceeded: evaluated {evaluated} of {total} candidates within {budget_ms} ms")]
    DeadlineExceeded {
        evaluated: usize,
        total: usize,
        budget_ms: u64,
    },

    #[error("Non-finite value in {context}")]
    NonFiniteValue { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for SpreadError {
    fn from(e: serde_json::Error) -> Self {
        SpreadError::SerializationError(e.to_string())
    }
}
