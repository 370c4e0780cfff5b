pub mod error;
pub mod math;
pub mod types;

#[cfg(feature = "pricing")]
pub mod pricing;

#[cfg(feature = "spreads")]
pub mod spreads;

pub use error::SpreadError;
pub use types::*;

/// Standard result type for all spread-core operations
pub type SpreadResult<T> = Result<T, SpreadError>;
