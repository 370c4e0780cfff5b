pub mod gain_loss;
pub mod payoff;
pub mod pricer;
pub mod probability;
pub mod search;
pub mod strategy;

pub use search::{analyze_spreads, evaluate};
pub use strategy::SpreadStrategy;
