pub mod quote;
pub mod search;
