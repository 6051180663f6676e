pub mod common;
pub mod tally;
pub mod types;
