#[cfg(feature = "cli")]
pub mod cli;
pub mod evaluation;
pub mod planner;
pub mod position;
pub mod search;
mod tests;
pub mod tune;
