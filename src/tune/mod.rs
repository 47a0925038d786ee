//! Playing matches between agents, training network evaluators through self-play,
//! and benchmarking agent presets against each other.

pub mod benchmark;
pub mod play_match;
pub mod presets;
pub mod selfplay;
