//! Threshold evaluation and the cooldown-gated alert state machine.

pub mod evaluator;
pub mod state;

#[cfg(test)]
mod tests;

pub use evaluator::{evaluate, STEAL_ALERT_PCT};
pub use state::{AlertStateMachine, Decision};
