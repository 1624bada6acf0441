//! Application layer: the transfer orchestrator, the per-account lock
//! registry it relies on, and the daily sweep that re-drives deferred
//! transfers once their scheduled date arrives.

pub mod locks;
pub mod orchestrator;
pub mod sweeper;
