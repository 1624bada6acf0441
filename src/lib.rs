//! A transfer orchestration and scheduling engine for internally-held accounts.
//!
//! Transfers between two accounts either execute immediately (when scheduled
//! for the current day) or are recorded as pending and picked up by a daily
//! sweep once their scheduled date arrives. Balance mutations for a given
//! account pair are serialized through per-account locks so concurrent
//! transfers can never observe or produce an inconsistent balance.

pub mod application;
pub mod clock;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
