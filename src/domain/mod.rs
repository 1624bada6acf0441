//! Domain entities and the persistence ports they travel through.

pub mod account;
pub mod ports;
pub mod transaction;
