//! Route modules.

pub mod audit;
pub mod health;
