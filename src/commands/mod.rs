//! Command handlers.

pub mod balance;
pub mod generate;
