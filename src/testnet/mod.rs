//! Shared fixtures for unit tests: wallets, genesis pools and signed spends.

pub mod test_utils;

pub use test_utils::*;
