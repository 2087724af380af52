//! Wallet functionality
//!
//! Key pairs that own outputs and sign the inputs spending them.

#[allow(clippy::module_inception)]
pub mod wallet;

pub use wallet::{hash_pub_key, owner_address, Wallet, ADDRESS_CHECK_SUM_LEN};
