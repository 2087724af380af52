//! Ledger storage
//!
//! The in-memory pool of unspent outputs the engine settles against, and the
//! sled-backed store that carries a pool from one epoch to the next.

pub mod snapshot_store;
pub mod utxo_pool;

pub use snapshot_store::SnapshotStore;
pub use utxo_pool::UTXOPool;
