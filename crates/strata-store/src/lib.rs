// crates/strata-store/src/lib.rs
//
// strata-store: Storage layer for the Strata staking engine.
//
// Provides the `KvStore` backends the engine runs against: a RocksDB-backed
// persistent store, an ordered in-memory store for tests and ephemeral nodes,
// and a write-staging overlay that makes each state transition all-or-nothing.

pub mod cache;
pub mod memory;
pub mod rocks;

// Re-export key types for ergonomic access from downstream crates.
pub use cache::CacheStore;
pub use memory::MemStore;
pub use rocks::RocksStore;
