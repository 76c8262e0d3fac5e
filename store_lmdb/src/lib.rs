//! LMDB storage backend for the Tally points ledger.
//!
//! Implements the storage traits from `tally-store` using the `heed` LMDB
//! bindings. Three databases live in a single environment: participants
//! (id → record), history (chronological binary key → claim record) and
//! meta (claim sequence counter, reset watermark, schema version).
//!
//! LMDB allows one write transaction at a time, so every compound write
//! (claim, reset) is a single `RwTxn` whose commit is the global sequencing
//! point the ledger's concurrency model relies on. Read transactions are
//! taken independently and never block writers.

pub mod environment;
pub mod error;
pub mod ledger;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use ledger::LmdbLedgerStore;
