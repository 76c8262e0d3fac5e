//! The Tally ledger engine.
//!
//! The only component that performs compound ledger operations; every
//! external caller (transport layer, tooling) goes through it. The engine
//! delegates atomicity to the store's transactional operations and holds no
//! locks of its own.

pub mod engine;
pub mod error;
pub mod points;

pub use engine::{ClaimEntry, ClaimOutcome, LedgerEngine};
pub use error::LedgerError;
pub use points::UniformPoints;
