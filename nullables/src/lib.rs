//! Nullable infrastructure for deterministic testing.
//!
//! The engine's external dependencies (clock, randomness, storage) are
//! abstracted behind traits. This crate provides test-friendly
//! implementations that return deterministic values, can be controlled
//! programmatically, and never touch the filesystem.
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod points;
pub mod store;

pub use clock::NullClock;
pub use points::NullPoints;
pub use store::NullStore;
