//! Fundamental types for the Tally points ledger.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: participant identities, display names, point amounts, balances
//! and timestamps, plus the `Clock` and `PointsSource` seams the engine uses
//! so tests can control time and randomness.

pub mod id;
pub mod name;
pub mod points;
pub mod time;

pub use id::{IdParseError, ParticipantId};
pub use name::{DisplayName, NameError};
pub use points::{Balance, Points, PointsError, PointsSource};
pub use time::{Clock, SystemClock, Timestamp};
