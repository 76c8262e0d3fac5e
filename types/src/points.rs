//! Point amounts and balances.
//!
//! A claim awards between [`Points::MIN`] and [`Points::MAX`] points
//! inclusive. Balances are plain u64 totals; arithmetic is checked so a
//! corrupted store can never silently wrap a balance.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Points awarded by a single claim, always in [1, 10] inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Points(u8);

impl Points {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: u8) -> Result<Self, PointsError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(PointsError::OutOfRange(value))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pts", self.0)
    }
}

impl TryFrom<u8> for Points {
    type Error = PointsError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Points> for u8 {
    fn from(points: Points) -> Self {
        points.0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PointsError {
    #[error("points value {0} is outside the claimable range [1, 10]")]
    OutOfRange(u8),
}

/// A participant's current point total.
///
/// Non-negative and monotonically non-decreasing except when a leaderboard
/// reset returns it to zero.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Balance(u64);

impl Balance {
    pub const ZERO: Self = Self(0);

    pub fn new(total: u64) -> Self {
        Self(total)
    }

    pub fn total(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Add claimed points, failing on overflow rather than wrapping.
    pub fn checked_add(self, points: Points) -> Option<Self> {
        self.0.checked_add(u64::from(points.get())).map(Self)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pts", self.0)
    }
}

/// Source of claim point draws.
///
/// The production implementation draws uniformly at random from [1, 10];
/// tests substitute a scripted sequence. Claims must be independent draws.
pub trait PointsSource: Send + Sync {
    fn draw(&self) -> Points;
}
