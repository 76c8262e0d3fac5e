//! Validated participant display name.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A participant's display name.
///
/// Always non-empty (whitespace-only input is rejected at construction) and
/// compared case-sensitively. Names are immutable once a participant exists.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate a raw string into a display name.
    pub fn parse(raw: impl Into<String>) -> Result<Self, NameError> {
        let s = raw.into();
        if s.trim().is_empty() {
            return Err(NameError::Empty);
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for DisplayName {
    type Error = NameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<DisplayName> for String {
    fn from(name: DisplayName) -> Self {
        name.0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("display name must not be empty")]
    Empty,
}
