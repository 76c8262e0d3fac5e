//! Participant identity type.
//!
//! Identities are opaque 32-byte keys derived from the display name via
//! Blake2s hashing. Because the derivation is deterministic and names are
//! unique (case-sensitively), name uniqueness and id uniqueness coincide.

use blake2::{Blake2s256, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::name::DisplayName;

/// An opaque participant identity, 32 bytes, rendered as lowercase hex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId([u8; 32]);

impl ParticipantId {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive the identity for a display name (case-sensitive).
    pub fn from_name(name: &DisplayName) -> Self {
        let mut hasher = Blake2s256::new();
        hasher.update(name.as_str().as_bytes());
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ParticipantId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| IdParseError::NotHex)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| IdParseError::WrongLength)?;
        Ok(Self(arr))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdParseError {
    #[error("participant id is not valid hex")]
    NotHex,

    #[error("participant id must be 32 bytes")]
    WrongLength,
}
