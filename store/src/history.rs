//! Claim history storage trait.
//!
//! The history is an append-only audit trail. Records are created exactly
//! once per successful claim (by [`crate::LedgerStore::apply_claim`]) and
//! never mutated or deleted afterwards; a leaderboard reset leaves them in
//! place.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use tally_types::{ParticipantId, Points, Timestamp};

/// Immutable record of one claim event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    /// The participant the points were awarded to, by identity. The display
    /// name is resolved at read time, never stored redundantly here.
    pub participant: ParticipantId,
    pub points: Points,
    pub claimed_at: Timestamp,
    /// Store-assigned sequence number, strictly increasing across all
    /// claims. Makes history ordering total when timestamps collide and
    /// anchors the reset watermark.
    pub seq: u64,
}

/// Trait for claim history storage operations.
pub trait HistoryStore: Send + Sync {
    fn history_count(&self) -> Result<u64, StoreError>;

    /// All claim records in unspecified order.
    fn iter_claims(&self) -> Result<Vec<ClaimRecord>, StoreError>;

    /// All claim records, most recent first.
    fn list_claims(&self) -> Result<Vec<ClaimRecord>, StoreError> {
        let mut claims = self.iter_claims()?;
        claims.sort_by(|a, b| {
            b.claimed_at
                .cmp(&a.claimed_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(claims)
    }
}
