//! Participant storage trait.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use tally_types::{Balance, DisplayName, ParticipantId, Timestamp};

/// Per-participant information stored in the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: DisplayName,
    /// Current point total since the last reset.
    pub balance: Balance,
    /// Set once at creation, never changed afterwards (reset included).
    pub created_at: Timestamp,
}

/// Trait for participant storage operations.
pub trait ParticipantStore: Send + Sync {
    /// Create a participant with balance 0. Fails with
    /// [`StoreError::Duplicate`] if the name's identity already exists.
    fn create(&self, name: &DisplayName, now: Timestamp) -> Result<Participant, StoreError>;

    fn get(&self, id: &ParticipantId) -> Result<Participant, StoreError>;

    fn exists(&self, id: &ParticipantId) -> Result<bool, StoreError>;

    fn participant_count(&self) -> Result<u64, StoreError>;

    /// All participants in unspecified order.
    fn iter_participants(&self) -> Result<Vec<Participant>, StoreError>;

    /// All participants ranked for the leaderboard: descending balance, ties
    /// broken by earliest creation, final tie by id bytes. The ordering is
    /// total, so repeated reads of an unchanged ledger are identical.
    fn list_ranked(&self) -> Result<Vec<Participant>, StoreError> {
        let mut participants = self.iter_participants()?;
        rank(&mut participants);
        Ok(participants)
    }
}

/// Sort participants into leaderboard order.
pub fn rank(participants: &mut [Participant]) {
    participants.sort_by(|a, b| {
        b.balance
            .cmp(&a.balance)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
}
