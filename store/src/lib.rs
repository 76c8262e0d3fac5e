//! Abstract storage traits for the Tally points ledger.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the workspace depends only on the traits.

pub mod error;
pub mod history;
pub mod participant;

pub use error::StoreError;
pub use history::{ClaimRecord, HistoryStore};
pub use participant::{Participant, ParticipantStore};

use tally_types::{Balance, ParticipantId, Points, Timestamp};

/// The combined ledger store: participants plus claim history, with the
/// compound operations that must span both.
///
/// `apply_claim` and `reset_balances` are the two global sequencing points.
/// Implementations must run each inside a single storage transaction (or an
/// equivalent critical section) so that a balance increment and its history
/// record commit together, and a reset never interleaves with a half-applied
/// claim. Reads take no locks and observe whatever state is committed at
/// invocation time.
pub trait LedgerStore: ParticipantStore + HistoryStore {
    /// Atomically increment a participant's balance and append the matching
    /// claim record. Fails with [`StoreError::NotFound`] (and no observable
    /// effect) if the participant does not exist.
    fn apply_claim(
        &self,
        id: &ParticipantId,
        points: Points,
        now: Timestamp,
    ) -> Result<(Balance, ClaimRecord), StoreError>;

    /// Zero every participant's balance, leaving identities, creation
    /// timestamps and the claim history untouched. Returns the number of
    /// balances actually changed (already-zero balances are not counted)
    /// and advances the reset watermark.
    fn reset_balances(&self) -> Result<u64, StoreError>;

    /// Sequence number of the most recent claim at the last reset (0 if the
    /// ledger has never been reset). Claims with `seq` above the watermark
    /// are the ones a current balance is reconstructed from.
    fn reset_watermark(&self) -> Result<u64, StoreError>;

    /// All claims for one participant since the last reset, oldest first.
    fn claims_since_reset(&self, id: &ParticipantId) -> Result<Vec<ClaimRecord>, StoreError> {
        let watermark = self.reset_watermark()?;
        let mut claims: Vec<ClaimRecord> = self
            .iter_claims()?
            .into_iter()
            .filter(|c| c.seq > watermark && &c.participant == id)
            .collect();
        claims.sort_by_key(|c| c.seq);
        Ok(claims)
    }
}
