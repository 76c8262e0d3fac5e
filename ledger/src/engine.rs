//! The ledger engine: compound operations over the participant store and
//! the claim history.

use std::sync::Arc;

use serde::Serialize;
use tally_store::{ClaimRecord, LedgerStore, Participant};
use tally_types::{Balance, Clock, DisplayName, ParticipantId, Points, PointsSource};

use crate::error::LedgerError;

/// Result of a successful claim.
#[derive(Clone, Debug, Serialize)]
pub struct ClaimOutcome {
    pub points: Points,
    pub new_balance: Balance,
    pub record: ClaimRecord,
}

/// A history entry joined with the owning participant's display name.
#[derive(Clone, Debug, Serialize)]
pub struct ClaimEntry {
    pub record: ClaimRecord,
    pub name: DisplayName,
}

/// Orchestrates claims, rankings, history reads and resets.
///
/// All mutation of ledger state passes through [`claim`](Self::claim),
/// [`create_participant`](Self::create_participant) or
/// [`reset_leaderboard`](Self::reset_leaderboard). Atomicity of the
/// balance-increment/history-append pair is the store's job; the engine
/// only sequences the calls and types the failures.
pub struct LedgerEngine<S: LedgerStore> {
    store: S,
    clock: Arc<dyn Clock>,
    points: Arc<dyn PointsSource>,
}

impl<S: LedgerStore> LedgerEngine<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>, points: Arc<dyn PointsSource>) -> Self {
        Self {
            store,
            clock,
            points,
        }
    }

    /// Engine with the system clock and the uniform [1, 10] points source.
    pub fn with_system_defaults(store: S) -> Self {
        Self::new(
            store,
            Arc::new(tally_types::SystemClock),
            Arc::new(crate::points::UniformPoints),
        )
    }

    /// Direct access to the underlying store, for diagnostics and tests.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a participant with balance 0.
    ///
    /// The raw name is validated here (non-empty, whitespace rejected); name
    /// uniqueness is enforced by the store, case-sensitively.
    pub fn create_participant(&self, raw_name: &str) -> Result<Participant, LedgerError> {
        let name = DisplayName::parse(raw_name)
            .map_err(|e| LedgerError::InvalidInput(e.to_string()))?;
        let participant = self.store.create(&name, self.clock.now())?;
        tracing::info!(participant = %participant.id, name = %name, "participant created");
        Ok(participant)
    }

    /// Award a uniformly random number of points in [1, 10] to a
    /// participant and record the claim.
    ///
    /// The balance increment and the history record are applied by the store
    /// as one atomic unit: if either fails, neither is observable. The draw
    /// happens before the unit begins; a failed claim wastes a draw, it
    /// never leaks one into the ledger.
    pub fn claim(&self, id: &ParticipantId) -> Result<ClaimOutcome, LedgerError> {
        if !self.store.exists(id)? {
            return Err(LedgerError::NotFound(id.to_hex()));
        }

        let points = self.points.draw();
        let (new_balance, record) = self.store.apply_claim(id, points, self.clock.now())?;
        tracing::debug!(participant = %id, points = points.get(), balance = new_balance.total(), "claim applied");

        Ok(ClaimOutcome {
            points,
            new_balance,
            record,
        })
    }

    /// The current leaderboard: descending balance, ties broken by earliest
    /// creation. A pure read; safe to call concurrently with claims and
    /// reflecting whatever state is committed at invocation time.
    pub fn rankings(&self) -> Result<Vec<Participant>, LedgerError> {
        Ok(self.store.list_ranked()?)
    }

    /// The full claim history, most recent first, each entry joined with
    /// the owning participant's display name.
    ///
    /// A claim referencing a participant the store cannot resolve is a
    /// referential-integrity violation: it is surfaced as
    /// [`LedgerError::Inconsistent`], never silently skipped.
    ///
    /// Under concurrent writes this read and [`rankings`](Self::rankings)
    /// may reflect slightly different instants; no cross-list snapshot is
    /// promised.
    pub fn history(&self) -> Result<Vec<ClaimEntry>, LedgerError> {
        let claims = self.store.list_claims()?;
        let mut entries = Vec::with_capacity(claims.len());
        for record in claims {
            let participant = match self.store.get(&record.participant) {
                Ok(participant) => participant,
                Err(tally_store::StoreError::NotFound(key)) => {
                    tracing::error!(
                        participant = %record.participant,
                        seq = record.seq,
                        "claim references unresolvable participant"
                    );
                    return Err(LedgerError::Inconsistent(format!(
                        "claim {} references unknown participant {}",
                        record.seq, key
                    )));
                }
                Err(other) => return Err(other.into()),
            };
            entries.push(ClaimEntry {
                record,
                name: participant.name,
            });
        }
        Ok(entries)
    }

    /// Zero every balance, returning the number of balances that actually
    /// changed (participants already sitting at zero are not counted).
    ///
    /// The claim history is a permanent audit trail and is deliberately left
    /// untouched: a reset changes the current standings without erasing what
    /// happened.
    pub fn reset_leaderboard(&self) -> Result<u64, LedgerError> {
        let count = self.store.reset_balances()?;
        tracing::info!(count, "leaderboard reset");
        Ok(count)
    }

    /// Audit walk: re-derive every balance from the post-reset claim
    /// history and fail with [`LedgerError::Inconsistent`] on the first
    /// divergence. Intended for diagnostics and tests, not the hot path.
    pub fn verify_balances(&self) -> Result<(), LedgerError> {
        for participant in self.store.iter_participants()? {
            let derived: u64 = self
                .store
                .claims_since_reset(&participant.id)?
                .iter()
                .map(|c| u64::from(c.points.get()))
                .sum();
            if participant.balance.total() != derived {
                tracing::warn!(
                    participant = %participant.id,
                    stored = participant.balance.total(),
                    derived,
                    "balance diverges from claim history"
                );
                return Err(LedgerError::Inconsistent(format!(
                    "participant {} has balance {} but post-reset claims sum to {}",
                    participant.id,
                    participant.balance.total(),
                    derived
                )));
            }
        }
        Ok(())
    }
}
