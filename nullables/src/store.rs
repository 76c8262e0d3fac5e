//! Nullable store — thread-safe in-memory ledger storage for testing.

use std::collections::HashMap;
use std::sync::Mutex;

use tally_store::{
    ClaimRecord, HistoryStore, LedgerStore, Participant, ParticipantStore, StoreError,
};
use tally_types::{Balance, DisplayName, ParticipantId, Points, Timestamp};

#[derive(Default)]
struct Inner {
    participants: HashMap<ParticipantId, Participant>,
    claims: Vec<ClaimRecord>,
    claim_seq: u64,
    reset_watermark: u64,
}

/// An in-memory ledger store.
///
/// One mutex guards participants and history together, so the compound
/// operations of [`LedgerStore`] hold their critical section across the
/// whole read-increment-append sequence. That satisfies the same atomicity
/// contract as the LMDB backend's write transaction, at the cost of
/// serialising all writers.
pub struct NullStore {
    inner: Mutex<Inner>,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Drop a participant while keeping their claims, leaving the history
    /// dangling. Exists so tests can provoke referential-integrity failures
    /// that a healthy store never produces.
    pub fn remove_participant(&self, id: &ParticipantId) {
        self.inner.lock().unwrap().participants.remove(id);
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticipantStore for NullStore {
    fn create(&self, name: &DisplayName, now: Timestamp) -> Result<Participant, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let id = ParticipantId::from_name(name);
        if inner.participants.contains_key(&id) {
            return Err(StoreError::Duplicate(name.to_string()));
        }
        let participant = Participant {
            id,
            name: name.clone(),
            balance: Balance::ZERO,
            created_at: now,
        };
        inner.participants.insert(id, participant.clone());
        Ok(participant)
    }

    fn get(&self, id: &ParticipantId) -> Result<Participant, StoreError> {
        self.inner
            .lock()
            .unwrap()
            .participants
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_hex()))
    }

    fn exists(&self, id: &ParticipantId) -> Result<bool, StoreError> {
        Ok(self.inner.lock().unwrap().participants.contains_key(id))
    }

    fn participant_count(&self) -> Result<u64, StoreError> {
        Ok(self.inner.lock().unwrap().participants.len() as u64)
    }

    fn iter_participants(&self) -> Result<Vec<Participant>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .participants
            .values()
            .cloned()
            .collect())
    }
}

impl HistoryStore for NullStore {
    fn history_count(&self) -> Result<u64, StoreError> {
        Ok(self.inner.lock().unwrap().claims.len() as u64)
    }

    fn iter_claims(&self) -> Result<Vec<ClaimRecord>, StoreError> {
        Ok(self.inner.lock().unwrap().claims.clone())
    }
}

impl LedgerStore for NullStore {
    fn apply_claim(
        &self,
        id: &ParticipantId,
        points: Points,
        now: Timestamp,
    ) -> Result<(Balance, ClaimRecord), StoreError> {
        let mut inner = self.inner.lock().unwrap();

        let balance = {
            let participant = inner
                .participants
                .get(id)
                .ok_or_else(|| StoreError::NotFound(id.to_hex()))?;
            participant
                .balance
                .checked_add(points)
                .ok_or_else(|| StoreError::Corruption(format!("balance overflow for {}", id)))?
        };

        inner.claim_seq += 1;
        let record = ClaimRecord {
            participant: *id,
            points,
            claimed_at: now,
            seq: inner.claim_seq,
        };
        inner.claims.push(record.clone());
        inner
            .participants
            .get_mut(id)
            .expect("participant checked above")
            .balance = balance;

        Ok((balance, record))
    }

    fn reset_balances(&self) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let mut count = 0u64;
        for participant in inner.participants.values_mut() {
            if !participant.balance.is_zero() {
                participant.balance = Balance::ZERO;
                count += 1;
            }
        }
        inner.reset_watermark = inner.claim_seq;
        Ok(count)
    }

    fn reset_watermark(&self) -> Result<u64, StoreError> {
        Ok(self.inner.lock().unwrap().reset_watermark)
    }
}
