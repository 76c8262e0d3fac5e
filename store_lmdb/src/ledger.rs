//! LMDB implementation of the ledger store traits.
//!
//! Two value databases plus meta:
//! - `participants_db`: participant id (32 bytes) → bincode `Participant`.
//! - `history_db`: binary key `claimed_at_be_u64(8) ++ seq_be_u64(8)` →
//!   bincode `ClaimRecord`. Big-endian keys sort lexicographically by time,
//!   so a plain iteration walks the history in chronological order.
//! - `meta_db`: `claim_seq` (next-claim counter) and `reset_watermark`,
//!   both big-endian u64.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn};

use tally_store::{ClaimRecord, HistoryStore, LedgerStore, Participant, ParticipantStore};
use tally_store::StoreError;
use tally_types::{Balance, DisplayName, ParticipantId, Points, Timestamp};

use crate::LmdbError;

const CLAIM_SEQ_KEY: &[u8] = b"claim_seq";
const RESET_WATERMARK_KEY: &[u8] = b"reset_watermark";

/// Build the 16-byte binary key `claimed_at_be_u64 ++ seq_be_u64` for
/// `history_db`.
fn history_key(claimed_at: Timestamp, seq: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&claimed_at.as_secs().to_be_bytes());
    key[8..].copy_from_slice(&seq.to_be_bytes());
    key
}

/// Combined ledger store backed by one LMDB environment.
///
/// LMDB serialises write transactions, so the read-increment-append sequence
/// inside [`LedgerStore::apply_claim`] commits as one atomic unit and can
/// never interleave with a reset.
pub struct LmdbLedgerStore {
    pub(crate) env: Arc<Env>,
    pub(crate) participants_db: Database<Bytes, Bytes>,
    pub(crate) history_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbLedgerStore {
    fn read_counter(&self, txn: &RoTxn, key: &[u8]) -> Result<u64, StoreError> {
        let value = self.meta_db.get(txn, key).map_err(LmdbError::from)?;
        match value {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                    StoreError::Corruption(format!(
                        "meta counter {:?} has unexpected byte length",
                        String::from_utf8_lossy(key)
                    ))
                })?;
                Ok(u64::from_be_bytes(arr))
            }
            None => Ok(0),
        }
    }

    fn get_in_txn(
        &self,
        txn: &RoTxn,
        id: &ParticipantId,
    ) -> Result<Option<Participant>, StoreError> {
        let value = self
            .participants_db
            .get(txn, id.as_bytes())
            .map_err(LmdbError::from)?;
        match value {
            Some(bytes) => Ok(Some(
                bincode::deserialize(bytes).map_err(LmdbError::from)?,
            )),
            None => Ok(None),
        }
    }
}

impl ParticipantStore for LmdbLedgerStore {
    fn create(&self, name: &DisplayName, now: Timestamp) -> Result<Participant, StoreError> {
        let id = ParticipantId::from_name(name);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let existing = self
            .participants_db
            .get(&wtxn, id.as_bytes())
            .map_err(LmdbError::from)?;
        if existing.is_some() {
            return Err(StoreError::Duplicate(name.to_string()));
        }

        let participant = Participant {
            id,
            name: name.clone(),
            balance: Balance::ZERO,
            created_at: now,
        };
        let bytes = bincode::serialize(&participant).map_err(LmdbError::from)?;
        self.participants_db
            .put(&mut wtxn, id.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(participant = %id, name = %name, "participant created");
        Ok(participant)
    }

    fn get(&self, id: &ParticipantId) -> Result<Participant, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        self.get_in_txn(&rtxn, id)?
            .ok_or_else(|| StoreError::NotFound(id.to_hex()))
    }

    fn exists(&self, id: &ParticipantId) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.get_in_txn(&rtxn, id)?.is_some())
    }

    fn participant_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.participants_db.len(&rtxn).map_err(LmdbError::from)?)
    }

    fn iter_participants(&self) -> Result<Vec<Participant>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.participants_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            let (_, value) = entry.map_err(LmdbError::from)?;
            results.push(bincode::deserialize(value).map_err(LmdbError::from)?);
        }
        Ok(results)
    }
}

impl HistoryStore for LmdbLedgerStore {
    fn history_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.history_db.len(&rtxn).map_err(LmdbError::from)?)
    }

    fn iter_claims(&self) -> Result<Vec<ClaimRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.history_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            let (_, value) = entry.map_err(LmdbError::from)?;
            results.push(bincode::deserialize(value).map_err(LmdbError::from)?);
        }
        Ok(results)
    }

    fn list_claims(&self) -> Result<Vec<ClaimRecord>, StoreError> {
        // Keys sort chronologically, so one ascending walk reversed gives
        // most-recent-first with the seq tiebreak for free.
        let mut claims = self.iter_claims()?;
        claims.reverse();
        Ok(claims)
    }
}

impl LedgerStore for LmdbLedgerStore {
    fn apply_claim(
        &self,
        id: &ParticipantId,
        points: Points,
        now: Timestamp,
    ) -> Result<(Balance, ClaimRecord), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        // Dropping the txn on any error path aborts it, so a failure here
        // leaves neither the balance nor the history entry behind.
        let mut participant = self
            .get_in_txn(&wtxn, id)?
            .ok_or_else(|| StoreError::NotFound(id.to_hex()))?;

        participant.balance = participant
            .balance
            .checked_add(points)
            .ok_or_else(|| StoreError::Corruption(format!("balance overflow for {}", id)))?;

        let seq = self.read_counter(&wtxn, CLAIM_SEQ_KEY)? + 1;
        self.meta_db
            .put(&mut wtxn, CLAIM_SEQ_KEY, &seq.to_be_bytes())
            .map_err(LmdbError::from)?;

        let record = ClaimRecord {
            participant: *id,
            points,
            claimed_at: now,
            seq,
        };
        let record_bytes = bincode::serialize(&record).map_err(LmdbError::from)?;
        self.history_db
            .put(&mut wtxn, &history_key(now, seq), &record_bytes)
            .map_err(LmdbError::from)?;

        let participant_bytes = bincode::serialize(&participant).map_err(LmdbError::from)?;
        self.participants_db
            .put(&mut wtxn, id.as_bytes(), &participant_bytes)
            .map_err(LmdbError::from)?;

        wtxn.commit().map_err(LmdbError::from)?;
        Ok((participant.balance, record))
    }

    fn reset_balances(&self) -> Result<u64, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let mut participants: Vec<Participant> = Vec::new();
        {
            let iter = self.participants_db.iter(&wtxn).map_err(LmdbError::from)?;
            for entry in iter {
                let (_, value) = entry.map_err(LmdbError::from)?;
                participants.push(bincode::deserialize(value).map_err(LmdbError::from)?);
            }
        }

        let mut count = 0u64;
        for mut participant in participants {
            if participant.balance.is_zero() {
                continue;
            }
            participant.balance = Balance::ZERO;
            let bytes = bincode::serialize(&participant).map_err(LmdbError::from)?;
            self.participants_db
                .put(&mut wtxn, participant.id.as_bytes(), &bytes)
                .map_err(LmdbError::from)?;
            count += 1;
        }

        let seq = self.read_counter(&wtxn, CLAIM_SEQ_KEY)?;
        self.meta_db
            .put(&mut wtxn, RESET_WATERMARK_KEY, &seq.to_be_bytes())
            .map_err(LmdbError::from)?;

        wtxn.commit().map_err(LmdbError::from)?;
        tracing::debug!(count, watermark = seq, "balances reset");
        Ok(count)
    }

    fn reset_watermark(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        self.read_counter(&rtxn, RESET_WATERMARK_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;

    fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 10, 10 * 1024 * 1024).unwrap();
        (dir, env)
    }

    fn name(raw: &str) -> DisplayName {
        DisplayName::parse(raw).unwrap()
    }

    fn points(value: u8) -> Points {
        Points::new(value).unwrap()
    }

    #[test]
    fn create_and_get_roundtrip() {
        let (_dir, env) = temp_env();
        let store = env.ledger_store();

        let alice = store.create(&name("Alice"), Timestamp::new(100)).unwrap();
        assert_eq!(alice.name.as_str(), "Alice");
        assert_eq!(alice.balance, Balance::ZERO);
        assert_eq!(alice.created_at, Timestamp::new(100));

        let fetched = store.get(&alice.id).unwrap();
        assert_eq!(fetched, alice);
        assert_eq!(store.participant_count().unwrap(), 1);
    }

    #[test]
    fn duplicate_create_is_rejected() {
        let (_dir, env) = temp_env();
        let store = env.ledger_store();

        store.create(&name("Alice"), Timestamp::new(100)).unwrap();
        let err = store.create(&name("Alice"), Timestamp::new(200)).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert_eq!(store.participant_count().unwrap(), 1);
    }

    #[test]
    fn names_are_case_sensitive() {
        let (_dir, env) = temp_env();
        let store = env.ledger_store();

        store.create(&name("alice"), Timestamp::new(1)).unwrap();
        store.create(&name("Alice"), Timestamp::new(2)).unwrap();
        assert_eq!(store.participant_count().unwrap(), 2);
    }

    #[test]
    fn apply_claim_pairs_balance_and_history() {
        let (_dir, env) = temp_env();
        let store = env.ledger_store();
        let alice = store.create(&name("Alice"), Timestamp::new(100)).unwrap();

        let (balance, record) = store
            .apply_claim(&alice.id, points(7), Timestamp::new(110))
            .unwrap();
        assert_eq!(balance.total(), 7);
        assert_eq!(record.participant, alice.id);
        assert_eq!(record.points.get(), 7);
        assert_eq!(record.claimed_at, Timestamp::new(110));
        assert_eq!(record.seq, 1);

        assert_eq!(store.get(&alice.id).unwrap().balance.total(), 7);
        assert_eq!(store.history_count().unwrap(), 1);
    }

    #[test]
    fn claim_for_unknown_id_leaves_no_trace() {
        let (_dir, env) = temp_env();
        let store = env.ledger_store();

        let ghost = ParticipantId::new([9u8; 32]);
        let err = store
            .apply_claim(&ghost, points(3), Timestamp::new(5))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(store.history_count().unwrap(), 0);
    }

    #[test]
    fn list_ranked_orders_by_balance_then_creation() {
        let (_dir, env) = temp_env();
        let store = env.ledger_store();

        let alice = store.create(&name("Alice"), Timestamp::new(100)).unwrap();
        let bob = store.create(&name("Bob"), Timestamp::new(200)).unwrap();
        let carol = store.create(&name("Carol"), Timestamp::new(300)).unwrap();

        store.apply_claim(&bob.id, points(5), Timestamp::new(400)).unwrap();
        store.apply_claim(&carol.id, points(5), Timestamp::new(401)).unwrap();

        let ranked = store.list_ranked().unwrap();
        // Bob and Carol tie on 5; Bob was created earlier. Alice trails on 0.
        assert_eq!(ranked[0].id, bob.id);
        assert_eq!(ranked[1].id, carol.id);
        assert_eq!(ranked[2].id, alice.id);
    }

    #[test]
    fn list_claims_newest_first() {
        let (_dir, env) = temp_env();
        let store = env.ledger_store();
        let alice = store.create(&name("Alice"), Timestamp::new(1)).unwrap();

        store.apply_claim(&alice.id, points(1), Timestamp::new(10)).unwrap();
        store.apply_claim(&alice.id, points(2), Timestamp::new(20)).unwrap();
        // Same timestamp as the previous claim: seq must break the tie.
        store.apply_claim(&alice.id, points(3), Timestamp::new(20)).unwrap();

        let claims = store.list_claims().unwrap();
        assert_eq!(claims.len(), 3);
        assert_eq!(claims[0].points.get(), 3);
        assert_eq!(claims[1].points.get(), 2);
        assert_eq!(claims[2].points.get(), 1);
    }

    #[test]
    fn reset_zeroes_balances_but_keeps_history() {
        let (_dir, env) = temp_env();
        let store = env.ledger_store();

        let alice = store.create(&name("Alice"), Timestamp::new(100)).unwrap();
        let bob = store.create(&name("Bob"), Timestamp::new(200)).unwrap();
        store.apply_claim(&alice.id, points(4), Timestamp::new(300)).unwrap();
        store.apply_claim(&bob.id, points(9), Timestamp::new(301)).unwrap();

        assert_eq!(store.reset_balances().unwrap(), 2);

        let alice_after = store.get(&alice.id).unwrap();
        assert!(alice_after.balance.is_zero());
        assert_eq!(alice_after.created_at, Timestamp::new(100));
        assert!(store.get(&bob.id).unwrap().balance.is_zero());

        // The audit trail survives; post-reset reconstruction starts empty.
        assert_eq!(store.history_count().unwrap(), 2);
        assert_eq!(store.reset_watermark().unwrap(), 2);
        assert!(store.claims_since_reset(&alice.id).unwrap().is_empty());
    }

    #[test]
    fn reset_counts_only_changed_balances() {
        let (_dir, env) = temp_env();
        let store = env.ledger_store();

        let alice = store.create(&name("Alice"), Timestamp::new(1)).unwrap();
        store.create(&name("Bob"), Timestamp::new(2)).unwrap();
        store.apply_claim(&alice.id, points(4), Timestamp::new(3)).unwrap();

        // Bob never claimed, so only Alice's balance changes.
        assert_eq!(store.reset_balances().unwrap(), 1);
        // Everything is already zero now.
        assert_eq!(store.reset_balances().unwrap(), 0);
    }

    #[test]
    fn claims_since_reset_tracks_only_new_claims() {
        let (_dir, env) = temp_env();
        let store = env.ledger_store();
        let alice = store.create(&name("Alice"), Timestamp::new(1)).unwrap();

        store.apply_claim(&alice.id, points(2), Timestamp::new(10)).unwrap();
        store.reset_balances().unwrap();
        store.apply_claim(&alice.id, points(5), Timestamp::new(20)).unwrap();
        store.apply_claim(&alice.id, points(6), Timestamp::new(30)).unwrap();

        let since = store.claims_since_reset(&alice.id).unwrap();
        assert_eq!(since.len(), 2);
        assert_eq!(since[0].points.get(), 5);
        assert_eq!(since[1].points.get(), 6);

        let total: u64 = since.iter().map(|c| u64::from(c.points.get())).sum();
        assert_eq!(store.get(&alice.id).unwrap().balance.total(), total);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let alice_id;
        {
            let env = LmdbEnvironment::open(dir.path(), 10, 10 * 1024 * 1024).unwrap();
            let store = env.ledger_store();
            let alice = store.create(&name("Alice"), Timestamp::new(100)).unwrap();
            store.apply_claim(&alice.id, points(8), Timestamp::new(101)).unwrap();
            alice_id = alice.id;
        }

        let env = LmdbEnvironment::open(dir.path(), 10, 10 * 1024 * 1024).unwrap();
        let store = env.ledger_store();
        assert_eq!(store.get(&alice_id).unwrap().balance.total(), 8);
        assert_eq!(store.history_count().unwrap(), 1);
    }

    #[test]
    fn reset_racing_claims_keeps_balance_consistent() {
        let (_dir, env) = temp_env();
        let store = Arc::new(env.ledger_store());
        let alice = store.create(&name("Alice"), Timestamp::new(1)).unwrap();

        let mut claimers = Vec::new();
        for worker in 0..4u8 {
            let store = Arc::clone(&store);
            let id = alice.id;
            claimers.push(std::thread::spawn(move || {
                for i in 0..25u8 {
                    let value = (worker + i) % 10 + 1;
                    store
                        .apply_claim(&id, Points::new(value).unwrap(), Timestamp::new(2))
                        .unwrap();
                }
            }));
        }
        let resetter = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..20 {
                    store.reset_balances().unwrap();
                    std::thread::yield_now();
                }
            })
        };
        for claimer in claimers {
            claimer.join().unwrap();
        }
        resetter.join().unwrap();

        // The write transaction is the sequencing point: whatever order the
        // commits landed in, the balance must equal the sum of the claims
        // recorded after the final watermark, and no claim may be missing.
        let since: u64 = store
            .claims_since_reset(&alice.id)
            .unwrap()
            .iter()
            .map(|c| u64::from(c.points.get()))
            .sum();
        assert_eq!(store.get(&alice.id).unwrap().balance.total(), since);
        assert_eq!(store.history_count().unwrap(), 100);
    }

    #[test]
    fn concurrent_claims_lose_no_updates() {
        let (_dir, env) = temp_env();
        let store = Arc::new(env.ledger_store());
        let alice = store.create(&name("Alice"), Timestamp::new(1)).unwrap();

        let mut handles = Vec::new();
        for worker in 0..8u8 {
            let store = Arc::clone(&store);
            let id = alice.id;
            handles.push(std::thread::spawn(move || {
                let mut sum = 0u64;
                for i in 0..25u8 {
                    let value = (worker + i) % 10 + 1;
                    let (_, record) = store
                        .apply_claim(&id, Points::new(value).unwrap(), Timestamp::new(50))
                        .unwrap();
                    sum += u64::from(record.points.get());
                }
                sum
            }));
        }

        let expected: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(store.get(&alice.id).unwrap().balance.total(), expected);
        assert_eq!(store.history_count().unwrap(), 200);
    }
}
