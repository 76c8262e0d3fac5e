//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use tally_store::StoreError;

use crate::ledger::LmdbLedgerStore;
use crate::LmdbError;

/// Current on-disk schema version, stored in the meta database and checked
/// on every open.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    pub(crate) env: Arc<Env>,
    pub(crate) participants_db: Database<Bytes, Bytes>,
    pub(crate) history_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    ///
    /// The path must not be opened by any other process or environment at
    /// the same time (LMDB's single-environment rule, hence the `unsafe`
    /// block around `heed`'s open).
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, StoreError> {
        let env = unsafe {
            EnvOpenOptions::new()
                .max_dbs(max_dbs)
                .map_size(map_size)
                .open(path)
        }
        .map_err(LmdbError::from)?;

        let mut wtxn = env.write_txn().map_err(LmdbError::from)?;
        let participants_db = env
            .create_database::<Bytes, Bytes>(&mut wtxn, Some("participants"))
            .map_err(LmdbError::from)?;
        let history_db = env
            .create_database::<Bytes, Bytes>(&mut wtxn, Some("history"))
            .map_err(LmdbError::from)?;
        let meta_db = env
            .create_database::<Bytes, Bytes>(&mut wtxn, Some("meta"))
            .map_err(LmdbError::from)?;

        match meta_db
            .get(&wtxn, SCHEMA_VERSION_KEY)
            .map_err(LmdbError::from)?
        {
            None => {
                meta_db
                    .put(&mut wtxn, SCHEMA_VERSION_KEY, &SCHEMA_VERSION.to_le_bytes())
                    .map_err(LmdbError::from)?;
            }
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                    StoreError::Corruption("schema_version has unexpected byte length".into())
                })?;
                let found = u32::from_le_bytes(arr);
                if found != SCHEMA_VERSION {
                    return Err(StoreError::Corruption(format!(
                        "schema version mismatch: found {}, expected {}",
                        found, SCHEMA_VERSION
                    )));
                }
            }
        }
        wtxn.commit().map_err(LmdbError::from)?;

        Ok(Self {
            env: Arc::new(env),
            participants_db,
            history_db,
            meta_db,
        })
    }

    /// The combined ledger store backed by this environment.
    pub fn ledger_store(&self) -> LmdbLedgerStore {
        LmdbLedgerStore {
            env: Arc::clone(&self.env),
            participants_db: self.participants_db,
            history_db: self.history_db,
            meta_db: self.meta_db,
        }
    }
}
