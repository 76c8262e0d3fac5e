use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("LMDB I/O error: {0}")]
    Io(String),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        match e {
            heed::Error::Io(io) => LmdbError::Io(io.to_string()),
            other => LmdbError::Heed(other.to_string()),
        }
    }
}

impl From<bincode::Error> for LmdbError {
    fn from(e: bincode::Error) -> Self {
        LmdbError::Serialization(e.to_string())
    }
}

impl From<LmdbError> for tally_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::Io(msg) => tally_store::StoreError::Unavailable(msg),
            LmdbError::NotFound(key) => tally_store::StoreError::NotFound(key),
            LmdbError::Serialization(msg) => tally_store::StoreError::Serialization(msg),
            LmdbError::Heed(msg) => tally_store::StoreError::Backend(msg),
        }
    }
}
