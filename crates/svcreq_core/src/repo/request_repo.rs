//! Request repository contract and error types.

use crate::db::DbError;
use crate::model::request::{Owner, PrimaryKey, ServiceRequest};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence failure for request table operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// No primary key or row slot can be allocated.
    StorageExhausted,
    NotFound(PrimaryKey),
    DuplicateKey(PrimaryKey),
    DuplicateOwner(Owner),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::StorageExhausted => write!(f, "request storage exhausted"),
            Self::NotFound(key) => write!(f, "request not found: prim_key={key}"),
            Self::DuplicateKey(key) => write!(f, "primary key already in use: {key}"),
            Self::DuplicateOwner(owner) => write!(f, "owner already has a request: {owner}"),
            Self::InvalidData(message) => write!(f, "invalid persisted request data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(inner, _) = &value {
            if inner.code == rusqlite::ErrorCode::DiskFull {
                return Self::StorageExhausted;
            }
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Ordered request table with a unique owner index.
///
/// # Contract
/// - `find_by_owner` resolves through the owner index, never a table scan.
/// - `insert` rejects a taken primary key or owner without side effects.
/// - `update` rewrites mutable columns only; `prim_key`/`owner` stay fixed.
pub trait RequestRepository {
    /// Current maximum key + 1, or 0 for an empty table.
    fn available_primary_key(&self) -> RepoResult<PrimaryKey>;
    fn get(&self, prim_key: PrimaryKey) -> RepoResult<Option<ServiceRequest>>;
    fn find_by_owner(&self, owner: Owner) -> RepoResult<Option<ServiceRequest>>;
    fn insert(&mut self, request: &ServiceRequest) -> RepoResult<()>;
    fn update(&mut self, request: &ServiceRequest) -> RepoResult<()>;
    /// All rows ordered by primary key.
    fn list(&self) -> RepoResult<Vec<ServiceRequest>>;
    fn len(&self) -> RepoResult<usize>;

    fn is_empty(&self) -> RepoResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Runs `op` as one indivisible read-check-write unit.
    ///
    /// On error nothing `op` wrote remains visible.
    fn atomically<T, F>(&mut self, op: F) -> RepoResult<T>
    where
        F: FnOnce(&mut Self) -> RepoResult<T>;
}
