//! Owner-keyed upsert over a request repository.
//!
//! # Responsibility
//! - Implement submit-or-update: insert on first submit, overwrite after.
//! - Gate every mutation behind an authorized owner capability.
//!
//! # Invariants
//! - At most one row per owner; the owner index is probed before insert.
//! - Primary keys come from `available_primary_key` and are never reassigned.
//! - `last_updated` of a row never decreases.
//! - Probe and write run inside one `RequestRepository::atomically` unit.

use crate::auth::{ActionAuth, AuthError, AuthorizedOwner};
use crate::clock::Clock;
use crate::model::request::{Owner, PrimaryKey, RequestFields, ServiceRequest};
use crate::repo::request_repo::{RepoError, RequestRepository};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of a store command. No partial effect is ever left behind.
#[derive(Debug)]
pub enum StoreError {
    /// The owner did not authorize this action.
    Unauthorized(Owner),
    /// No key or row slot could be allocated.
    StorageExhausted,
    /// Any other persistence failure.
    Storage(RepoError),
}

impl StoreError {
    fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::StorageExhausted => "storage_exhausted",
            Self::Storage(_) => "storage_failed",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized(owner) => write!(f, "owner {owner} did not authorize this action"),
            Self::StorageExhausted => write!(f, "request storage exhausted"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Unauthorized(_) | Self::StorageExhausted => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::StorageExhausted => Self::StorageExhausted,
            other => Self::Storage(other),
        }
    }
}

impl From<AuthError> for StoreError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::NotAuthorized(owner) => Self::Unauthorized(owner),
        }
    }
}

/// Which branch of the upsert ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

impl UpsertOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Updated => "updated",
        }
    }
}

/// Result of one submit-or-update call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted {
    pub outcome: UpsertOutcome,
    pub request: ServiceRequest,
}

/// The per-owner service request store.
///
/// One instance is constructed by the host and passed to each command.
pub struct RecordStore<R: RequestRepository> {
    repo: R,
}

impl<R: RequestRepository> RecordStore<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn into_repository(self) -> R {
        self.repo
    }

    /// Inserts or overwrites the owner's request.
    ///
    /// # Contract
    /// - `owner` must have signed `auth`; otherwise nothing is read or written.
    /// - First call per owner inserts at `available_primary_key()`.
    /// - Later calls overwrite `title`, `description`, `time`, `last_updated`.
    ///
    /// # Errors
    /// - `StoreError::Unauthorized` when `owner` is not a signer of `auth`.
    /// - `StoreError::StorageExhausted` when no key or slot can be allocated.
    pub fn submit_or_update(
        &mut self,
        auth: &ActionAuth,
        owner: Owner,
        fields: RequestFields,
        now: u64,
    ) -> StoreResult<Upserted> {
        let started_at = Instant::now();
        let result = auth
            .require_auth(owner)
            .map_err(StoreError::from)
            .and_then(|authorized| self.upsert(authorized, fields, now));

        match &result {
            Ok(upserted) => info!(
                "event=submit_or_update module=store status=ok outcome={} prim_key={} owner={} duration_ms={}",
                upserted.outcome.as_str(),
                upserted.request.prim_key,
                owner,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=submit_or_update module=store status=error owner={} error_code={} duration_ms={} error={}",
                owner,
                err.code(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    /// Same as `submit_or_update`, reading `now` from `clock`.
    pub fn submit_or_update_with_clock(
        &mut self,
        auth: &ActionAuth,
        owner: Owner,
        fields: RequestFields,
        clock: &impl Clock,
    ) -> StoreResult<Upserted> {
        self.submit_or_update(auth, owner, fields, clock.now())
    }

    /// Upsert for an owner whose authority was already checked.
    pub fn upsert(
        &mut self,
        authorized: AuthorizedOwner,
        fields: RequestFields,
        now: u64,
    ) -> StoreResult<Upserted> {
        let owner = authorized.owner();
        let upserted = self.repo.atomically(|repo| {
            match repo.find_by_owner(owner)? {
                None => {
                    let prim_key = repo.available_primary_key()?;
                    let request = ServiceRequest::new(prim_key, owner, fields, now);
                    repo.insert(&request)?;
                    Ok(Upserted {
                        outcome: UpsertOutcome::Inserted,
                        request,
                    })
                }
                Some(mut request) => {
                    let previous = request.last_updated;
                    if !request.apply(fields, now) {
                        warn!(
                            "event=clock_regressed module=store prim_key={} owner={} last_updated={} now={}",
                            request.prim_key, owner, previous, now
                        );
                    }
                    repo.update(&request)?;
                    Ok(Upserted {
                        outcome: UpsertOutcome::Updated,
                        request,
                    })
                }
            }
        })?;
        Ok(upserted)
    }

    /// Returns true iff no row carries `owner`.
    ///
    /// Resolves through the owner index.
    pub fn is_new_user(&self, owner: Owner) -> StoreResult<bool> {
        Ok(self.repo.find_by_owner(owner)?.is_none())
    }

    pub fn get(&self, prim_key: PrimaryKey) -> StoreResult<Option<ServiceRequest>> {
        Ok(self.repo.get(prim_key)?)
    }

    pub fn get_by_owner(&self, owner: Owner) -> StoreResult<Option<ServiceRequest>> {
        Ok(self.repo.find_by_owner(owner)?)
    }

    /// All requests ordered by primary key.
    pub fn list(&self) -> StoreResult<Vec<ServiceRequest>> {
        Ok(self.repo.list()?)
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.repo.len()?)
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.repo.is_empty()?)
    }
}
