//! In-memory request table: dense row arena plus ordered key indexes.
//!
//! # Invariants
//! - `rows[i]` is addressed by exactly one entry in `by_key` and one in `by_owner`.
//! - Rows are never removed, so arena positions stay stable.

use crate::model::request::{Owner, PrimaryKey, ServiceRequest};
use crate::repo::request_repo::{RepoError, RepoResult, RequestRepository};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct InMemoryRequestRepository {
    rows: Vec<ServiceRequest>,
    by_key: BTreeMap<PrimaryKey, usize>,
    by_owner: BTreeMap<Owner, usize>,
    capacity_limit: Option<usize>,
}

impl InMemoryRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the row count; inserts past the cap fail with `StorageExhausted`.
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            capacity_limit: Some(limit),
            ..Self::default()
        }
    }

    /// Verifies both indexes address every row exactly once.
    pub fn check_index_consistency(&self) -> RepoResult<()> {
        if self.by_key.len() != self.rows.len() || self.by_owner.len() != self.rows.len() {
            return Err(RepoError::InvalidData(format!(
                "index size mismatch: rows={} by_key={} by_owner={}",
                self.rows.len(),
                self.by_key.len(),
                self.by_owner.len()
            )));
        }
        for (slot, row) in self.rows.iter().enumerate() {
            if self.by_key.get(&row.prim_key) != Some(&slot) {
                return Err(RepoError::InvalidData(format!(
                    "primary index does not address prim_key={}",
                    row.prim_key
                )));
            }
            if self.by_owner.get(&row.owner) != Some(&slot) {
                return Err(RepoError::InvalidData(format!(
                    "owner index does not address owner={}",
                    row.owner
                )));
            }
        }
        Ok(())
    }

    /// Snapshot of the owner index as `(owner, prim_key)` pairs.
    pub fn owner_index(&self) -> Vec<(Owner, PrimaryKey)> {
        self.by_owner
            .iter()
            .map(|(owner, slot)| (*owner, self.rows[*slot].prim_key))
            .collect()
    }
}

impl RequestRepository for InMemoryRequestRepository {
    fn available_primary_key(&self) -> RepoResult<PrimaryKey> {
        match self.by_key.keys().next_back() {
            None => Ok(0),
            Some(max) => max.checked_add(1).ok_or(RepoError::StorageExhausted),
        }
    }

    fn get(&self, prim_key: PrimaryKey) -> RepoResult<Option<ServiceRequest>> {
        Ok(self.by_key.get(&prim_key).map(|slot| self.rows[*slot].clone()))
    }

    fn find_by_owner(&self, owner: Owner) -> RepoResult<Option<ServiceRequest>> {
        Ok(self.by_owner.get(&owner).map(|slot| self.rows[*slot].clone()))
    }

    fn insert(&mut self, request: &ServiceRequest) -> RepoResult<()> {
        if self.by_key.contains_key(&request.prim_key) {
            return Err(RepoError::DuplicateKey(request.prim_key));
        }
        if self.by_owner.contains_key(&request.owner) {
            return Err(RepoError::DuplicateOwner(request.owner));
        }
        if self
            .capacity_limit
            .is_some_and(|limit| self.rows.len() >= limit)
        {
            return Err(RepoError::StorageExhausted);
        }
        self.rows
            .try_reserve(1)
            .map_err(|_| RepoError::StorageExhausted)?;

        let slot = self.rows.len();
        self.rows.push(request.clone());
        self.by_key.insert(request.prim_key, slot);
        self.by_owner.insert(request.owner, slot);
        Ok(())
    }

    fn update(&mut self, request: &ServiceRequest) -> RepoResult<()> {
        let slot = *self
            .by_key
            .get(&request.prim_key)
            .ok_or(RepoError::NotFound(request.prim_key))?;
        let row = &mut self.rows[slot];
        if row.owner != request.owner {
            return Err(RepoError::InvalidData(format!(
                "owner of prim_key={} is immutable",
                request.prim_key
            )));
        }
        row.title.clone_from(&request.title);
        row.description.clone_from(&request.description);
        row.time.clone_from(&request.time);
        row.last_updated = request.last_updated;
        Ok(())
    }

    fn list(&self) -> RepoResult<Vec<ServiceRequest>> {
        Ok(self
            .by_key
            .values()
            .map(|slot| self.rows[*slot].clone())
            .collect())
    }

    fn len(&self) -> RepoResult<usize> {
        Ok(self.rows.len())
    }

    fn atomically<T, F>(&mut self, op: F) -> RepoResult<T>
    where
        F: FnOnce(&mut Self) -> RepoResult<T>,
    {
        // `&mut self` already excludes every other reader and writer; each
        // write method validates before mutating, so a failed op leaves no trace.
        op(self)
    }
}
