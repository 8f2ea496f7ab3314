//! SQLite-backed request table.
//!
//! # Responsibility
//! - Persist `ServiceRequest` rows in `service_requests`.
//! - Resolve owners through the `idx_service_requests_owner` unique index.
//!
//! # Invariants
//! - `u64` owners are stored bit-for-bit in `INTEGER` columns.
//! - Primary keys are limited to `0..=i64::MAX`; beyond that storage is exhausted.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::migrations::ensure_schema_ready;
use crate::model::request::{Owner, PrimaryKey, ServiceRequest};
use crate::repo::request_repo::{RepoError, RepoResult, RequestRepository};
use log::warn;
use rusqlite::{ffi, params, Connection, ErrorCode, OptionalExtension, Row};

const REQUEST_SELECT_SQL: &str = "SELECT
    prim_key,
    owner,
    title,
    description,
    time,
    last_updated
FROM service_requests";

/// Request repository over a migrated SQLite connection.
pub struct SqliteRequestRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRequestRepository<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    ///
    /// # Errors
    /// - `RepoError::Db(DbError::SchemaNotReady)` for an unmigrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn exists(&self, sql: &str, value: i64) -> RepoResult<bool> {
        let found: i64 = self.conn.query_row(sql, [value], |row| row.get(0))?;
        Ok(found == 1)
    }
}

impl RequestRepository for SqliteRequestRepository<'_> {
    fn available_primary_key(&self) -> RepoResult<PrimaryKey> {
        let max: Option<i64> =
            self.conn
                .query_row("SELECT MAX(prim_key) FROM service_requests;", [], |row| {
                    row.get(0)
                })?;
        match max {
            None => Ok(0),
            Some(i64::MAX) => Err(RepoError::StorageExhausted),
            Some(value) => Ok(key_from_db(value)? + 1),
        }
    }

    fn get(&self, prim_key: PrimaryKey) -> RepoResult<Option<ServiceRequest>> {
        let Ok(key) = i64::try_from(prim_key) else {
            return Ok(None);
        };
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{REQUEST_SELECT_SQL} WHERE prim_key = ?1;"))?;
        let row = stmt.query_row([key], parse_request_row).optional()?;
        row.transpose()
    }

    fn find_by_owner(&self, owner: Owner) -> RepoResult<Option<ServiceRequest>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{REQUEST_SELECT_SQL} WHERE owner = ?1;"))?;
        let row = stmt
            .query_row([owner_to_db(owner)], parse_request_row)
            .optional()?;
        row.transpose()
    }

    fn insert(&mut self, request: &ServiceRequest) -> RepoResult<()> {
        let key = i64::try_from(request.prim_key).map_err(|_| RepoError::StorageExhausted)?;
        if self.exists(
            "SELECT EXISTS(SELECT 1 FROM service_requests WHERE prim_key = ?1);",
            key,
        )? {
            return Err(RepoError::DuplicateKey(request.prim_key));
        }
        if self.exists(
            "SELECT EXISTS(SELECT 1 FROM service_requests WHERE owner = ?1);",
            owner_to_db(request.owner),
        )? {
            return Err(RepoError::DuplicateOwner(request.owner));
        }

        let inserted = self.conn.execute(
            "INSERT INTO service_requests (
                prim_key,
                owner,
                title,
                description,
                time,
                last_updated
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                key,
                owner_to_db(request.owner),
                request.title.as_str(),
                request.description.as_str(),
                request.time.as_str(),
                timestamp_to_db(request.last_updated),
            ],
        );
        inserted.map_err(|err| insert_conflict(err, request))?;
        Ok(())
    }

    fn update(&mut self, request: &ServiceRequest) -> RepoResult<()> {
        let key = i64::try_from(request.prim_key)
            .map_err(|_| RepoError::NotFound(request.prim_key))?;
        let changed = self.conn.execute(
            "UPDATE service_requests
             SET
                title = ?3,
                description = ?4,
                time = ?5,
                last_updated = ?6
             WHERE prim_key = ?1
               AND owner = ?2;",
            params![
                key,
                owner_to_db(request.owner),
                request.title.as_str(),
                request.description.as_str(),
                request.time.as_str(),
                timestamp_to_db(request.last_updated),
            ],
        )?;

        if changed == 0 {
            return match self.get(request.prim_key)? {
                Some(_) => Err(RepoError::InvalidData(format!(
                    "owner of prim_key={} is immutable",
                    request.prim_key
                ))),
                None => Err(RepoError::NotFound(request.prim_key)),
            };
        }
        Ok(())
    }

    fn list(&self) -> RepoResult<Vec<ServiceRequest>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REQUEST_SELECT_SQL} ORDER BY prim_key ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut requests = Vec::new();
        while let Some(row) = rows.next()? {
            requests.push(parse_request_row(row)??);
        }
        Ok(requests)
    }

    fn len(&self) -> RepoResult<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM service_requests;", [], |row| {
                    row.get(0)
                })?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("invalid row count {count}")))
    }

    fn atomically<T, F>(&mut self, op: F) -> RepoResult<T>
    where
        F: FnOnce(&mut Self) -> RepoResult<T>,
    {
        // Already inside a caller-owned transaction: join it.
        if !self.conn.is_autocommit() {
            return op(self);
        }

        self.conn.execute_batch("BEGIN IMMEDIATE;")?;
        match op(self) {
            Ok(value) => {
                if let Err(err) = self.conn.execute_batch("COMMIT;") {
                    rollback(self.conn);
                    return Err(err.into());
                }
                Ok(value)
            }
            Err(err) => {
                rollback(self.conn);
                Err(err)
            }
        }
    }
}

/// Maps unique-constraint failures of an INSERT onto the conflicting key.
fn insert_conflict(err: rusqlite::Error, request: &ServiceRequest) -> RepoError {
    if let rusqlite::Error::SqliteFailure(inner, message) = &err {
        if inner.code == ErrorCode::ConstraintViolation {
            let on_owner = message
                .as_deref()
                .is_some_and(|text| text.contains("service_requests.owner"));
            match inner.extended_code {
                ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return RepoError::DuplicateKey(request.prim_key)
                }
                ffi::SQLITE_CONSTRAINT_UNIQUE if on_owner => {
                    return RepoError::DuplicateOwner(request.owner)
                }
                _ => {}
            }
        }
    }
    err.into()
}

fn rollback(conn: &Connection) {
    if let Err(err) = conn.execute_batch("ROLLBACK;") {
        warn!("event=tx_rollback module=repo status=error error={err}");
    }
}

/// Row mapper returning a nested result so column decoding errors stay
/// `rusqlite` errors while domain decoding errors become `RepoError`.
fn parse_request_row(row: &Row<'_>) -> rusqlite::Result<RepoResult<ServiceRequest>> {
    let prim_key: i64 = row.get("prim_key")?;
    let owner: i64 = row.get("owner")?;
    let last_updated: i64 = row.get("last_updated")?;
    let title: String = row.get("title")?;
    let description: String = row.get("description")?;
    let time: String = row.get("time")?;

    Ok(key_from_db(prim_key).map(|prim_key| ServiceRequest {
        prim_key,
        owner: owner_from_db(owner),
        title,
        description,
        time,
        last_updated: timestamp_from_db(last_updated),
    }))
}

fn key_from_db(value: i64) -> RepoResult<PrimaryKey> {
    u64::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid prim_key `{value}` in service_requests.prim_key"
        ))
    })
}

fn owner_to_db(owner: Owner) -> i64 {
    owner.value() as i64
}

fn owner_from_db(value: i64) -> Owner {
    Owner(value as u64)
}

fn timestamp_to_db(value: u64) -> i64 {
    value as i64
}

fn timestamp_from_db(value: i64) -> u64 {
    value as u64
}
