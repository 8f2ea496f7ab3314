//! Core of the per-owner service request store.
//! This crate owns the one-request-per-owner invariant and the upsert that keeps it.

pub mod auth;
pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use auth::{ActionAuth, AuthError, AuthorizedOwner};
pub use clock::{Clock, ManualClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::request::{Owner, PrimaryKey, RequestFields, ServiceRequest};
pub use repo::memory_repo::InMemoryRequestRepository;
pub use repo::request_repo::{RepoError, RepoResult, RequestRepository};
pub use repo::sqlite_repo::SqliteRequestRepository;
pub use service::record_store::{
    RecordStore, StoreError, StoreResult, UpsertOutcome, Upserted,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
