//! Persistence contracts and backends for the request table.
//!
//! # Responsibility
//! - Define the table + secondary-index contract the store runs against.
//! - Provide an in-memory arena backend and a SQLite backend.
//!
//! # Invariants
//! - Every backend keeps the owner index in lockstep with the table.
//! - Writes either fully apply or leave the table unchanged.

pub mod memory_repo;
pub mod request_repo;
pub mod sqlite_repo;
