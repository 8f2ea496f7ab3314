//! Domain model for per-owner service requests.
//!
//! # Responsibility
//! - Define the record shape persisted by every storage backend.
//! - Define the caller payload accepted by submit-or-update.
//!
//! # Invariants
//! - A record's `prim_key` and `owner` never change after creation.
//! - At most one record exists per `Owner`.

pub mod request;
