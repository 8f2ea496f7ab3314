//! Service request record model.
//!
//! # Responsibility
//! - Define `ServiceRequest`, the single row type of the request table.
//! - Define `RequestFields`, the caller-supplied text payload.
//!
//! # Invariants
//! - `prim_key` is assigned by storage and never reassigned on update.
//! - `last_updated` is set by the store, never by the caller payload.
//! - Text fields are stored as given; no length or content validation.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-assigned record identifier, strictly increasing per table.
pub type PrimaryKey = u64;

/// Opaque 64-bit account handle identifying the request owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Owner(pub u64);

impl Owner {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for Owner {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for Owner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-supplied texts for one submit-or-update call.
///
/// Each field maps 1:1 onto the stored field with the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFields {
    pub title: String,
    pub description: String,
    /// Free-form time label, unrelated to `ServiceRequest::last_updated`.
    pub time: String,
}

impl RequestFields {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            time: time.into(),
        }
    }

    /// Builds a payload from one free-form request text.
    ///
    /// The text becomes `description`; `title` and `time` stay empty.
    pub fn from_single_text(text: impl Into<String>) -> Self {
        Self {
            description: text.into(),
            ..Self::default()
        }
    }
}

/// Latest service request of one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRequest {
    /// Table primary key.
    pub prim_key: PrimaryKey,
    /// Secondary key; unique across the table.
    pub owner: Owner,
    pub title: String,
    pub description: String,
    pub time: String,
    /// Unix seconds of the most recent insert or update.
    pub last_updated: u64,
}

impl ServiceRequest {
    /// Creates a fresh row for `owner` from the submitted payload.
    pub fn new(prim_key: PrimaryKey, owner: Owner, fields: RequestFields, now: u64) -> Self {
        Self {
            prim_key,
            owner,
            title: fields.title,
            description: fields.description,
            time: fields.time,
            last_updated: now,
        }
    }

    /// Overwrites the mutable fields in place.
    ///
    /// `last_updated` never moves backwards; an earlier `now` keeps the
    /// current value. Returns `false` when that clamp was applied.
    pub fn apply(&mut self, fields: RequestFields, now: u64) -> bool {
        self.title = fields.title;
        self.description = fields.description;
        self.time = fields.time;
        if now >= self.last_updated {
            self.last_updated = now;
            true
        } else {
            false
        }
    }
}
