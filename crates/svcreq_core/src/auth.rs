//! Authorization capability for mutating store commands.
//!
//! # Responsibility
//! - Carry the set of owners that authorized the current action.
//! - Gate mutations behind an `AuthorizedOwner` capability value.
//!
//! # Invariants
//! - `AuthorizedOwner` is only constructed by `ActionAuth::require_auth`.
//! - Signature verification happens in the host before `ActionAuth` is built;
//!   this module performs no cryptography.

use crate::model::request::Owner;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Signers the host authenticated for one action invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionAuth {
    signers: BTreeSet<Owner>,
}

impl ActionAuth {
    /// Action with no authenticated signer.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Action authenticated by exactly one owner.
    pub fn signed_by(owner: Owner) -> Self {
        Self::anonymous().with_signer(owner)
    }

    pub fn with_signer(mut self, owner: Owner) -> Self {
        self.signers.insert(owner);
        self
    }

    pub fn signers(&self) -> impl Iterator<Item = Owner> + '_ {
        self.signers.iter().copied()
    }

    pub fn has_signer(&self, owner: Owner) -> bool {
        self.signers.contains(&owner)
    }

    /// Asserts that `owner` signed this action.
    ///
    /// # Errors
    /// - `AuthError::NotAuthorized` when `owner` is not among the signers.
    pub fn require_auth(&self, owner: Owner) -> Result<AuthorizedOwner, AuthError> {
        if self.has_signer(owner) {
            Ok(AuthorizedOwner { owner })
        } else {
            Err(AuthError::NotAuthorized(owner))
        }
    }
}

/// Proof that an owner authorized the current action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizedOwner {
    owner: Owner,
}

impl AuthorizedOwner {
    pub fn owner(self) -> Owner {
        self.owner
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    NotAuthorized(Owner),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthorized(owner) => write!(f, "missing authority of owner {owner}"),
        }
    }
}

impl Error for AuthError {}
