//! Deferred inheritance state
//!
//! Inline declarations often reference a parent whose metadata is not
//! registered yet. [`Inheritance`] keeps the inherited fields unavailable
//! until the resolver has pulled them from the parent's registry.

use crate::decl::Reference;
use serde::Serialize;
use std::fmt;

/// Inherited fields of a registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Inheritance<T> {
    /// Waiting for the parent to be registered and queried
    Pending {
        /// The parent declaration to inherit from
        parent: Reference,
    },

    /// Inherited fields are known
    Resolved(T),
}

impl<T> Inheritance<T> {
    /// Pending on a parent
    #[inline]
    #[must_use]
    pub fn pending(parent: impl Into<Reference>) -> Self {
        Self::Pending {
            parent: parent.into(),
        }
    }

    /// Resolved fields, if any
    #[inline]
    #[must_use]
    pub fn resolved(&self) -> Option<&T> {
        match self {
            Self::Resolved(value) => Some(value),
            Self::Pending { .. } => None,
        }
    }

    /// Parent still to be resolved, if any
    #[inline]
    #[must_use]
    pub fn pending_parent(&self) -> Option<&Reference> {
        match self {
            Self::Pending { parent } => Some(parent),
            Self::Resolved(_) => None,
        }
    }

    /// Check whether inherited fields are known
    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Why a pending entry could not be resolved this pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Unresolved {
    /// The parent is not registered yet
    ParentMissing,

    /// The parent is registered but itself still pending
    ParentPending,

    /// The parent is resolved but has no value to pass on
    NothingToInherit,

    /// Completing the entry would collide with an existing key
    KeyConflict,
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ParentMissing => "parent not registered",
            Self::ParentPending => "parent still pending resolution",
            Self::NothingToInherit => "parent has nothing to inherit",
            Self::KeyConflict => "resolved key already registered",
        };
        f.write_str(text)
    }
}

/// A pending entry left unresolved by a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// Key the entry is currently registered under
    pub key: String,

    /// Parent that could not be used
    pub parent: Reference,

    /// Reason
    pub reason: Unresolved,
}

/// Outcome of one resolution pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Keys resolved this pass (final keys)
    pub resolved: Vec<String>,

    /// Entries left pending
    pub skipped: Vec<Skipped>,
}

impl ResolveReport {
    /// Check whether the pass did nothing
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.resolved.is_empty() && self.skipped.is_empty()
    }
}
