//! Registry error types

use crate::decl::DeclId;

/// Errors raised by keyed registry operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Primary key already registered
    #[error("duplicate {kind} key: {key}")]
    DuplicateKey {
        /// Registry kind
        kind: &'static str,
        /// Conflicting key
        key: String,
    },

    /// Declaration already owns an entry in this registry
    #[error("declaration {owner} already registered a {kind}")]
    DuplicateOwner {
        /// Registry kind
        kind: &'static str,
        /// Declaration registered twice
        owner: DeclId,
    },

    /// No entry under the given key
    #[error("{kind} not found: {key}")]
    NotFound {
        /// Registry kind
        kind: &'static str,
        /// Missing key
        key: String,
    },
}

impl RegistryError {
    /// Registry kind the error was raised by
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateKey { kind, .. }
            | Self::DuplicateOwner { kind, .. }
            | Self::NotFound { kind, .. } => kind,
        }
    }

    /// Check if the error is a uniqueness violation
    #[inline]
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. } | Self::DuplicateOwner { .. })
    }
}
