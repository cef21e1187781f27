//! Where a child declaration sits relative to its parent

use crate::error::{Result, WaymarkError};
use waymark_registry::{DeclId, Reference};

/// Parent attachment of a step or behavior
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Placement {
    /// Nested in its parent; the parent is the owner's enclosing declaration
    Inline,

    /// Attached to an explicitly referenced parent
    Parent(Reference),

    /// Not attached to any parent
    #[default]
    Detached,
}

impl Placement {
    /// Check if the declaration is nested in its parent
    #[inline]
    #[must_use]
    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline)
    }

    /// The parent reference for a declaration owned by `owner`
    pub(crate) fn parent_reference(
        &self,
        kind: &'static str,
        owner: &DeclId,
    ) -> Result<Option<Reference>> {
        match self {
            Self::Inline => owner
                .parent()
                .map(|parent| Some(Reference::Identity(parent)))
                .ok_or_else(|| WaymarkError::NoEnclosingDeclaration {
                    kind,
                    owner: owner.clone(),
                }),
            Self::Parent(reference) => Ok(Some(reference.clone())),
            Self::Detached => Ok(None),
        }
    }
}
