//! Declaration identities and references
//!
//! Provides [`DeclId`], the opaque handle a registry entry is owned by, and
//! [`Reference`], the two ways one declaration can point at another.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Path separator used by [`DeclId`]'s display form
pub const DECL_SEPARATOR: &str = "::";

/// Opaque identity of a program declaration
///
/// A declaration is addressed by its logical path, e.g.
/// `["shop", "Checkout", "validate_cart"]` for a method declared on a class.
/// An inline (method-level) declaration is the [`child`](Self::child) of the
/// declaration it is nested in, which is how inline metadata finds its parent.
///
/// # Example
/// ```
/// use waymark_registry::DeclId;
///
/// let class = DeclId::new(["shop", "Checkout"]);
/// let method = class.child("validate_cart");
///
/// assert_eq!(method.name(), "validate_cart");
/// assert_eq!(method.parent(), Some(class));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeclId {
    /// Logical path: `["module", "Type", "member"]`
    path: Vec<String>,
}

impl DeclId {
    /// Create a declaration identity from path segments
    #[inline]
    #[must_use]
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Path segments
    #[inline]
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Number of path segments
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Declared name (last segment), empty for an empty path
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.last().map_or("", String::as_str)
    }

    /// Enclosing declaration, if any
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.path.len() <= 1 {
            None
        } else {
            Some(Self {
                path: self.path[..self.path.len() - 1].to_vec(),
            })
        }
    }

    /// Nested declaration
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut path = self.path.clone();
        path.push(segment.into());
        Self { path }
    }

    /// Check whether this declaration encloses another
    #[must_use]
    pub fn is_ancestor_of(&self, other: &DeclId) -> bool {
        if self.path.len() >= other.path.len() {
            return false;
        }
        self.path == other.path[..self.path.len()]
    }

    /// Module or namespace (first segment)
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.path.first().map(String::as_str)
    }
}

impl Display for DeclId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path.join(DECL_SEPARATOR))
    }
}

impl FromStr for DeclId {
    type Err = DeclIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(DeclIdError::EmptyPath);
        }

        let path: Vec<String> = s.split(DECL_SEPARATOR).map(str::to_string).collect();
        if path.iter().any(String::is_empty) {
            return Err(DeclIdError::EmptySegment(s.to_string()));
        }

        Ok(Self { path })
    }
}

/// Errors for parsing a [`DeclId`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeclIdError {
    /// Empty path
    #[error("declaration path cannot be empty")]
    EmptyPath,

    /// A `::`-separated segment is empty
    #[error("declaration path has an empty segment: {0}")]
    EmptySegment(String),
}

/// A pointer from one declaration to another
///
/// Callers may point at a declaration directly or name it by string; both
/// forms map to the same canonical key through the
/// [`IdentityResolver`](crate::IdentityResolver).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reference {
    /// Direct declaration identity
    Identity(DeclId),

    /// Plain string name (or registry key)
    Name(String),
}

impl Reference {
    /// Reference by name
    #[inline]
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Declared name this reference would fall back to
    #[inline]
    #[must_use]
    pub fn fallback_name(&self) -> &str {
        match self {
            Self::Identity(decl) => decl.name(),
            Self::Name(name) => name,
        }
    }

    /// Identity, if this is a direct reference
    #[inline]
    #[must_use]
    pub fn as_identity(&self) -> Option<&DeclId> {
        match self {
            Self::Identity(decl) => Some(decl),
            Self::Name(_) => None,
        }
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity(decl) => write!(f, "<{decl}>"),
            Self::Name(name) => write!(f, "\"{name}\""),
        }
    }
}

impl From<DeclId> for Reference {
    fn from(value: DeclId) -> Self {
        Self::Identity(value)
    }
}

impl From<&DeclId> for Reference {
    fn from(value: &DeclId) -> Self {
        Self::Identity(value.clone())
    }
}

impl From<&str> for Reference {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<String> for Reference {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}
