//! Error types for Waymark
//!
//! Two tiers:
//! - hard errors, returned from registration and from queries that demand a
//!   well-formed structure (sorted retrieval, acyclicity)
//! - soft diagnostics, collected by [`crate::diagnostics::Diagnostics`] and
//!   never returned as errors

use waymark_registry::{DeclId, RegistryError};
use waymark_validate::{DetourError, GraphError, OrderingError, ValidationError};

/// Main Waymark error type
#[derive(Debug, thiserror::Error)]
pub enum WaymarkError {
    /// Keyed store rejected the entry
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Structural validation failed
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Invalid step declaration
    #[error("invalid step: {0}")]
    Step(#[from] StepError),

    /// An inline declaration has no enclosing declaration to inherit from
    #[error("{kind} declared inline at '{owner}' has no enclosing declaration")]
    NoEnclosingDeclaration {
        /// Registry kind
        kind: &'static str,
        /// Owning declaration
        owner: DeclId,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Report serialization failed
    #[error("report serialization failed: {0}")]
    Report(#[from] serde_json::Error),
}

impl WaymarkError {
    /// Short classification used in logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Registry(_) => "registry",
            Self::Validation(ValidationError::Graph(_)) => "graph",
            Self::Validation(ValidationError::Ordering(_)) => "ordering",
            Self::Validation(ValidationError::Detour(_)) => "detour",
            Self::Step(_) | Self::NoEnclosingDeclaration { .. } => "declaration",
            Self::Config(_) => "config",
            Self::Report(_) => "report",
        }
    }

    /// Check if a duplicate key or owner was rejected
    #[inline]
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Registry(err) if err.is_duplicate())
    }

    /// Check if a dependency cycle was detected
    #[inline]
    #[must_use]
    pub fn is_cycle(&self) -> bool {
        matches!(
            self,
            Self::Validation(ValidationError::Graph(GraphError::CycleDetected { .. }))
        )
    }

    /// Check if the error was raised while registering a declaration
    ///
    /// Registration errors leave the registry unchanged.
    #[must_use]
    pub fn is_registration_error(&self) -> bool {
        matches!(
            self,
            Self::Registry(_)
                | Self::Step(_)
                | Self::NoEnclosingDeclaration { .. }
                | Self::Validation(ValidationError::Detour(_))
        ) || self.is_cycle()
    }
}

impl From<GraphError> for WaymarkError {
    fn from(err: GraphError) -> Self {
        Self::Validation(err.into())
    }
}

impl From<OrderingError> for WaymarkError {
    fn from(err: OrderingError) -> Self {
        Self::Validation(err.into())
    }
}

impl From<DetourError> for WaymarkError {
    fn from(err: DetourError) -> Self {
        Self::Validation(err.into())
    }
}

/// Step declaration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    /// Inline steps must declare an order
    #[error("inline step '{name}' has no order")]
    MissingOrder {
        /// Step name
        name: String,
    },

    /// Orders are positive
    #[error("step '{name}' has order 0; orders start at 1")]
    ZeroOrder {
        /// Step name
        name: String,
    },
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A field holds an unusable value
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// Why it is rejected
        reason: String,
    },

    /// TOML text could not be parsed
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result alias for Waymark operations
pub type Result<T, E = WaymarkError> = std::result::Result<T, E>;
