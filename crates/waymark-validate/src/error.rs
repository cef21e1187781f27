//! Validation error types

use crate::ordering::OrderingIssue;

/// Errors from any structural validator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Dependency graph violation
    #[error("graph: {0}")]
    Graph(#[from] GraphError),

    /// Step ordering violation
    #[error("ordering: {0}")]
    Ordering(#[from] OrderingError),

    /// Journey detour violation
    #[error("detour: {0}")]
    Detour(#[from] DetourError),
}

/// Dependency graph errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A dependency cycle exists; `path` starts and ends on the same node
    #[error("cycle detected: {}", path.join(" -> "))]
    CycleDetected {
        /// Nodes on the cycle
        path: Vec<String>,
    },
}

/// Step ordering errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderingError {
    /// Entries without an order cannot be sorted
    #[error("steps without order under '{scope}': {names:?}")]
    MissingOrder {
        /// Parent scope
        scope: String,
        /// Entries lacking an order
        names: Vec<String>,
    },

    /// The scope's ordering has issues the caller treats as fatal
    #[error("ill-formed step ordering under '{scope}': {issues:?}")]
    IllFormed {
        /// Parent scope
        scope: String,
        /// Offending issues
        issues: Vec<OrderingIssue>,
    },
}

/// Journey detour errors raised at journey registration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DetourError {
    /// Order is NaN or infinite
    #[error("journey '{journey}': detour '{detour}' has non-finite order {order}")]
    NonFiniteOrder {
        /// Parent journey
        journey: String,
        /// Detour sub-journey
        detour: String,
        /// Offending order
        order: f64,
    },

    /// Detour orders must sit between milestones
    #[error("journey '{journey}': detour '{detour}' order {order} must have a fractional part")]
    IntegerOrder {
        /// Parent journey
        journey: String,
        /// Detour sub-journey
        detour: String,
        /// Offending order
        order: f64,
    },

    /// Two detours share an order
    #[error("journey '{journey}': detours '{first}' and '{second}' share order {order}")]
    DuplicateOrder {
        /// Parent journey
        journey: String,
        /// First detour
        first: String,
        /// Second detour
        second: String,
        /// Shared order
        order: f64,
    },

    /// `triggered_after` names no milestone
    #[error("journey '{journey}': detour '{detour}' triggered after unknown milestone '{milestone}'")]
    UnknownTrigger {
        /// Parent journey
        journey: String,
        /// Detour sub-journey
        detour: String,
        /// Unknown milestone name
        milestone: String,
    },

    /// Numeric `rejoins_at` matches no milestone order
    #[error("journey '{journey}': detour '{detour}' rejoins at unknown milestone order {order}")]
    UnknownRejoinOrder {
        /// Parent journey
        journey: String,
        /// Detour sub-journey
        detour: String,
        /// Unknown order
        order: f64,
    },

    /// Named `rejoins_at` matches no milestone name
    #[error("journey '{journey}': detour '{detour}' rejoins at unknown milestone '{milestone}'")]
    UnknownRejoinMilestone {
        /// Parent journey
        journey: String,
        /// Detour sub-journey
        detour: String,
        /// Unknown milestone name
        milestone: String,
    },

    /// Detour floor is not adjacent to any milestone order
    #[error("journey '{journey}': detour '{detour}' order {order} is not between two milestones")]
    NotBetweenMilestones {
        /// Parent journey
        journey: String,
        /// Detour sub-journey
        detour: String,
        /// Offending order
        order: f64,
    },
}

impl DetourError {
    /// Journey the error was raised for
    #[must_use]
    pub fn journey(&self) -> &str {
        match self {
            Self::NonFiniteOrder { journey, .. }
            | Self::IntegerOrder { journey, .. }
            | Self::DuplicateOrder { journey, .. }
            | Self::UnknownTrigger { journey, .. }
            | Self::UnknownRejoinOrder { journey, .. }
            | Self::UnknownRejoinMilestone { journey, .. }
            | Self::NotBetweenMilestones { journey, .. } => journey,
        }
    }
}
