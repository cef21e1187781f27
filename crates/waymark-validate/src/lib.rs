//! Waymark Validate
//!
//! Structural validators over declared metadata.
//!
//! # Overview
//!
//! - **DependencyGraph**: cycle detection and dependency order for logic units
//! - **Ordering**: step ordering reports and sorted retrieval
//! - **Detours**: eager journey detour checks and the on-demand audit
//!
//! Validators are pure: they take plain values and never touch a registry.
//!
//! # Example
//!
//! ```rust
//! use waymark_validate::{validate_ordering, DependencyGraph, OrderSlot};
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_node("checkout", ["pricing"]);
//! graph.add_node("pricing", ["checkout"]);
//! assert!(graph.has_cycle("checkout"));
//!
//! let report = validate_ordering(
//!     "Validate",
//!     &[OrderSlot::new("scan", Some(1)), OrderSlot::new("weigh", Some(3))],
//! );
//! assert!(report.is_valid());
//! assert!(!report.is_clean());
//! ```

#![warn(missing_docs)]

pub mod detour;
pub mod error;
pub mod graph;
pub mod ordering;

// Re-exports
pub use detour::{
    audit_detours, validate_detours, Detour, DetourAudit, DetourFinding, MilestonePoint,
    RejoinPoint, SubJourney,
};
pub use error::{DetourError, GraphError, OrderingError, ValidationError};
pub use graph::DependencyGraph;
pub use ordering::{
    sort_by_order, validate_ordering, OrderSlot, OrderingIssue, OrderingReport, Severity,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for validation
    pub use crate::{
        DependencyGraph, Detour, DetourError, GraphError, MilestonePoint, OrderSlot,
        OrderingError, OrderingIssue, RejoinPoint, Severity, ValidationError,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
