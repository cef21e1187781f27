//! Waymark Core
//!
//! Per-kind registries for declared product metadata: personas, journeys,
//! milestones, steps, expectations, behaviors, tests, logic units and domain
//! events.
//!
//! # Overview
//!
//! - **RegistrySet**: one registry per kind, wired together, created per program
//! - **Lazy inheritance**: steps, behaviors and tests nested in a parent that is
//!   not registered yet stay pending and complete on the next query
//! - **Validation**: step ordering, logic cycles and journey detours
//! - **Diagnostics**: soft problems collected and mirrored to `tracing`
//!
//! # Example
//!
//! ```rust
//! use waymark_core::prelude::*;
//!
//! let set = RegistrySet::default();
//! let cart = DeclId::new(["specs", "CartTotals"]);
//!
//! // Nested behavior declared before its expectation
//! set.register_behavior(BehaviorDecl::inline("sums_items"), cart.child("sums_items"))
//!     .unwrap();
//! set.register_test(TestDecl::inline("adds_two"), cart.child("sums_items").child("adds_two"))
//!     .unwrap();
//!
//! set.register_expectation(Expectation::new("EXP-42"), cart).unwrap();
//!
//! let tests = set.tests().by_expectation("EXP-42");
//! assert_eq!(tests[0].key, "EXP-42-TEST-001");
//! assert_eq!(tests[0].metadata.link.resolved().unwrap().behavior.as_deref(), Some("sums_items"));
//! ```

#![warn(missing_docs)]

pub mod behavior;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod expectation;
pub mod journey;
pub mod logging;
pub mod logic;
pub mod milestone;
pub mod persona;
pub mod placement;
pub mod registry_set;
pub mod step;
pub mod test_case;

// Re-exports
pub use behavior::{Behavior, BehaviorDecl, BehaviorRegistry};
pub use config::RegistryConfig;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{ConfigError, Result, StepError, WaymarkError};
pub use event::{DomainEvent, EventHandler, EventRegistry, HandlerDecl};
pub use expectation::{Expectation, ExpectationRegistry};
pub use journey::{DetourDecl, Journey, JourneyDecl, JourneyRegistry};
pub use logging::{init_json_tracing, init_tracing};
pub use logic::{Composition, Logic, LogicDecl, LogicRegistry};
pub use milestone::{Milestone, MilestoneDecl, MilestoneRegistry};
pub use persona::{Persona, PersonaRegistry};
pub use placement::Placement;
pub use registry_set::{RegistrySet, RegistrySetStats};
pub use step::{Step, StepDecl, StepRegistry};
pub use test_case::{TestCase, TestDecl, TestLink, TestRegistry, TestTarget};

pub use waymark_registry::{DeclId, Entry, Reference, RegistryStats, Upsert};
pub use waymark_validate::{
    Detour, DetourAudit, DetourFinding, MilestonePoint, RejoinPoint, Severity, SubJourney,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for declaring and querying metadata
    pub use crate::{
        BehaviorDecl, DeclId, Diagnostic, DomainEvent, Entry, Expectation, HandlerDecl,
        JourneyDecl, LogicDecl, MilestoneDecl, Persona, Placement, Reference, RegistryConfig,
        RegistrySet, StepDecl, TestDecl, WaymarkError,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
