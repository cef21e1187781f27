//! The set of registries for one program
//!
//! [`RegistrySet`] owns one registry per metadata kind and wires the
//! read-only links between them (journeys read personas, tests read
//! behaviors, ...). It replaces process-wide registries: create one per
//! program or per test.

use crate::behavior::{BehaviorDecl, BehaviorRegistry};
use crate::config::RegistryConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::Result;
use crate::event::{DomainEvent, EventRegistry, HandlerDecl};
use crate::expectation::{Expectation, ExpectationRegistry};
use crate::journey::{JourneyDecl, JourneyRegistry};
use crate::logic::{LogicDecl, LogicRegistry};
use crate::milestone::{MilestoneDecl, MilestoneRegistry};
use crate::persona::{Persona, PersonaRegistry};
use crate::step::{StepDecl, StepRegistry};
use crate::test_case::{TestDecl, TestRegistry};
use serde::Serialize;
use std::sync::Arc;
use waymark_registry::{DeclId, RegistryStats, Upsert};

/// Entry counts of every registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrySetStats {
    /// Personas
    pub personas: RegistryStats,
    /// Journeys
    pub journeys: RegistryStats,
    /// Milestones
    pub milestones: RegistryStats,
    /// Steps
    pub steps: RegistryStats,
    /// Expectations
    pub expectations: RegistryStats,
    /// Behaviors
    pub behaviors: RegistryStats,
    /// Tests
    pub tests: RegistryStats,
    /// Logic units
    pub logic: RegistryStats,
    /// Domain events
    pub events: RegistryStats,
    /// Event handlers
    pub handlers: RegistryStats,
}

impl RegistrySetStats {
    /// Entries across every registry
    #[must_use]
    pub fn total(&self) -> usize {
        self.all().iter().map(|s| s.total).sum()
    }

    /// Entries still pending across every registry
    #[must_use]
    pub fn pending(&self) -> usize {
        self.all().iter().map(|s| s.pending).sum()
    }

    fn all(&self) -> [&RegistryStats; 10] {
        [
            &self.personas,
            &self.journeys,
            &self.milestones,
            &self.steps,
            &self.expectations,
            &self.behaviors,
            &self.tests,
            &self.logic,
            &self.events,
            &self.handlers,
        ]
    }
}

#[derive(Serialize)]
struct Report<'a> {
    version: &'static str,
    stats: &'a RegistrySetStats,
    diagnostics: &'a [Diagnostic],
}

/// One registry per metadata kind
///
/// # Example
/// ```
/// use waymark_core::prelude::*;
///
/// let set = RegistrySet::new(RegistryConfig::default());
/// let cart = DeclId::new(["specs", "CartTotals"]);
///
/// set.register_expectation(Expectation::new("EXP-001"), cart.clone()).unwrap();
/// let id = set
///     .register_test(TestDecl::for_expectation("adds_two", "EXP-001"), cart.child("adds_two"))
///     .unwrap();
///
/// assert_eq!(id, "EXP-001-TEST-001");
/// ```
#[derive(Debug)]
pub struct RegistrySet {
    config: Arc<RegistryConfig>,
    diagnostics: Arc<Diagnostics>,
    personas: Arc<PersonaRegistry>,
    journeys: Arc<JourneyRegistry>,
    milestones: Arc<MilestoneRegistry>,
    steps: Arc<StepRegistry>,
    expectations: Arc<ExpectationRegistry>,
    behaviors: Arc<BehaviorRegistry>,
    tests: Arc<TestRegistry>,
    logic: Arc<LogicRegistry>,
    events: Arc<EventRegistry>,
}

impl RegistrySet {
    /// Create empty registries
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        let config = Arc::new(config);
        let diagnostics = Arc::new(Diagnostics::new(config.max_diagnostics));

        let personas = Arc::new(PersonaRegistry::new());
        let journeys = Arc::new(JourneyRegistry::new(personas.clone(), diagnostics.clone()));
        let milestones = Arc::new(MilestoneRegistry::new(journeys.clone()));
        let steps = Arc::new(StepRegistry::new(
            milestones.clone(),
            config.clone(),
            diagnostics.clone(),
        ));
        let expectations = Arc::new(ExpectationRegistry::new());
        let behaviors = Arc::new(BehaviorRegistry::new(
            expectations.clone(),
            diagnostics.clone(),
        ));
        let tests = Arc::new(TestRegistry::new(
            behaviors.clone(),
            config.clone(),
            diagnostics.clone(),
        ));
        let logic = Arc::new(LogicRegistry::new(config.clone()));
        let events = Arc::new(EventRegistry::new());

        tracing::debug!(?config, "registry set created");

        Self {
            config,
            diagnostics,
            personas,
            journeys,
            milestones,
            steps,
            expectations,
            behaviors,
            tests,
            logic,
            events,
        }
    }

    /// Create from TOML configuration text
    ///
    /// # Errors
    /// Returns a configuration error if the text is malformed or invalid.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(Self::new(RegistryConfig::from_toml_str(text)?))
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Persona registry
    #[inline]
    #[must_use]
    pub fn personas(&self) -> &PersonaRegistry {
        &self.personas
    }

    /// Journey registry
    #[inline]
    #[must_use]
    pub fn journeys(&self) -> &JourneyRegistry {
        &self.journeys
    }

    /// Milestone registry
    #[inline]
    #[must_use]
    pub fn milestones(&self) -> &MilestoneRegistry {
        &self.milestones
    }

    /// Step registry
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &StepRegistry {
        &self.steps
    }

    /// Expectation registry
    #[inline]
    #[must_use]
    pub fn expectations(&self) -> &ExpectationRegistry {
        &self.expectations
    }

    /// Behavior registry
    #[inline]
    #[must_use]
    pub fn behaviors(&self) -> &BehaviorRegistry {
        &self.behaviors
    }

    /// Test registry
    #[inline]
    #[must_use]
    pub fn tests(&self) -> &TestRegistry {
        &self.tests
    }

    /// Logic registry
    #[inline]
    #[must_use]
    pub fn logic(&self) -> &LogicRegistry {
        &self.logic
    }

    /// Event and handler registry
    #[inline]
    #[must_use]
    pub fn events(&self) -> &EventRegistry {
        &self.events
    }

    /// Register a persona
    ///
    /// # Errors
    /// See [`PersonaRegistry::register`].
    pub fn register_persona(&self, persona: Persona, owner: DeclId) -> Result<String> {
        self.personas.register(persona, owner)
    }

    /// Register a journey
    ///
    /// # Errors
    /// See [`JourneyRegistry::register`].
    pub fn register_journey(&self, decl: JourneyDecl, owner: DeclId) -> Result<String> {
        self.journeys.register(decl, owner)
    }

    /// Register a milestone
    ///
    /// # Errors
    /// See [`MilestoneRegistry::register`].
    pub fn register_milestone(&self, decl: MilestoneDecl, owner: DeclId) -> Result<String> {
        self.milestones.register(decl, owner)
    }

    /// Register a step
    ///
    /// # Errors
    /// See [`StepRegistry::register`].
    pub fn register_step(&self, decl: StepDecl, owner: DeclId) -> Result<String> {
        self.steps.register(decl, owner)
    }

    /// Register an expectation
    ///
    /// # Errors
    /// See [`ExpectationRegistry::register`].
    pub fn register_expectation(&self, expectation: Expectation, owner: DeclId) -> Result<String> {
        self.expectations.register(expectation, owner)
    }

    /// Register a behavior
    ///
    /// # Errors
    /// See [`BehaviorRegistry::register`].
    pub fn register_behavior(&self, decl: BehaviorDecl, owner: DeclId) -> Result<String> {
        self.behaviors.register(decl, owner)
    }

    /// Register a test
    ///
    /// # Errors
    /// See [`TestRegistry::register`].
    pub fn register_test(&self, decl: TestDecl, owner: DeclId) -> Result<String> {
        self.tests.register(decl, owner)
    }

    /// Register a logic unit
    ///
    /// # Errors
    /// See [`LogicRegistry::register`].
    pub fn register_logic(&self, decl: LogicDecl, owner: DeclId) -> Result<String> {
        self.logic.register(decl, owner)
    }

    /// Register a domain event
    ///
    /// # Errors
    /// See [`EventRegistry::register_event`].
    pub fn register_event(&self, event: DomainEvent, owner: DeclId) -> Result<String> {
        self.events.register_event(event, owner)
    }

    /// Register or re-prioritize an event handler
    ///
    /// # Errors
    /// See [`EventRegistry::register_handler`].
    pub fn register_handler(&self, decl: HandlerDecl, owner: DeclId) -> Result<Upsert> {
        self.events.register_handler(decl, owner)
    }

    /// Run lazy resolution for every kind that has it
    ///
    /// Returns the number of entries resolved. Behaviors go before tests, so
    /// a whole expectation → behavior → test chain completes here.
    pub fn resolve_all(&self) -> usize {
        let behaviors = self.behaviors.resolve_pending();
        let tests = self.tests.resolve_pending();
        let steps = self.steps.resolve_pending();
        behaviors.resolved.len() + tests.resolved.len() + steps.resolved.len()
    }

    /// Entry counts of every registry, after resolving
    #[must_use]
    pub fn stats(&self) -> RegistrySetStats {
        self.resolve_all();
        RegistrySetStats {
            personas: self.personas.store().stats(),
            journeys: self.journeys.store().stats(),
            milestones: self.milestones.store().stats(),
            steps: self.steps.store().stats(),
            expectations: self.expectations.store().stats(),
            behaviors: self.behaviors.store().stats(),
            tests: self.tests.store().stats(),
            logic: self.logic.store().stats(),
            events: self.events.event_store().stats(),
            handlers: self.events.handler_store().stats(),
        }
    }

    /// Held diagnostics, oldest first
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.snapshot()
    }

    /// Remove and return held diagnostics
    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    /// Stats and diagnostics as pretty JSON
    ///
    /// # Errors
    /// Returns a report error if serialization fails.
    pub fn report_json(&self) -> Result<String> {
        let stats = self.stats();
        let diagnostics = self.diagnostics.snapshot();
        let report = Report {
            version: crate::VERSION,
            stats: &stats,
            diagnostics: &diagnostics,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }

    /// Empty every registry, reset test counters and drop diagnostics
    pub fn clear(&self) {
        self.personas.store().clear();
        self.journeys.store().clear();
        self.milestones.store().clear();
        self.steps.store().clear();
        self.expectations.store().clear();
        self.behaviors.store().clear();
        self.tests.clear();
        self.logic.store().clear();
        self.events.clear();
        self.diagnostics.clear();
        tracing::debug!("registry set cleared");
    }
}

impl Default for RegistrySet {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;

    #[test]
    fn stats_resolve_first() {
        let set = RegistrySet::default();
        let cart = DeclId::new(["specs", "CartTotals"]);
        set.register_behavior(BehaviorDecl::inline("sums_items"), cart.child("sums_items"))
            .unwrap();

        assert_eq!(set.stats().behaviors.pending, 1);

        set.register_expectation(Expectation::new("EXP-42"), cart).unwrap();
        let stats = set.stats();
        assert_eq!(stats.behaviors.pending, 0);
        assert_eq!(stats.behaviors.resolved, 1);
        assert_eq!(stats.total(), 2);
        assert_eq!(stats.pending(), 0);
    }

    #[test]
    fn diagnostics_collected_across_registries() {
        let set = RegistrySet::default();
        set.register_step(
            StepDecl::inline("scan").at(1),
            DeclId::new(["shop", "Validate", "scan"]),
        )
        .unwrap();
        set.resolve_all();

        let diagnostics = set.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnresolvedParent);
        assert!(set.diagnostics().is_empty());
    }

    #[test]
    fn report_json_contains_stats_and_diagnostics() {
        let set = RegistrySet::default();
        set.register_persona(Persona::new("Shopper"), DeclId::new(["Shopper"]))
            .unwrap();
        set.register_step(
            StepDecl::inline("scan").at(1),
            DeclId::new(["shop", "Validate", "scan"]),
        )
        .unwrap();

        let json: serde_json::Value = serde_json::from_str(&set.report_json().unwrap()).unwrap();
        assert_eq!(json["stats"]["personas"]["total"], 1);
        assert_eq!(json["stats"]["steps"]["pending"], 1);
        assert_eq!(json["diagnostics"][0]["kind"], "unresolved_parent");
    }

    #[test]
    fn clear_empties_everything() {
        let set = RegistrySet::default();
        set.register_persona(Persona::new("Shopper"), DeclId::new(["Shopper"]))
            .unwrap();
        set.register_test(TestDecl::for_expectation("a", "EXP-1"), DeclId::new(["A"]))
            .unwrap();
        set.clear();

        assert_eq!(set.stats().total(), 0);
        let id = set
            .register_test(TestDecl::for_expectation("a", "EXP-1"), DeclId::new(["A"]))
            .unwrap();
        assert_eq!(id, "EXP-1-TEST-001");
    }

    #[test]
    fn from_toml_applies_config() {
        let set = RegistrySet::from_toml_str("test_id_width = 2").unwrap();
        let id = set
            .register_test(TestDecl::for_expectation("a", "EXP-1"), DeclId::new(["A"]))
            .unwrap();
        assert_eq!(id, "EXP-1-TEST-01");
    }
}
