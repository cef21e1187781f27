//! Step registry
//!
//! Steps live under a milestone. Inline steps are declared inside the
//! milestone's declaration and learn the milestone's name lazily, once the
//! milestone is registered. Ordering is never checked per registration
//! because siblings arrive independently; callers ask for it per parent.

use crate::config::RegistryConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::{Result, StepError};
use crate::milestone::MilestoneRegistry;
use crate::placement::Placement;
use serde::Serialize;
use std::sync::Arc;
use waymark_registry::{
    DeclId, Entry, IdentityResolver, IndexValue, Inheritance, Inheriting, KeyedRegistry,
    Reference, Registrable, ResolveReport, Unresolved,
};
use waymark_validate::{sort_by_order, validate_ordering, OrderSlot, OrderingReport, Severity};

/// A registered step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    /// Declared name (registry key)
    pub name: String,
    /// Position among the parent's steps
    pub order: Option<u32>,
    /// Steps that must come first
    pub prerequisites: Vec<String>,
    /// Free-form description
    pub description: Option<String>,
    /// Parent milestone, `None` for a detached step
    pub parent: Inheritance<Option<String>>,
}

impl Step {
    /// Parent milestone, if known
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.resolved().and_then(|p| p.as_deref())
    }
}

impl Registrable for Step {
    const KIND: &'static str = "step";

    fn key(&self) -> &str {
        &self.name
    }

    fn index_values(&self) -> Vec<IndexValue> {
        self.parent().map(|p| vec![("parent", p.to_string())]).unwrap_or_default()
    }

    fn pending_parent(&self) -> Option<&Reference> {
        self.parent.pending_parent()
    }
}

impl Inheriting for Step {
    type Inherited = String;

    fn inherit(&mut self, milestone: String) {
        self.parent = Inheritance::Resolved(Some(milestone));
    }
}

/// A step as declared
#[derive(Debug, Clone, PartialEq)]
pub struct StepDecl {
    /// Declared name
    pub name: String,
    /// Position among the parent's steps
    pub order: Option<u32>,
    /// Prerequisite steps
    pub prerequisites: Vec<Reference>,
    /// Free-form description
    pub description: Option<String>,
    /// Parent attachment
    pub placement: Placement,
}

impl StepDecl {
    /// Step nested in its milestone's declaration
    #[must_use]
    pub fn inline(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: None,
            prerequisites: Vec::new(),
            description: None,
            placement: Placement::Inline,
        }
    }

    /// Step declared on its own
    #[must_use]
    pub fn standalone(name: impl Into<String>) -> Self {
        Self {
            placement: Placement::Detached,
            ..Self::inline(name)
        }
    }

    /// Attach to a milestone
    #[inline]
    #[must_use]
    pub fn under(mut self, milestone: impl Into<Reference>) -> Self {
        self.placement = Placement::Parent(milestone.into());
        self
    }

    /// With order
    #[inline]
    #[must_use]
    pub fn at(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }

    /// With prerequisite
    #[inline]
    #[must_use]
    pub fn after(mut self, step: impl Into<Reference>) -> Self {
        self.prerequisites.push(step.into());
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Steps by name, indexed by parent milestone
#[derive(Debug)]
pub struct StepRegistry {
    store: KeyedRegistry<Step>,
    milestones: Arc<MilestoneRegistry>,
    config: Arc<RegistryConfig>,
    diagnostics: Arc<Diagnostics>,
}

impl StepRegistry {
    /// Create registry resolving parents against `milestones`
    #[must_use]
    pub fn new(
        milestones: Arc<MilestoneRegistry>,
        config: Arc<RegistryConfig>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            store: KeyedRegistry::new(),
            milestones,
            config,
            diagnostics,
        }
    }

    /// Register a step
    ///
    /// A parent given by name is known immediately; one given by identity is
    /// known if already registered and pending otherwise.
    ///
    /// # Errors
    /// Fails for order 0, for an inline step without order, for an inline
    /// step with no enclosing declaration, and for a duplicate name or owner.
    pub fn register(&self, decl: StepDecl, owner: DeclId) -> Result<String> {
        if decl.order == Some(0) {
            return Err(StepError::ZeroOrder { name: decl.name }.into());
        }
        if decl.placement.is_inline() && decl.order.is_none() {
            return Err(StepError::MissingOrder { name: decl.name }.into());
        }

        let parent = match decl.placement.parent_reference(Step::KIND, &owner)? {
            None => Inheritance::Resolved(None),
            Some(Reference::Name(name)) => Inheritance::Resolved(Some(name)),
            Some(reference) => {
                match IdentityResolver::lookup(&reference, self.milestones.store()) {
                    Some(milestone) => Inheritance::Resolved(Some(milestone.key)),
                    None => Inheritance::pending(reference),
                }
            }
        };

        let step = Step {
            prerequisites: IdentityResolver::resolve_all(&decl.prerequisites, &self.store),
            name: decl.name,
            order: decl.order,
            description: decl.description,
            parent,
        };
        Ok(self.store.register(step, owner)?)
    }

    /// Complete pending steps whose milestone is now registered
    pub fn resolve_pending(&self) -> ResolveReport {
        let milestones = self.milestones.store();
        let report = self.store.resolve_with(|_, parent| {
            IdentityResolver::lookup(parent, milestones)
                .map(|m| m.key)
                .ok_or(Unresolved::ParentMissing)
        });
        self.diagnostics.report_unresolved(Step::KIND, &report);
        report
    }

    /// Lookup by name (pending steps included)
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Entry<Step>> {
        self.store.get(name)
    }

    /// A parent's steps sorted by order
    ///
    /// Duplicates and gaps are tolerated; see [`validate_ordering`](Self::validate_ordering).
    ///
    /// # Errors
    /// Fails with a missing-order error if any sibling has no order.
    pub fn by_parent(&self, parent: &str) -> Result<Vec<Entry<Step>>> {
        let steps = self.unsorted_by_parent(parent);
        Ok(sort_by_order(
            parent,
            steps,
            |e| e.metadata.order,
            |e| e.key.clone(),
        )?)
    }

    /// A parent's steps in registration order
    #[must_use]
    pub fn unsorted_by_parent(&self, parent: &str) -> Vec<Entry<Step>> {
        self.resolve_pending();
        self.store.by_index("parent", parent)
    }

    /// Report every ordering issue under a parent
    ///
    /// Issues are also reported as diagnostics.
    #[must_use]
    pub fn validate_ordering(&self, parent: &str) -> OrderingReport {
        let slots: Vec<OrderSlot> = self
            .unsorted_by_parent(parent)
            .into_iter()
            .map(|e| OrderSlot::new(e.key, e.metadata.order))
            .collect();
        let report = validate_ordering(parent, &slots);

        for issue in &report.issues {
            let diagnostic = match issue.severity() {
                Severity::Error => {
                    Diagnostic::error(DiagnosticKind::StepOrdering, parent, issue.to_string())
                }
                Severity::Warning => {
                    Diagnostic::warning(DiagnosticKind::StepOrdering, parent, issue.to_string())
                }
            };
            self.diagnostics.report(diagnostic);
        }

        report
    }

    /// Fail unless a parent's ordering is well formed
    ///
    /// Missing and duplicate orders always fail; gaps and a start other than
    /// 1 fail only with `strict_step_order`.
    ///
    /// # Errors
    /// Returns the ordering error carrying the offending issues.
    pub fn ensure_well_formed(&self, parent: &str) -> Result<()> {
        Ok(self
            .validate_ordering(parent)
            .into_result(self.config.strict_step_order)?)
    }

    /// Prerequisites of a step (empty if unknown)
    #[must_use]
    pub fn prerequisites_of(&self, step: &str) -> Vec<String> {
        self.store
            .get(step)
            .map(|e| e.metadata.prerequisites)
            .unwrap_or_default()
    }

    /// All steps in registration order, after resolving
    #[must_use]
    pub fn all(&self) -> Vec<Entry<Step>> {
        self.resolve_pending();
        self.store.all()
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &KeyedRegistry<Step> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WaymarkError;
    use crate::journey::JourneyRegistry;
    use crate::milestone::MilestoneDecl;
    use crate::persona::PersonaRegistry;
    use waymark_validate::{OrderingError, OrderingIssue, ValidationError};

    fn registries(config: RegistryConfig) -> (Arc<MilestoneRegistry>, StepRegistry) {
        let diagnostics = Arc::new(Diagnostics::default());
        let personas = Arc::new(PersonaRegistry::new());
        let journeys = Arc::new(JourneyRegistry::new(personas, diagnostics.clone()));
        let milestones = Arc::new(MilestoneRegistry::new(journeys));
        let steps = StepRegistry::new(milestones.clone(), Arc::new(config), diagnostics);
        (milestones, steps)
    }

    fn validate_decl() -> DeclId {
        DeclId::new(["shop", "ValidateMilestone"])
    }

    fn register_validate(milestones: &MilestoneRegistry) {
        milestones
            .register(MilestoneDecl::new("Validate").in_journey("Checkout").at(2.0), validate_decl())
            .unwrap();
    }

    fn inline(steps: &StepRegistry, name: &str, order: u32) {
        steps
            .register(StepDecl::inline(name).at(order), validate_decl().child(name))
            .unwrap();
    }

    #[test]
    fn inline_step_pending_until_milestone_registered() {
        let (milestones, steps) = registries(RegistryConfig::default());
        inline(&steps, "scan", 1);

        assert!(steps.get("scan").is_some());
        assert!(steps.unsorted_by_parent("Validate").is_empty());
        assert!(steps.store().is_pending("scan"));

        register_validate(&milestones);
        let names: Vec<_> = steps.by_parent("Validate").unwrap().into_iter().map(|e| e.key).collect();
        assert_eq!(names, ["scan"]);
        assert!(!steps.store().is_pending("scan"));
    }

    #[test]
    fn inline_step_known_immediately_when_milestone_exists() {
        let (milestones, steps) = registries(RegistryConfig::default());
        register_validate(&milestones);
        inline(&steps, "scan", 1);

        assert!(!steps.store().is_pending("scan"));
        assert_eq!(steps.get("scan").unwrap().metadata.parent(), Some("Validate"));
    }

    #[test]
    fn unresolved_parent_reported_once() {
        let (_, steps) = registries(RegistryConfig::default());
        inline(&steps, "scan", 1);

        steps.resolve_pending();
        steps.resolve_pending();

        let diagnostics = steps.diagnostics.snapshot();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnresolvedParent);
        assert_eq!(diagnostics[0].subject, "scan");
    }

    #[test]
    fn inline_step_without_order_rejected() {
        let (_, steps) = registries(RegistryConfig::default());
        let err = steps
            .register(StepDecl::inline("scan"), validate_decl().child("scan"))
            .unwrap_err();

        assert!(matches!(err, WaymarkError::Step(StepError::MissingOrder { .. })));
        assert!(steps.get("scan").is_none());
    }

    #[test]
    fn zero_order_rejected() {
        let (_, steps) = registries(RegistryConfig::default());
        let err = steps
            .register(StepDecl::standalone("scan").at(0), DeclId::new(["scan"]))
            .unwrap_err();
        assert!(matches!(err, WaymarkError::Step(StepError::ZeroOrder { .. })));
    }

    #[test]
    fn sorted_retrieval_tolerates_duplicates_but_not_missing() {
        let (_, steps) = registries(RegistryConfig::default());
        for (name, order) in [("c", Some(2)), ("a", Some(1)), ("b", Some(2))] {
            let mut decl = StepDecl::standalone(name).under("Validate");
            if let Some(order) = order {
                decl = decl.at(order);
            }
            steps.register(decl, DeclId::new([name])).unwrap();
        }
        let names: Vec<_> = steps.by_parent("Validate").unwrap().into_iter().map(|e| e.key).collect();
        assert_eq!(names, ["a", "c", "b"]);

        steps
            .register(StepDecl::standalone("loose").under("Validate"), DeclId::new(["loose"]))
            .unwrap();
        let err = steps.by_parent("Validate").unwrap_err();
        assert!(matches!(
            err,
            WaymarkError::Validation(ValidationError::Ordering(OrderingError::MissingOrder { .. }))
        ));
        // existence queries still work
        assert_eq!(steps.unsorted_by_parent("Validate").len(), 4);
    }

    #[test]
    fn validate_ordering_reports_issues() {
        let (milestones, steps) = registries(RegistryConfig::default());
        register_validate(&milestones);
        inline(&steps, "scan", 1);
        inline(&steps, "weigh", 3);

        let report = steps.validate_ordering("Validate");
        assert_eq!(report.issues, [OrderingIssue::OrderGap { after: 1, before: 3 }]);
        assert!(steps.ensure_well_formed("Validate").is_ok());
    }

    #[test]
    fn strict_ordering_fails_on_gaps() {
        let (milestones, steps) = registries(RegistryConfig::default().with_strict_step_order(true));
        register_validate(&milestones);
        inline(&steps, "scan", 2);
        inline(&steps, "weigh", 3);

        let err = steps.ensure_well_formed("Validate").unwrap_err();
        assert!(matches!(
            err,
            WaymarkError::Validation(ValidationError::Ordering(OrderingError::IllFormed { .. }))
        ));
    }

    #[test]
    fn prerequisites_resolved_to_names() {
        let (_, steps) = registries(RegistryConfig::default());
        let scan = DeclId::new(["shop", "ScanStep"]);
        steps
            .register(StepDecl::standalone("scan").under("Validate").at(1), scan.clone())
            .unwrap();
        steps
            .register(
                StepDecl::standalone("weigh").under("Validate").at(2).after(scan),
                DeclId::new(["shop", "WeighStep"]),
            )
            .unwrap();

        assert_eq!(steps.prerequisites_of("weigh"), ["scan"]);
        assert!(steps.prerequisites_of("missing").is_empty());
    }
}
