//! Journey registry
//!
//! A journey is declared as one unit together with its milestones and
//! detours, so its detour graph is checked eagerly at registration. The
//! on-demand audit additionally looks at the other registered journeys.

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::Result;
use crate::persona::PersonaRegistry;
use serde::Serialize;
use std::sync::Arc;
use waymark_registry::{
    DeclId, Entry, IdentityResolver, IndexValue, KeyedRegistry, Reference, Registrable,
    RegistryError,
};
use waymark_validate::{
    audit_detours, validate_detours, Detour, DetourAudit, MilestonePoint, RejoinPoint, Severity,
    SubJourney,
};

/// A registered journey
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Journey {
    /// Declared name (registry key)
    pub name: String,
    /// Persona taking the journey
    pub persona: Option<String>,
    /// Free-form description
    pub description: Option<String>,
    /// Tags
    pub tags: Vec<String>,
    /// Whether this journey is itself a detour of another
    pub is_detour: bool,
    /// Declared milestones
    pub milestones: Vec<MilestonePoint>,
    /// Declared detours, in declaration order
    pub detours: Vec<Detour>,
}

impl Registrable for Journey {
    const KIND: &'static str = "journey";

    fn key(&self) -> &str {
        &self.name
    }

    fn index_values(&self) -> Vec<IndexValue> {
        let mut values: Vec<IndexValue> =
            self.persona.iter().map(|p| ("persona", p.clone())).collect();
        values.extend(self.tags.iter().map(|t| ("tag", t.clone())));
        values
    }
}

/// A detour as declared, before its sub-journey reference is resolved
#[derive(Debug, Clone, PartialEq)]
pub struct DetourDecl {
    /// Sub-journey taken
    pub journey: Reference,
    /// Fractional branch position
    pub order: f64,
    /// Milestone after which the detour may trigger
    pub triggered_after: Option<String>,
    /// Where the detour returns
    pub rejoins_at: Option<RejoinPoint>,
    /// Free-form condition description
    pub condition: Option<String>,
}

impl DetourDecl {
    /// Create detour declaration
    #[must_use]
    pub fn new(journey: impl Into<Reference>, order: f64) -> Self {
        Self {
            journey: journey.into(),
            order,
            triggered_after: None,
            rejoins_at: None,
            condition: None,
        }
    }

    /// With trigger milestone
    #[inline]
    #[must_use]
    pub fn triggered_after(mut self, milestone: impl Into<String>) -> Self {
        self.triggered_after = Some(milestone.into());
        self
    }

    /// With rejoin point
    #[inline]
    #[must_use]
    pub fn rejoins_at(mut self, point: RejoinPoint) -> Self {
        self.rejoins_at = Some(point);
        self
    }

    /// With condition description
    #[inline]
    #[must_use]
    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// A journey as declared
#[derive(Debug, Clone, PartialEq)]
pub struct JourneyDecl {
    /// Declared name
    pub name: String,
    /// Persona reference
    pub persona: Option<Reference>,
    /// Free-form description
    pub description: Option<String>,
    /// Tags
    pub tags: Vec<String>,
    /// Whether this journey is a detour of another
    pub is_detour: bool,
    /// Milestones
    pub milestones: Vec<MilestonePoint>,
    /// Detours
    pub detours: Vec<DetourDecl>,
}

impl JourneyDecl {
    /// Create journey declaration
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            persona: None,
            description: None,
            tags: Vec::new(),
            is_detour: false,
            milestones: Vec::new(),
            detours: Vec::new(),
        }
    }

    /// With persona
    #[inline]
    #[must_use]
    pub fn for_persona(mut self, persona: impl Into<Reference>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With tag
    #[inline]
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Mark as a detour journey
    #[inline]
    #[must_use]
    pub fn as_detour(mut self) -> Self {
        self.is_detour = true;
        self
    }

    /// With milestone
    #[inline]
    #[must_use]
    pub fn with_milestone(mut self, name: impl Into<String>, order: f64) -> Self {
        self.milestones.push(MilestonePoint::new(name, order));
        self
    }

    /// With detour
    #[inline]
    #[must_use]
    pub fn with_detour(mut self, detour: DetourDecl) -> Self {
        self.detours.push(detour);
        self
    }
}

/// Journeys by name
#[derive(Debug)]
pub struct JourneyRegistry {
    store: KeyedRegistry<Journey>,
    personas: Arc<PersonaRegistry>,
    diagnostics: Arc<Diagnostics>,
}

impl JourneyRegistry {
    /// Create registry reading personas from `personas`
    #[must_use]
    pub fn new(personas: Arc<PersonaRegistry>, diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            store: KeyedRegistry::new(),
            personas,
            diagnostics,
        }
    }

    /// Register a journey
    ///
    /// References are resolved to canonical names, then the detour graph is
    /// validated before anything is stored.
    ///
    /// # Errors
    /// Fails on the first detour violation, or if the name or owner is
    /// already registered.
    pub fn register(&self, decl: JourneyDecl, owner: DeclId) -> Result<String> {
        let persona = IdentityResolver::resolve_opt(decl.persona.as_ref(), self.personas.store());
        let detours: Vec<Detour> = decl
            .detours
            .into_iter()
            .map(|d| Detour {
                journey: IdentityResolver::resolve(&d.journey, &self.store),
                order: d.order,
                triggered_after: d.triggered_after,
                rejoins_at: d.rejoins_at,
                condition: d.condition,
            })
            .collect();

        if let Err(err) = validate_detours(&decl.name, &decl.milestones, &detours) {
            tracing::warn!(journey = %decl.name, error = %err, "journey rejected");
            return Err(err.into());
        }

        let journey = Journey {
            name: decl.name,
            persona,
            description: decl.description,
            tags: decl.tags,
            is_detour: decl.is_detour,
            milestones: decl.milestones,
            detours,
        };
        Ok(self.store.register(journey, owner)?)
    }

    /// Lookup by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Entry<Journey>> {
        self.store.get(name)
    }

    /// Journeys taken by a persona
    #[must_use]
    pub fn by_persona(&self, persona: &str) -> Vec<Entry<Journey>> {
        self.store.by_index("persona", persona)
    }

    /// Journeys carrying a tag
    #[must_use]
    pub fn by_tag(&self, tag: &str) -> Vec<Entry<Journey>> {
        self.store.by_index("tag", tag)
    }

    /// Journeys marked as detours
    #[must_use]
    pub fn detour_journeys(&self) -> Vec<Entry<Journey>> {
        self.store.filter(|j| j.is_detour)
    }

    /// Detours of a journey ordered by detour order
    #[must_use]
    pub fn detours_of(&self, journey: &str) -> Vec<Detour> {
        let mut detours = self
            .store
            .get(journey)
            .map(|e| e.metadata.detours)
            .unwrap_or_default();
        detours.sort_by(|a, b| a.order.total_cmp(&b.order));
        detours
    }

    /// Audit a journey's detour graph against the registered journeys
    ///
    /// Findings are also reported as diagnostics.
    ///
    /// # Errors
    /// Returns [`RegistryError::NotFound`] if the journey is not registered.
    pub fn validate_detour_graph(&self, journey: &str) -> Result<DetourAudit> {
        let entry = self.store.get(journey).ok_or_else(|| RegistryError::NotFound {
            kind: Journey::KIND,
            key: journey.to_string(),
        })?;
        let metadata = &entry.metadata;

        let audit = audit_detours(
            &metadata.name,
            &metadata.milestones,
            &metadata.detours,
            |sub| match self.store.get(sub) {
                None => SubJourney::Missing,
                Some(e) if e.metadata.is_detour => SubJourney::Detour,
                Some(_) => SubJourney::Primary,
            },
        );

        for finding in audit.errors.iter().chain(&audit.warnings) {
            let diagnostic = match finding.severity() {
                Severity::Error => {
                    Diagnostic::error(DiagnosticKind::DetourGraph, &metadata.name, finding.to_string())
                }
                Severity::Warning => Diagnostic::warning(
                    DiagnosticKind::DetourGraph,
                    &metadata.name,
                    finding.to_string(),
                ),
            };
            self.diagnostics.report(diagnostic);
        }

        Ok(audit)
    }

    /// All journeys in registration order
    #[must_use]
    pub fn all(&self) -> Vec<Entry<Journey>> {
        self.store.all()
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &KeyedRegistry<Journey> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WaymarkError;
    use crate::persona::Persona;
    use waymark_validate::{DetourError, DetourFinding, ValidationError};

    fn registry() -> (Arc<PersonaRegistry>, JourneyRegistry) {
        let personas = Arc::new(PersonaRegistry::new());
        let journeys = JourneyRegistry::new(personas.clone(), Arc::new(Diagnostics::default()));
        (personas, journeys)
    }

    fn checkout() -> JourneyDecl {
        JourneyDecl::new("Checkout")
            .with_milestone("Browse", 1.0)
            .with_milestone("Validate", 2.0)
            .with_milestone("Pay", 3.0)
    }

    #[test]
    fn fractional_detour_accepted() {
        let (_, journeys) = registry();
        let decl = checkout().with_detour(DetourDecl::new("AddressFix", 2.5).triggered_after("Validate"));

        journeys.register(decl, DeclId::new(["Checkout"])).unwrap();
        assert_eq!(journeys.detours_of("Checkout")[0].journey, "AddressFix");
    }

    #[test]
    fn integer_detour_rejected_and_not_stored() {
        let (_, journeys) = registry();
        let decl = checkout().with_detour(DetourDecl::new("AddressFix", 2.0));

        let err = journeys.register(decl, DeclId::new(["Checkout"])).unwrap_err();
        assert!(matches!(
            err,
            WaymarkError::Validation(ValidationError::Detour(DetourError::IntegerOrder { .. }))
        ));
        assert!(journeys.get("Checkout").is_none());
    }

    #[test]
    fn persona_identity_resolves_to_registered_name() {
        let (personas, journeys) = registry();
        let shopper = DeclId::new(["people", "ShopperPersona"]);
        personas.register(Persona::new("Shopper"), shopper.clone()).unwrap();

        journeys
            .register(JourneyDecl::new("A").for_persona(shopper), DeclId::new(["A"]))
            .unwrap();
        journeys
            .register(JourneyDecl::new("B").for_persona("Shopper"), DeclId::new(["B"]))
            .unwrap();

        let names: Vec<_> = journeys.by_persona("Shopper").into_iter().map(|e| e.key).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn detour_sub_journey_identity_falls_back_to_declared_name() {
        let (_, journeys) = registry();
        let sub = DeclId::new(["flows", "AddressFix"]);
        let decl = checkout().with_detour(DetourDecl::new(sub, 1.5));

        journeys.register(decl, DeclId::new(["Checkout"])).unwrap();
        assert_eq!(journeys.detours_of("Checkout")[0].journey, "AddressFix");
    }

    #[test]
    fn detours_sorted_by_order() {
        let (_, journeys) = registry();
        let decl = checkout()
            .with_detour(DetourDecl::new("Late", 2.5))
            .with_detour(DetourDecl::new("Early", 1.5));
        journeys.register(decl, DeclId::new(["Checkout"])).unwrap();

        let orders: Vec<_> = journeys.detours_of("Checkout").iter().map(|d| d.order).collect();
        assert_eq!(orders, [1.5, 2.5]);
    }

    #[test]
    fn audit_checks_registered_sub_journeys() {
        let (_, journeys) = registry();
        let diagnostics = journeys.diagnostics.clone();
        journeys
            .register(JourneyDecl::new("AddressFix").as_detour(), DeclId::new(["AddressFix"]))
            .unwrap();
        journeys.register(JourneyDecl::new("Upsell"), DeclId::new(["Upsell"])).unwrap();
        let decl = checkout()
            .with_detour(DetourDecl::new("AddressFix", 2.5))
            .with_detour(DetourDecl::new("Upsell", 1.5))
            .with_detour(DetourDecl::new("Ghost", 2.25));
        journeys.register(decl, DeclId::new(["Checkout"])).unwrap();

        let audit = journeys.validate_detour_graph("Checkout").unwrap();
        assert!(audit.is_valid());
        assert_eq!(
            audit.warnings,
            [
                DetourFinding::SubJourneyNotDetour { detour: "Upsell".into() },
                DetourFinding::SubJourneyMissing { detour: "Ghost".into() },
            ]
        );
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn audit_of_unknown_journey_fails() {
        let (_, journeys) = registry();
        let err = journeys.validate_detour_graph("Nope").unwrap_err();
        assert!(matches!(err, WaymarkError::Registry(RegistryError::NotFound { .. })));
    }

    #[test]
    fn detour_journeys_and_tags() {
        let (_, journeys) = registry();
        journeys
            .register(JourneyDecl::new("Fix").as_detour().with_tag("recovery"), DeclId::new(["Fix"]))
            .unwrap();
        journeys.register(JourneyDecl::new("Main"), DeclId::new(["Main"])).unwrap();

        assert_eq!(journeys.detour_journeys().len(), 1);
        assert_eq!(journeys.by_tag("recovery")[0].key, "Fix");
    }
}
