//! Standalone milestone registry

use crate::error::Result;
use crate::journey::JourneyRegistry;
use serde::Serialize;
use std::sync::Arc;
use waymark_registry::{
    DeclId, Entry, IdentityResolver, IndexValue, KeyedRegistry, Reference, Registrable,
};

/// A registered milestone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Milestone {
    /// Declared name (registry key)
    pub name: String,
    /// Journey the milestone belongs to
    pub journey: Option<String>,
    /// Position within the journey
    pub order: Option<f64>,
    /// Free-form description
    pub description: Option<String>,
}

impl Registrable for Milestone {
    const KIND: &'static str = "milestone";

    fn key(&self) -> &str {
        &self.name
    }

    fn index_values(&self) -> Vec<IndexValue> {
        self.journey.iter().map(|j| ("journey", j.clone())).collect()
    }
}

/// A milestone as declared
#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneDecl {
    /// Declared name
    pub name: String,
    /// Journey reference
    pub journey: Option<Reference>,
    /// Position within the journey
    pub order: Option<f64>,
    /// Free-form description
    pub description: Option<String>,
}

impl MilestoneDecl {
    /// Create milestone declaration
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            journey: None,
            order: None,
            description: None,
        }
    }

    /// In journey
    #[inline]
    #[must_use]
    pub fn in_journey(mut self, journey: impl Into<Reference>) -> Self {
        self.journey = Some(journey.into());
        self
    }

    /// With order
    #[inline]
    #[must_use]
    pub fn at(mut self, order: f64) -> Self {
        self.order = Some(order);
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

/// Milestones by name
#[derive(Debug)]
pub struct MilestoneRegistry {
    store: KeyedRegistry<Milestone>,
    journeys: Arc<JourneyRegistry>,
}

impl MilestoneRegistry {
    /// Create registry reading journeys from `journeys`
    #[must_use]
    pub fn new(journeys: Arc<JourneyRegistry>) -> Self {
        Self {
            store: KeyedRegistry::new(),
            journeys,
        }
    }

    /// Register a milestone
    ///
    /// # Errors
    /// Fails if the name or the owning declaration is already registered.
    pub fn register(&self, decl: MilestoneDecl, owner: DeclId) -> Result<String> {
        let milestone = Milestone {
            name: decl.name,
            journey: IdentityResolver::resolve_opt(decl.journey.as_ref(), self.journeys.store()),
            order: decl.order,
            description: decl.description,
        };
        Ok(self.store.register(milestone, owner)?)
    }

    /// Lookup by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Entry<Milestone>> {
        self.store.get(name)
    }

    /// Milestones of a journey by order; unordered ones last in registration order
    #[must_use]
    pub fn by_journey(&self, journey: &str) -> Vec<Entry<Milestone>> {
        let mut milestones = self.store.by_index("journey", journey);
        milestones.sort_by(|a, b| match (a.metadata.order, b.metadata.order) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        milestones
    }

    /// All milestones in registration order
    #[must_use]
    pub fn all(&self) -> Vec<Entry<Milestone>> {
        self.store.all()
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &KeyedRegistry<Milestone> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::persona::PersonaRegistry;

    fn registry() -> MilestoneRegistry {
        let personas = Arc::new(PersonaRegistry::new());
        let journeys = Arc::new(JourneyRegistry::new(personas, Arc::new(Diagnostics::default())));
        MilestoneRegistry::new(journeys)
    }

    #[test]
    fn by_journey_sorted_with_unordered_last() {
        let milestones = registry();
        for (name, order) in [("Pay", Some(3.0)), ("Loose", None), ("Browse", Some(1.0)), ("Validate", Some(2.0))] {
            let mut decl = MilestoneDecl::new(name).in_journey("Checkout");
            if let Some(order) = order {
                decl = decl.at(order);
            }
            milestones.register(decl, DeclId::new(["Checkout", name])).unwrap();
        }

        let names: Vec<_> = milestones.by_journey("Checkout").into_iter().map(|e| e.key).collect();
        assert_eq!(names, ["Browse", "Validate", "Pay", "Loose"]);
    }

    #[test]
    fn journey_identity_resolves_to_declared_name() {
        let milestones = registry();
        milestones
            .register(
                MilestoneDecl::new("Browse").in_journey(DeclId::new(["flows", "Checkout"])),
                DeclId::new(["flows", "Checkout", "Browse"]),
            )
            .unwrap();

        assert_eq!(milestones.by_journey("Checkout").len(), 1);
    }
}
