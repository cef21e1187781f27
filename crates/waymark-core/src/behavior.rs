//! Behavior registry
//!
//! A behavior inherits its expectation id. Inline behaviors are nested in the
//! expectation's declaration and stay out of the `expectation` index until
//! that expectation is registered and a query runs.

use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::expectation::ExpectationRegistry;
use crate::placement::Placement;
use serde::Serialize;
use std::sync::Arc;
use waymark_registry::{
    DeclId, Entry, IdentityResolver, IndexValue, Inheritance, Inheriting, KeyedRegistry,
    Reference, Registrable, ResolveReport, Unresolved,
};

/// A registered behavior
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Behavior {
    /// Declared name (registry key)
    pub name: String,
    /// Category
    pub category: Option<String>,
    /// Free-form description
    pub description: Option<String>,
    /// Tags
    pub tags: Vec<String>,
    /// Expectation id, `None` for a detached behavior
    pub expectation: Inheritance<Option<String>>,
}

impl Behavior {
    /// Expectation id, if known
    #[must_use]
    pub fn expectation_id(&self) -> Option<&str> {
        self.expectation.resolved().and_then(|e| e.as_deref())
    }
}

impl Registrable for Behavior {
    const KIND: &'static str = "behavior";

    fn key(&self) -> &str {
        &self.name
    }

    fn index_values(&self) -> Vec<IndexValue> {
        let mut values: Vec<IndexValue> = self
            .expectation_id()
            .map(|e| ("expectation", e.to_string()))
            .into_iter()
            .collect();
        values.extend(self.category.iter().map(|c| ("category", c.clone())));
        values.extend(self.tags.iter().map(|t| ("tag", t.clone())));
        values
    }

    fn pending_parent(&self) -> Option<&Reference> {
        self.expectation.pending_parent()
    }
}

impl Inheriting for Behavior {
    type Inherited = String;

    fn inherit(&mut self, expectation: String) {
        self.expectation = Inheritance::Resolved(Some(expectation));
    }
}

/// A behavior as declared
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorDecl {
    /// Declared name
    pub name: String,
    /// Category
    pub category: Option<String>,
    /// Free-form description
    pub description: Option<String>,
    /// Tags
    pub tags: Vec<String>,
    /// Expectation attachment
    pub placement: Placement,
}

impl BehaviorDecl {
    /// Behavior nested in its expectation's declaration
    #[must_use]
    pub fn inline(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
            description: None,
            tags: Vec::new(),
            placement: Placement::Inline,
        }
    }

    /// Behavior declared on its own
    #[must_use]
    pub fn standalone(name: impl Into<String>) -> Self {
        Self {
            placement: Placement::Detached,
            ..Self::inline(name)
        }
    }

    /// Attach to an expectation (by id or declaration)
    #[inline]
    #[must_use]
    pub fn for_expectation(mut self, expectation: impl Into<Reference>) -> Self {
        self.placement = Placement::Parent(expectation.into());
        self
    }

    /// With category
    #[inline]
    #[must_use]
    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
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
}

/// Behaviors by name, indexed by expectation
#[derive(Debug)]
pub struct BehaviorRegistry {
    store: KeyedRegistry<Behavior>,
    expectations: Arc<ExpectationRegistry>,
    diagnostics: Arc<Diagnostics>,
}

impl BehaviorRegistry {
    /// Create registry resolving expectations against `expectations`
    #[must_use]
    pub fn new(expectations: Arc<ExpectationRegistry>, diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            store: KeyedRegistry::new(),
            expectations,
            diagnostics,
        }
    }

    /// Register a behavior
    ///
    /// An expectation given by id is known immediately; one given by
    /// declaration is known if already registered and pending otherwise.
    ///
    /// # Errors
    /// Fails for an inline behavior with no enclosing declaration and for a
    /// duplicate name or owner.
    pub fn register(&self, decl: BehaviorDecl, owner: DeclId) -> Result<String> {
        let expectation = match decl.placement.parent_reference(Behavior::KIND, &owner)? {
            None => Inheritance::Resolved(None),
            Some(Reference::Name(id)) => Inheritance::Resolved(Some(id)),
            Some(reference) => {
                match IdentityResolver::lookup(&reference, self.expectations.store()) {
                    Some(expectation) => Inheritance::Resolved(Some(expectation.key)),
                    None => Inheritance::pending(reference),
                }
            }
        };

        let behavior = Behavior {
            name: decl.name,
            category: decl.category,
            description: decl.description,
            tags: decl.tags,
            expectation,
        };
        Ok(self.store.register(behavior, owner)?)
    }

    /// Complete pending behaviors whose expectation is now registered
    pub fn resolve_pending(&self) -> ResolveReport {
        let expectations = self.expectations.store();
        let report = self.store.resolve_with(|_, parent| {
            IdentityResolver::lookup(parent, expectations)
                .map(|e| e.key)
                .ok_or(Unresolved::ParentMissing)
        });
        self.diagnostics.report_unresolved(Behavior::KIND, &report);
        report
    }

    /// Lookup by name (pending behaviors included)
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Entry<Behavior>> {
        self.store.get(name)
    }

    /// Behaviors of an expectation
    #[must_use]
    pub fn by_expectation(&self, expectation: &str) -> Vec<Entry<Behavior>> {
        self.resolve_pending();
        self.store.by_index("expectation", expectation)
    }

    /// Behaviors in a category
    #[must_use]
    pub fn by_category(&self, category: &str) -> Vec<Entry<Behavior>> {
        self.store.by_index("category", category)
    }

    /// Behaviors carrying a tag
    #[must_use]
    pub fn by_tag(&self, tag: &str) -> Vec<Entry<Behavior>> {
        self.store.by_index("tag", tag)
    }

    /// All behaviors in registration order, after resolving
    #[must_use]
    pub fn all(&self) -> Vec<Entry<Behavior>> {
        self.resolve_pending();
        self.store.all()
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &KeyedRegistry<Behavior> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectation::Expectation;

    fn registries() -> (Arc<ExpectationRegistry>, BehaviorRegistry) {
        let expectations = Arc::new(ExpectationRegistry::new());
        let behaviors = BehaviorRegistry::new(expectations.clone(), Arc::new(Diagnostics::default()));
        (expectations, behaviors)
    }

    fn exp_decl() -> DeclId {
        DeclId::new(["specs", "CartTotals"])
    }

    #[test]
    fn inline_behavior_inherits_expectation_id() {
        let (expectations, behaviors) = registries();
        behaviors
            .register(
                BehaviorDecl::inline("sums_items").in_category("pricing"),
                exp_decl().child("sums_items"),
            )
            .unwrap();

        // visible by key and non-inherited indexes while pending
        assert!(behaviors.get("sums_items").is_some());
        assert_eq!(behaviors.by_category("pricing").len(), 1);
        assert!(behaviors.by_expectation("EXP-42").is_empty());

        expectations.register(Expectation::new("EXP-42"), exp_decl()).unwrap();

        let found = behaviors.by_expectation("EXP-42");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].metadata.expectation_id(), Some("EXP-42"));
    }

    #[test]
    fn expectation_by_id_resolves_immediately() {
        let (_, behaviors) = registries();
        behaviors
            .register(
                BehaviorDecl::standalone("refunds").for_expectation("EXP-7"),
                DeclId::new(["Refunds"]),
            )
            .unwrap();

        assert!(!behaviors.store().is_pending("refunds"));
        assert_eq!(behaviors.by_expectation("EXP-7").len(), 1);
    }

    #[test]
    fn resolution_is_idempotent() {
        let (expectations, behaviors) = registries();
        behaviors
            .register(BehaviorDecl::inline("sums_items"), exp_decl().child("sums_items"))
            .unwrap();
        expectations.register(Expectation::new("EXP-42"), exp_decl()).unwrap();

        let first = behaviors.resolve_pending();
        assert_eq!(first.resolved, ["sums_items"]);

        let snapshot = behaviors.all();
        assert!(behaviors.resolve_pending().is_noop());
        assert_eq!(behaviors.all(), snapshot);
        assert_eq!(behaviors.by_expectation("EXP-42").len(), 1);
    }

    #[test]
    fn detached_behavior_has_no_expectation() {
        let (_, behaviors) = registries();
        behaviors
            .register(BehaviorDecl::standalone("audit").with_tag("ops"), DeclId::new(["Audit"]))
            .unwrap();

        let entry = behaviors.get("audit").unwrap();
        assert_eq!(entry.metadata.expectation_id(), None);
        assert_eq!(behaviors.by_tag("ops").len(), 1);
    }
}
