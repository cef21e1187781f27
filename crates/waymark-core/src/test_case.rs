//! Test case registry
//!
//! Tests are keyed by a generated id, `{expectation}{separator}{counter}`,
//! with the counter scoped per expectation. A test declared against a
//! behavior whose expectation is not known yet has no id; it is stored under
//! its owning declaration's path and receives its id when resolution finds
//! the expectation. The declaration path stays valid for direct lookup.

use crate::behavior::BehaviorRegistry;
use crate::config::RegistryConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{Result, WaymarkError};
use parking_lot::Mutex;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use waymark_registry::{
    DeclId, Entry, IdentityResolver, IndexValue, Inheritance, Inheriting, KeyedRegistry,
    Reference, Registrable, ResolveReport, Unresolved,
};

/// Expectation and behavior a test covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestLink {
    /// Expectation id
    pub expectation: String,
    /// Behavior name, if declared against one
    pub behavior: Option<String>,
}

/// A registered test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCase {
    /// Generated id, once the expectation is known
    pub id: Option<String>,
    /// Key used until the id is generated
    pub provisional_key: String,
    /// Declared name
    pub name: String,
    /// Test type, e.g. "unit" or "e2e"
    pub test_type: Option<String>,
    /// Free-form description
    pub description: Option<String>,
    /// Tags
    pub tags: Vec<String>,
    /// What the test covers
    pub link: Inheritance<TestLink>,
}

impl Registrable for TestCase {
    const KIND: &'static str = "test";

    fn key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.provisional_key)
    }

    fn index_values(&self) -> Vec<IndexValue> {
        let mut values = Vec::new();
        if let Some(link) = self.link.resolved() {
            values.push(("expectation", link.expectation.clone()));
            values.extend(link.behavior.iter().map(|b| ("behavior", b.clone())));
        }
        values.extend(self.test_type.iter().map(|t| ("type", t.clone())));
        values.extend(self.tags.iter().map(|t| ("tag", t.clone())));
        values
    }

    fn pending_parent(&self) -> Option<&Reference> {
        self.link.pending_parent()
    }
}

impl Inheriting for TestCase {
    type Inherited = (String, TestLink);

    fn inherit(&mut self, (id, link): (String, TestLink)) {
        self.id = Some(id);
        self.link = Inheritance::Resolved(link);
    }
}

/// What a test is declared against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestTarget {
    /// Nested in its behavior's declaration
    Inline,

    /// A behavior, by name or declaration
    Behavior(Reference),

    /// An expectation id directly
    Expectation(String),
}

/// A test as declared
#[derive(Debug, Clone, PartialEq)]
pub struct TestDecl {
    /// Declared name
    pub name: String,
    /// Test type
    pub test_type: Option<String>,
    /// Free-form description
    pub description: Option<String>,
    /// Tags
    pub tags: Vec<String>,
    /// What the test covers
    pub target: TestTarget,
}

impl TestDecl {
    /// Test nested in its behavior's declaration
    #[must_use]
    pub fn inline(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            test_type: None,
            description: None,
            tags: Vec::new(),
            target: TestTarget::Inline,
        }
    }

    /// Test of a behavior
    #[must_use]
    pub fn for_behavior(name: impl Into<String>, behavior: impl Into<Reference>) -> Self {
        Self {
            target: TestTarget::Behavior(behavior.into()),
            ..Self::inline(name)
        }
    }

    /// Test of an expectation
    #[must_use]
    pub fn for_expectation(name: impl Into<String>, expectation: impl Into<String>) -> Self {
        Self {
            target: TestTarget::Expectation(expectation.into()),
            ..Self::inline(name)
        }
    }

    /// With type
    #[inline]
    #[must_use]
    pub fn of_type(mut self, test_type: impl Into<String>) -> Self {
        self.test_type = Some(test_type.into());
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

/// Tests by generated id, indexed by expectation and behavior
#[derive(Debug)]
pub struct TestRegistry {
    store: KeyedRegistry<TestCase>,
    counters: Mutex<HashMap<String, u32>>,
    behaviors: Arc<BehaviorRegistry>,
    config: Arc<RegistryConfig>,
    diagnostics: Arc<Diagnostics>,
}

impl TestRegistry {
    /// Create registry resolving behaviors against `behaviors`
    #[must_use]
    pub fn new(
        behaviors: Arc<BehaviorRegistry>,
        config: Arc<RegistryConfig>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            store: KeyedRegistry::new(),
            counters: Mutex::new(HashMap::new()),
            behaviors,
            config,
            diagnostics,
        }
    }

    /// Id the next test of `expectation` would get; consumed by [`Self::commit_id`]
    fn peek_id(&self, counters: &HashMap<String, u32>, expectation: &str) -> String {
        let next = counters.get(expectation).copied().unwrap_or(0) + 1;
        self.config.test_id(expectation, next)
    }

    fn commit_id(counters: &mut HashMap<String, u32>, expectation: &str) {
        *counters.entry(expectation.to_string()).or_insert(0) += 1;
    }

    /// What a behavior passes on to its tests
    fn link_from_behavior(
        &self,
        behavior: &Reference,
    ) -> std::result::Result<TestLink, Unresolved> {
        let entry = IdentityResolver::lookup(behavior, self.behaviors.store())
            .ok_or(Unresolved::ParentMissing)?;
        match &entry.metadata.expectation {
            Inheritance::Pending { .. } => Err(Unresolved::ParentPending),
            Inheritance::Resolved(None) => Err(Unresolved::NothingToInherit),
            Inheritance::Resolved(Some(expectation)) => Ok(TestLink {
                expectation: expectation.clone(),
                behavior: Some(entry.key),
            }),
        }
    }

    fn link_or_pending(&self, behavior: Reference) -> Inheritance<TestLink> {
        match self.link_from_behavior(&behavior) {
            Ok(link) => Inheritance::Resolved(link),
            Err(_) => Inheritance::pending(behavior),
        }
    }

    /// Register a test
    ///
    /// Returns the generated id, or the provisional key if the expectation
    /// is not known yet.
    ///
    /// # Errors
    /// Fails for an inline test with no enclosing declaration and for a
    /// duplicate owner.
    pub fn register(&self, decl: TestDecl, owner: DeclId) -> Result<String> {
        let link = match decl.target {
            TestTarget::Expectation(expectation) => Inheritance::Resolved(TestLink {
                expectation,
                behavior: None,
            }),
            TestTarget::Behavior(reference) => self.link_or_pending(reference),
            TestTarget::Inline => {
                let parent = owner.parent().ok_or_else(|| WaymarkError::NoEnclosingDeclaration {
                    kind: TestCase::KIND,
                    owner: owner.clone(),
                })?;
                self.link_or_pending(Reference::Identity(parent))
            }
        };
        // counters stay locked until the store accepts the test
        let mut counters = self.counters.lock();
        let expectation = link.resolved().map(|l| l.expectation.clone());
        let id = expectation.as_deref().map(|e| self.peek_id(&counters, e));

        let test = TestCase {
            id,
            provisional_key: owner.to_string(),
            name: decl.name,
            test_type: decl.test_type,
            description: decl.description,
            tags: decl.tags,
            link,
        };
        let key = self.store.register(test, owner)?;
        if let Some(expectation) = expectation {
            Self::commit_id(&mut counters, &expectation);
        }
        Ok(key)
    }

    /// Complete pending tests, resolving behaviors first
    ///
    /// Behaviors resolved in this call pass their expectation on to their
    /// tests in the same call.
    pub fn resolve_pending(&self) -> ResolveReport {
        self.behaviors.resolve_pending();
        let counters = RefCell::new(self.counters.lock());
        let report = self.store.resolve_staged(
            |_, parent| self.link_from_behavior(parent),
            |link| (self.peek_id(&counters.borrow(), &link.expectation), link),
            |entry| {
                if let Some(link) = entry.metadata.link.resolved() {
                    Self::commit_id(&mut counters.borrow_mut(), &link.expectation);
                }
            },
        );
        drop(counters);
        self.diagnostics.report_unresolved(TestCase::KIND, &report);
        report
    }

    /// Lookup by id or provisional key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Entry<TestCase>> {
        self.store.get(key)
    }

    /// Tests covering an expectation
    #[must_use]
    pub fn by_expectation(&self, expectation: &str) -> Vec<Entry<TestCase>> {
        self.resolve_pending();
        self.store.by_index("expectation", expectation)
    }

    /// Tests covering a behavior
    #[must_use]
    pub fn by_behavior(&self, behavior: &str) -> Vec<Entry<TestCase>> {
        self.resolve_pending();
        self.store.by_index("behavior", behavior)
    }

    /// Tests of a type
    #[must_use]
    pub fn by_type(&self, test_type: &str) -> Vec<Entry<TestCase>> {
        self.store.by_index("type", test_type)
    }

    /// Tests carrying a tag
    #[must_use]
    pub fn by_tag(&self, tag: &str) -> Vec<Entry<TestCase>> {
        self.store.by_index("tag", tag)
    }

    /// Number of tests covering an expectation
    #[must_use]
    pub fn count_for_expectation(&self, expectation: &str) -> usize {
        self.by_expectation(expectation).len()
    }

    /// All tests in registration order, after resolving
    #[must_use]
    pub fn all(&self) -> Vec<Entry<TestCase>> {
        self.resolve_pending();
        self.store.all()
    }

    /// Remove every test and reset id counters
    pub fn clear(&self) {
        self.store.clear();
        self.counters.lock().clear();
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &KeyedRegistry<TestCase> {
        &self.store
    }
}
