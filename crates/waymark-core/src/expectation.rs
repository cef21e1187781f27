//! Expectation registry

use crate::error::Result;
use serde::Serialize;
use waymark_registry::{DeclId, Entry, IndexValue, KeyedRegistry, Registrable};

/// Something a persona expects from the system, keyed by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expectation {
    /// Identifier, e.g. "EXP-001" (registry key)
    pub id: String,
    /// Short title
    pub title: Option<String>,
    /// Context the expectation applies in
    pub context: Option<String>,
    /// Who holds the expectation
    pub actor: Option<String>,
    /// Free-form description
    pub description: Option<String>,
    /// Tags
    pub tags: Vec<String>,
}

impl Expectation {
    /// Create expectation
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            context: None,
            actor: None,
            description: None,
            tags: Vec::new(),
        }
    }

    /// With title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// With context
    #[inline]
    #[must_use]
    pub fn in_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// With actor
    #[inline]
    #[must_use]
    pub fn held_by(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
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

impl Registrable for Expectation {
    const KIND: &'static str = "expectation";

    fn key(&self) -> &str {
        &self.id
    }

    fn index_values(&self) -> Vec<IndexValue> {
        let mut values = Vec::new();
        values.extend(self.context.iter().map(|c| ("context", c.clone())));
        values.extend(self.actor.iter().map(|a| ("actor", a.clone())));
        values.extend(self.tags.iter().map(|t| ("tag", t.clone())));
        values
    }
}

/// Expectations by id
#[derive(Debug, Default)]
pub struct ExpectationRegistry {
    store: KeyedRegistry<Expectation>,
}

impl ExpectationRegistry {
    /// Create empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an expectation
    ///
    /// # Errors
    /// Fails if the id or the owning declaration is already registered.
    pub fn register(&self, expectation: Expectation, owner: DeclId) -> Result<String> {
        Ok(self.store.register(expectation, owner)?)
    }

    /// Lookup by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Entry<Expectation>> {
        self.store.get(id)
    }

    /// Expectations in a context
    #[must_use]
    pub fn by_context(&self, context: &str) -> Vec<Entry<Expectation>> {
        self.store.by_index("context", context)
    }

    /// Expectations held by an actor
    #[must_use]
    pub fn by_actor(&self, actor: &str) -> Vec<Entry<Expectation>> {
        self.store.by_index("actor", actor)
    }

    /// Expectations carrying a tag
    #[must_use]
    pub fn by_tag(&self, tag: &str) -> Vec<Entry<Expectation>> {
        self.store.by_index("tag", tag)
    }

    /// All expectations in registration order
    #[must_use]
    pub fn all(&self) -> Vec<Entry<Expectation>> {
        self.store.all()
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &KeyedRegistry<Expectation> {
        &self.store
    }
}
