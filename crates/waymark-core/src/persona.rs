//! Persona registry

use crate::error::Result;
use serde::Serialize;
use waymark_registry::{DeclId, Entry, IndexValue, KeyedRegistry, Registrable};

/// Someone a journey is taken by
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Persona {
    /// Declared name (registry key)
    pub name: String,
    /// Role, e.g. "customer"
    pub role: Option<String>,
    /// Free-form description
    pub description: Option<String>,
    /// Goals the persona pursues
    pub goals: Vec<String>,
}

impl Persona {
    /// Create persona
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: None,
            description: None,
            goals: Vec::new(),
        }
    }

    /// With role
    #[inline]
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With goal
    #[inline]
    #[must_use]
    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goals.push(goal.into());
        self
    }
}

impl Registrable for Persona {
    const KIND: &'static str = "persona";

    fn key(&self) -> &str {
        &self.name
    }

    fn index_values(&self) -> Vec<IndexValue> {
        self.role.iter().map(|r| ("role", r.clone())).collect()
    }
}

/// Personas by name
#[derive(Debug, Default)]
pub struct PersonaRegistry {
    store: KeyedRegistry<Persona>,
}

impl PersonaRegistry {
    /// Create empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a persona
    ///
    /// # Errors
    /// Fails if the name or the owning declaration is already registered.
    pub fn register(&self, persona: Persona, owner: DeclId) -> Result<String> {
        Ok(self.store.register(persona, owner)?)
    }

    /// Lookup by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Entry<Persona>> {
        self.store.get(name)
    }

    /// Personas with a role
    #[must_use]
    pub fn by_role(&self, role: &str) -> Vec<Entry<Persona>> {
        self.store.by_index("role", role)
    }

    /// All personas in registration order
    #[must_use]
    pub fn all(&self) -> Vec<Entry<Persona>> {
        self.store.all()
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &KeyedRegistry<Persona> {
        &self.store
    }
}
