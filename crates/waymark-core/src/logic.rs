//! Logic unit registry
//!
//! Logic units depend on each other by invoking or being composed of other
//! units. Cycles are found on demand; with `eager_cycle_check` a unit that
//! would close a cycle is rejected at registration instead.

use crate::config::RegistryConfig;
use crate::error::Result;
use indexmap::IndexSet;
use serde::Serialize;
use std::sync::Arc;
use waymark_registry::{
    DeclId, Entry, IdentityResolver, IndexValue, KeyedRegistry, Reference, Registrable,
};
use waymark_validate::{DependencyGraph, GraphError};

/// One part of a composed logic unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Composition {
    /// Logic unit used
    pub logic: String,
    /// Role it plays in the composition
    pub role: Option<String>,
}

/// A registered logic unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Logic {
    /// Declared name (registry key)
    pub name: String,
    /// Category
    pub category: Option<String>,
    /// Free-form description
    pub description: Option<String>,
    /// Units invoked
    pub invokes: Vec<String>,
    /// Units composed of
    pub composed_of: Vec<Composition>,
    /// Tags
    pub tags: Vec<String>,
}

impl Logic {
    /// Units this one depends on: invoked units, then composed units
    #[must_use]
    pub fn dependencies(&self) -> Vec<String> {
        let deps: IndexSet<&String> = self
            .invokes
            .iter()
            .chain(self.composed_of.iter().map(|c| &c.logic))
            .collect();
        deps.into_iter().cloned().collect()
    }
}

impl Registrable for Logic {
    const KIND: &'static str = "logic";

    fn key(&self) -> &str {
        &self.name
    }

    fn index_values(&self) -> Vec<IndexValue> {
        let mut values: Vec<IndexValue> =
            self.category.iter().map(|c| ("category", c.clone())).collect();
        values.extend(self.tags.iter().map(|t| ("tag", t.clone())));
        values.extend(self.dependencies().into_iter().map(|d| ("depends_on", d)));
        values
    }
}

/// A logic unit as declared
#[derive(Debug, Clone, PartialEq)]
pub struct LogicDecl {
    /// Declared name
    pub name: String,
    /// Category
    pub category: Option<String>,
    /// Free-form description
    pub description: Option<String>,
    /// Units invoked
    pub invokes: Vec<Reference>,
    /// Units composed of, with optional role
    pub composed_of: Vec<(Reference, Option<String>)>,
    /// Tags
    pub tags: Vec<String>,
}

impl LogicDecl {
    /// Create logic declaration
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
            description: None,
            invokes: Vec::new(),
            composed_of: Vec::new(),
            tags: Vec::new(),
        }
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

    /// Invokes another unit
    #[inline]
    #[must_use]
    pub fn invokes(mut self, logic: impl Into<Reference>) -> Self {
        self.invokes.push(logic.into());
        self
    }

    /// Composed of another unit
    #[inline]
    #[must_use]
    pub fn composed_of(mut self, logic: impl Into<Reference>, role: Option<&str>) -> Self {
        self.composed_of.push((logic.into(), role.map(str::to_string)));
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

/// Logic units by name
#[derive(Debug)]
pub struct LogicRegistry {
    store: KeyedRegistry<Logic>,
    config: Arc<RegistryConfig>,
}

impl LogicRegistry {
    /// Create empty registry
    #[must_use]
    pub fn new(config: Arc<RegistryConfig>) -> Self {
        Self {
            store: KeyedRegistry::new(),
            config,
        }
    }

    /// Register a logic unit
    ///
    /// # Errors
    /// Fails if the name or owner is already registered, and with
    /// `eager_cycle_check` if the unit would close a dependency cycle.
    pub fn register(&self, decl: LogicDecl, owner: DeclId) -> Result<String> {
        let logic = Logic {
            invokes: IdentityResolver::resolve_all(&decl.invokes, &self.store),
            composed_of: decl
                .composed_of
                .iter()
                .map(|(logic, role)| Composition {
                    logic: IdentityResolver::resolve(logic, &self.store),
                    role: role.clone(),
                })
                .collect(),
            name: decl.name,
            category: decl.category,
            description: decl.description,
            tags: decl.tags,
        };

        if self.config.eager_cycle_check && !self.store.contains(&logic.name) {
            let mut graph = self.graph();
            graph.add_node(logic.name.clone(), logic.dependencies());
            if let Some(path) = graph.find_cycle(&logic.name) {
                tracing::warn!(logic = %logic.name, cycle = ?path, "logic rejected");
                return Err(GraphError::CycleDetected { path }.into());
            }
        }

        Ok(self.store.register(logic, owner)?)
    }

    /// Lookup by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Entry<Logic>> {
        self.store.get(name)
    }

    /// Units in a category
    #[must_use]
    pub fn by_category(&self, category: &str) -> Vec<Entry<Logic>> {
        self.store.by_index("category", category)
    }

    /// Units carrying a tag
    #[must_use]
    pub fn by_tag(&self, tag: &str) -> Vec<Entry<Logic>> {
        self.store.by_index("tag", tag)
    }

    /// Units that invoke or are composed of `name`
    #[must_use]
    pub fn dependents_of(&self, name: &str) -> Vec<Entry<Logic>> {
        self.store.by_index("depends_on", name)
    }

    /// Dependency graph over every registered unit
    #[must_use]
    pub fn graph(&self) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for entry in self.store.all() {
            graph.add_node(entry.key, entry.metadata.dependencies());
        }
        graph
    }

    /// Check whether a cycle is reachable from `name`
    #[must_use]
    pub fn has_cycle(&self, name: &str) -> bool {
        self.graph().has_cycle(name)
    }

    /// First cycle reachable from `name`, starting and ending on the same unit
    #[must_use]
    pub fn find_cycle(&self, name: &str) -> Option<Vec<String>> {
        self.graph().find_cycle(name)
    }

    /// Fail if any cycle exists
    ///
    /// # Errors
    /// Returns the cycle-detected error with the first cycle found.
    pub fn ensure_acyclic(&self) -> Result<()> {
        Ok(self.graph().ensure_acyclic()?)
    }

    /// Unit names with every dependency before its dependents
    ///
    /// # Errors
    /// Returns the cycle-detected error if the graph is cyclic.
    pub fn dependency_order(&self) -> Result<Vec<String>> {
        Ok(self.graph().topological_order()?)
    }

    /// All units in registration order
    #[must_use]
    pub fn all(&self) -> Vec<Entry<Logic>> {
        self.store.all()
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &KeyedRegistry<Logic> {
        &self.store
    }
}
