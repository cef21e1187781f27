//! Domain event and handler registry
//!
//! Handlers are keyed by `{event}::{handler}` and listed per event in
//! descending priority; equal priorities keep registration order. Declaring
//! a handler again updates it in place.

use crate::error::Result;
use serde::Serialize;
use waymark_registry::{
    DeclId, Entry, IdentityResolver, IndexValue, KeyedRegistry, Reference, Registrable, Upsert,
};

/// A registered domain event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainEvent {
    /// Declared name (registry key)
    pub name: String,
    /// Aggregate that raises the event
    pub aggregate: Option<String>,
    /// Free-form description
    pub description: Option<String>,
    /// Payload field names
    pub payload: Vec<String>,
}

impl DomainEvent {
    /// Create event
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aggregate: None,
            description: None,
            payload: Vec::new(),
        }
    }

    /// Raised by aggregate
    #[inline]
    #[must_use]
    pub fn on_aggregate(mut self, aggregate: impl Into<String>) -> Self {
        self.aggregate = Some(aggregate.into());
        self
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With payload field
    #[inline]
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.payload.push(field.into());
        self
    }
}

impl Registrable for DomainEvent {
    const KIND: &'static str = "event";

    fn key(&self) -> &str {
        &self.name
    }

    fn index_values(&self) -> Vec<IndexValue> {
        self.aggregate.iter().map(|a| ("aggregate", a.clone())).collect()
    }
}

/// A registered event handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventHandler {
    key: String,
    /// Event handled (canonical name)
    pub event: String,
    /// Handler name
    pub handler: String,
    /// Higher runs first
    pub priority: i64,
    /// Free-form description
    pub description: Option<String>,
}

impl EventHandler {
    /// Registry key, `{event}::{handler}`
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.key
    }
}

impl Registrable for EventHandler {
    const KIND: &'static str = "event_handler";

    fn key(&self) -> &str {
        &self.key
    }

    fn index_values(&self) -> Vec<IndexValue> {
        vec![("event", self.event.clone())]
    }

    fn rank(&self) -> Option<i64> {
        Some(self.priority)
    }
}

/// A handler as declared
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerDecl {
    /// Event reference
    pub event: Reference,
    /// Handler name
    pub handler: String,
    /// Higher runs first
    pub priority: i64,
    /// Free-form description
    pub description: Option<String>,
}

impl HandlerDecl {
    /// Create handler declaration with priority 0
    #[must_use]
    pub fn new(event: impl Into<Reference>, handler: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            handler: handler.into(),
            priority: 0,
            description: None,
        }
    }

    /// With priority
    #[inline]
    #[must_use]
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
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

/// Domain events by name, handlers by event
#[derive(Debug, Default)]
pub struct EventRegistry {
    events: KeyedRegistry<DomainEvent>,
    handlers: KeyedRegistry<EventHandler>,
}

impl EventRegistry {
    /// Create empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a domain event
    ///
    /// # Errors
    /// Fails if the name or the owning declaration is already registered.
    pub fn register_event(&self, event: DomainEvent, owner: DeclId) -> Result<String> {
        Ok(self.events.register(event, owner)?)
    }

    /// Register a handler, or update its priority if already registered
    ///
    /// # Errors
    /// Fails if `owner` already owns a different handler.
    pub fn register_handler(&self, decl: HandlerDecl, owner: DeclId) -> Result<Upsert> {
        let event = IdentityResolver::resolve(&decl.event, &self.events);
        let handler = EventHandler {
            key: format!("{event}::{}", decl.handler),
            event,
            handler: decl.handler,
            priority: decl.priority,
            description: decl.description,
        };
        Ok(self.handlers.upsert(handler, owner)?)
    }

    /// Lookup event by name
    #[must_use]
    pub fn get_event(&self, name: &str) -> Option<Entry<DomainEvent>> {
        self.events.get(name)
    }

    /// Lookup handler by `{event}::{handler}`
    #[must_use]
    pub fn get_handler(&self, key: &str) -> Option<Entry<EventHandler>> {
        self.handlers.get(key)
    }

    /// Events raised by an aggregate
    #[must_use]
    pub fn by_aggregate(&self, aggregate: &str) -> Vec<Entry<DomainEvent>> {
        self.events.by_index("aggregate", aggregate)
    }

    /// Handlers of an event, highest priority first
    #[must_use]
    pub fn handlers_for(&self, event: &str) -> Vec<Entry<EventHandler>> {
        self.handlers.by_index("event", event)
    }

    /// All events in registration order
    #[must_use]
    pub fn events(&self) -> Vec<Entry<DomainEvent>> {
        self.events.all()
    }

    /// All handlers in registration order
    #[must_use]
    pub fn handlers(&self) -> Vec<Entry<EventHandler>> {
        self.handlers.all()
    }

    /// Underlying event store
    #[inline]
    #[must_use]
    pub fn event_store(&self) -> &KeyedRegistry<DomainEvent> {
        &self.events
    }

    /// Underlying handler store
    #[inline]
    #[must_use]
    pub fn handler_store(&self) -> &KeyedRegistry<EventHandler> {
        &self.handlers
    }

    /// Remove every event and handler
    pub fn clear(&self) {
        self.events.clear();
        self.handlers.clear();
    }
}
