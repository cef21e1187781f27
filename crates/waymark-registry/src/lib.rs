//! Waymark Registry
//!
//! Generic multi-index store for declaration metadata.
//!
//! # Overview
//!
//! The registry layer provides:
//! - **DeclId / Reference**: declaration identities and the two ways to point at one
//! - **KeyedRegistry**: primary key store with owner lookup and secondary indexes
//! - **Inheritance**: pending/resolved state for fields pulled from a parent
//! - **IdentityResolver**: canonical keys for references
//!
//! # Example
//!
//! ```rust
//! use waymark_registry::{DeclId, IdentityResolver, KeyedRegistry, Reference, Registrable};
//!
//! #[derive(Debug, Clone)]
//! struct Persona {
//!     name: String,
//! }
//!
//! impl Registrable for Persona {
//!     const KIND: &'static str = "persona";
//!
//!     fn key(&self) -> &str {
//!         &self.name
//!     }
//! }
//!
//! let personas = KeyedRegistry::new();
//! let owner = DeclId::new(["people", "ShopperPersona"]);
//! personas.register(Persona { name: "Shopper".into() }, owner.clone()).unwrap();
//!
//! // A direct reference resolves to the registered name
//! let key = IdentityResolver::resolve(&Reference::from(owner), &personas);
//! assert_eq!(key, "Shopper");
//! ```

#![warn(missing_docs)]

pub mod decl;
pub mod error;
pub mod inherit;
pub mod resolver;
pub mod store;

// Re-exports
pub use decl::{DeclId, DeclIdError, Reference};
pub use error::RegistryError;
pub use inherit::{Inheritance, ResolveReport, Skipped, Unresolved};
pub use resolver::IdentityResolver;
pub use store::{Entry, IndexValue, Inheriting, KeyedRegistry, Registrable, RegistryStats, Upsert};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for registry operations
    pub use crate::{
        DeclId, Entry, IdentityResolver, Inheritance, Inheriting, KeyedRegistry, Reference,
        Registrable, RegistryError, Unresolved,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
