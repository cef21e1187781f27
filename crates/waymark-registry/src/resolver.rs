//! Canonical key resolution for references
//!
//! Maps both forms of [`Reference`] onto the key a registry stores the
//! referenced declaration under, so downstream code never has to branch on
//! how a caller chose to point at something.

use crate::decl::Reference;
use crate::store::{Entry, KeyedRegistry, Registrable};

/// Stateless reference resolver
///
/// - `Identity(decl)` resolves to the key `decl` is registered under in the
///   target registry, falling back to the declaration's own name when it has
///   not been registered (yet).
/// - `Name(name)` resolves to `name`.
///
/// A declaration whose declared name equals its registry key therefore
/// resolves identically whichever form the caller used.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver;

impl IdentityResolver {
    /// Create new resolver instance
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Canonical key for a reference
    #[must_use]
    pub fn resolve<M: Registrable>(reference: &Reference, registry: &KeyedRegistry<M>) -> String {
        match reference {
            Reference::Identity(decl) => registry
                .key_for_owner(decl)
                .unwrap_or_else(|| decl.name().to_string()),
            Reference::Name(name) => name.clone(),
        }
    }

    /// Canonical key for an optional reference
    #[inline]
    #[must_use]
    pub fn resolve_opt<M: Registrable>(
        reference: Option<&Reference>,
        registry: &KeyedRegistry<M>,
    ) -> Option<String> {
        reference.map(|r| Self::resolve(r, registry))
    }

    /// Canonical keys for a list of references, order preserved
    #[must_use]
    pub fn resolve_all<M: Registrable>(
        references: &[Reference],
        registry: &KeyedRegistry<M>,
    ) -> Vec<String> {
        references
            .iter()
            .map(|r| Self::resolve(r, registry))
            .collect()
    }

    /// The registered entry a reference points at, if any
    #[must_use]
    pub fn lookup<M: Registrable>(
        reference: &Reference,
        registry: &KeyedRegistry<M>,
    ) -> Option<Entry<M>> {
        match reference {
            Reference::Identity(decl) => registry.get_by_owner(decl),
            Reference::Name(name) => registry.get(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::DeclId;

    #[derive(Debug, Clone)]
    struct Persona {
        name: String,
    }

    impl Registrable for Persona {
        const KIND: &'static str = "persona";

        fn key(&self) -> &str {
            &self.name
        }
    }

    fn registry_with(name: &str, owner: &DeclId) -> KeyedRegistry<Persona> {
        let registry = KeyedRegistry::new();
        registry
            .register(
                Persona {
                    name: name.to_string(),
                },
                owner.clone(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn identity_resolves_to_registered_key() {
        let owner = DeclId::new(["people", "ShopperPersona"]);
        let registry = registry_with("Shopper", &owner);

        let key = IdentityResolver::resolve(&Reference::from(&owner), &registry);
        assert_eq!(key, "Shopper");
    }

    #[test]
    fn identity_falls_back_to_declared_name() {
        let registry: KeyedRegistry<Persona> = KeyedRegistry::new();
        let owner = DeclId::new(["people", "Shopper"]);

        let key = IdentityResolver::resolve(&Reference::from(owner), &registry);
        assert_eq!(key, "Shopper");
    }

    #[test]
    fn identity_and_name_agree() {
        let owner = DeclId::new(["people", "Shopper"]);
        let registry = registry_with("Shopper", &owner);

        let by_identity = IdentityResolver::resolve(&Reference::from(&owner), &registry);
        let by_name = IdentityResolver::resolve(&Reference::from("Shopper"), &registry);

        assert_eq!(by_identity, by_name);
    }

    #[test]
    fn lookup_by_either_form() {
        let owner = DeclId::new(["people", "Shopper"]);
        let registry = registry_with("Shopper", &owner);

        assert!(IdentityResolver::lookup(&Reference::from(&owner), &registry).is_some());
        assert!(IdentityResolver::lookup(&Reference::from("Shopper"), &registry).is_some());
        assert!(IdentityResolver::lookup(&Reference::from("Admin"), &registry).is_none());
    }

    #[test]
    fn resolve_all_preserves_order() {
        let registry: KeyedRegistry<Persona> = KeyedRegistry::new();
        let refs = vec![
            Reference::from("b"),
            Reference::from(DeclId::new(["x", "a"])),
        ];

        assert_eq!(IdentityResolver::resolve_all(&refs, &registry), ["b", "a"]);
    }
}
