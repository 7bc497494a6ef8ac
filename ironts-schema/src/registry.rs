//! Named-type registry.
//!
//! The registry indexes every declaration that is emitted under one of the
//! schema's root namespaces, keyed by [`Identity`]. The code generator uses
//! it to decide whether a nested node is referenced by name or expanded
//! inline.

use std::collections::HashMap;

use crate::error::SchemaError;
use crate::types::{Identity, NodeId, NodeKind, Schema};

/// One registered declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Identity of the declaration.
    pub identity: Identity,
    /// Node holding the declaration.
    pub node: NodeId,
}

impl RegistryEntry {
    /// Namespace path the declaration is emitted into.
    #[must_use]
    pub fn namespace(&self) -> &[String] {
        &self.identity.namespace
    }

    /// Declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.identity.name
    }
}

/// Ordered index of identity-bearing declarations.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    index: HashMap<Identity, usize>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry from a schema.
    ///
    /// Every named enum, scalar, model and union declared under one of the
    /// schema's root namespaces is registered in declaration order. When the
    /// schema configures no root namespaces, every declaration qualifies.
    ///
    /// # Errors
    /// Returns `SchemaError::DuplicateIdentity` if two declarations share an
    /// identity.
    pub fn from_schema(schema: &Schema) -> Result<Self, SchemaError> {
        let mut registry = Self::new();
        for &id in &schema.declarations {
            let node = schema.node(id);
            if !matches!(
                node.kind(),
                NodeKind::Enum | NodeKind::Scalar | NodeKind::Model | NodeKind::Union
            ) {
                continue;
            }
            let Some(identity) = node.identity() else {
                continue;
            };
            if !is_rooted(&schema.root_namespaces, &identity.namespace) {
                continue;
            }
            registry.insert(identity, id)?;
        }
        Ok(registry)
    }

    /// Adds an entry.
    ///
    /// # Errors
    /// Returns `SchemaError::DuplicateIdentity` if the identity is already
    /// registered.
    pub fn insert(&mut self, identity: Identity, node: NodeId) -> Result<(), SchemaError> {
        if self.index.contains_key(&identity) {
            return Err(SchemaError::DuplicateIdentity {
                identity: identity.to_string(),
            });
        }
        self.index.insert(identity.clone(), self.entries.len());
        self.entries.push(RegistryEntry { identity, node });
        Ok(())
    }

    /// Looks up an entry by identity.
    #[must_use]
    pub fn find(&self, identity: &Identity) -> Option<&RegistryEntry> {
        self.index.get(identity).map(|&i| &self.entries[i])
    }

    /// Returns true if the identity is registered.
    #[must_use]
    pub fn contains(&self, identity: &Identity) -> bool {
        self.index.contains_key(identity)
    }

    /// Entries in registration order.
    #[must_use]
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Distinct namespace paths in order of first appearance.
    #[must_use]
    pub fn namespaces(&self) -> Vec<Vec<String>> {
        let mut out: Vec<Vec<String>> = Vec::new();
        for entry in &self.entries {
            if !out.iter().any(|ns| ns == entry.namespace()) {
                out.push(entry.namespace().to_vec());
            }
        }
        out
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the registry holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_rooted(roots: &[String], namespace: &[String]) -> bool {
    roots.is_empty() || namespace.first().is_some_and(|first| roots.contains(first))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Decl, ModelDef, SchemaNode};

    fn model(name: &str, ns: &[&str]) -> SchemaNode {
        SchemaNode::Model(ModelDef::new(Decl::named(
            name,
            ns.iter().map(|s| (*s).to_string()).collect(),
        )))
    }

    #[test]
    fn test_registry_filters_by_root_namespace() {
        let mut schema = Schema::new(vec!["Api".into()]);
        let a = schema.add_declaration(model("A", &["Api"]));
        let b = schema.add_declaration(model("B", &["Api", "Nested"]));
        schema.add_declaration(model("C", &["Other"]));

        let registry = Registry::from_schema(&schema).expect("Failed to build registry");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.entries()[0].node, a);
        assert_eq!(registry.entries()[1].node, b);
        assert_eq!(
            registry.namespaces(),
            vec![vec!["Api".to_string()], vec!["Api".to_string(), "Nested".to_string()]]
        );
    }

    #[test]
    fn test_registry_without_roots_takes_everything() {
        let mut schema = Schema::new(Vec::new());
        schema.add_declaration(model("A", &["X"]));
        schema.add_declaration(model("B", &["Y"]));
        let registry = Registry::from_schema(&schema).expect("Failed to build registry");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_registry_find() {
        let mut schema = Schema::new(vec!["Api".into()]);
        let id = schema.add_declaration(model("Pet", &["Api"]));
        let registry = Registry::from_schema(&schema).expect("Failed to build registry");

        let identity = schema.node(id).identity().expect("identity");
        let entry = registry.find(&identity).expect("registered");
        assert_eq!(entry.node, id);
        assert_eq!(entry.name(), "Pet");

        let other = Identity {
            kind: NodeKind::Union,
            name: "Pet".into(),
            namespace: vec!["Api".into()],
        };
        assert!(!registry.contains(&other));
    }

    #[test]
    fn test_registry_rejects_duplicate_identity() {
        let mut registry = Registry::new();
        let identity = Identity {
            kind: NodeKind::Model,
            name: "Pet".into(),
            namespace: vec!["Api".into()],
        };
        let mut schema = Schema::default();
        let id = schema.add_node(model("Pet", &["Api"]));
        registry.insert(identity.clone(), id).expect("first insert");
        let err = registry.insert(identity, id).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateIdentity { .. }));
    }
}
