//! Schema validation utilities.
//!
//! The parser already guarantees that every reference resolves; validation
//! checks the structural invariants the code generator relies on.

use std::collections::HashSet;

use crate::error::SchemaError;
use crate::types::{EnumDef, ModelDef, Schema, SchemaNode};

/// Validates a parsed schema for correctness.
///
/// # Arguments
/// * `schema` - The schema to validate
///
/// # Returns
/// Ok(()) if valid, or SchemaError describing the issue.
///
/// # Errors
/// Returns `SchemaError` if an enum repeats a member name, a model repeats a
/// property name, an indexed model has no element type, or a namespace path
/// contains an empty segment.
pub fn validate_schema(schema: &Schema) -> Result<(), SchemaError> {
    for (_, node) in schema.iter() {
        if node.namespace().iter().any(String::is_empty) {
            return Err(SchemaError::EmptyNamespaceSegment {
                path: node.namespace().join("."),
            });
        }
        match node {
            SchemaNode::Enum(def) => validate_enum(def)?,
            SchemaNode::Model(def) => validate_model(def)?,
            _ => {}
        }
    }
    for op in &schema.operations {
        if op.namespace.iter().any(String::is_empty) {
            return Err(SchemaError::EmptyNamespaceSegment {
                path: op.namespace.join("."),
            });
        }
    }
    Ok(())
}

fn validate_enum(def: &EnumDef) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for member in &def.members {
        if !seen.insert(member.name.as_str()) {
            return Err(SchemaError::DuplicateEnumMember {
                enum_name: display_name(def.decl.name.as_deref()),
                member: member.name.clone(),
            });
        }
    }
    Ok(())
}

fn validate_model(def: &ModelDef) -> Result<(), SchemaError> {
    if def.indexed_kind().is_some() && def.indexer.is_none() {
        return Err(SchemaError::MalformedIndexedModel {
            name: display_name(def.decl.name.as_deref()),
        });
    }

    let mut seen = HashSet::new();
    for prop in &def.properties {
        if !seen.insert(prop.name.as_str()) {
            return Err(SchemaError::DuplicateProperty {
                model: display_name(def.decl.name.as_deref()),
                property: prop.name.clone(),
            });
        }
    }
    Ok(())
}

fn display_name(name: Option<&str>) -> String {
    name.unwrap_or("<anonymous>").to_string()
}
