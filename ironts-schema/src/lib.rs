//! # IronTS Schema
//!
//! Schema provider for the IronTS TypeScript generator.
//!
//! This crate provides:
//! - The schema graph: an arena of typed nodes addressed by [`NodeId`]
//! - XML schema parsing with two-pass name resolution
//! - Schema validation
//! - The named-type [`Registry`] consumed by the code generator

pub mod error;
pub mod operations;
pub mod parser;
pub mod registry;
pub mod types;
pub mod validation;

pub use error::{ParseError, SchemaError};
pub use operations::{HttpVerb, OperationDef, ResponseDef};
pub use parser::{parse_schema, parse_schema_file};
pub use registry::{Registry, RegistryEntry};
pub use types::{
    BUILTIN_NAMESPACE, Decl, EnumDef, EnumMember, EnumMemberRef, EnumValue, Identity, IndexedKind,
    Intrinsic, Lifecycle, LifecycleSet, ModelDef, NodeId, NodeKind, Primitive, Property,
    ScalarDef, Schema, SchemaNode, TupleDef, UnionDef,
};
pub use validation::validate_schema;
