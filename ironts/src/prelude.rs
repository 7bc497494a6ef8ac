//! Prelude module for convenient imports.
//!
//! ```ignore
//! use ironts::prelude::*;
//! ```

// Schema
pub use ironts_schema::{
    HttpVerb, Lifecycle, NodeId, OperationDef, Registry, Schema, SchemaNode, parse_schema,
    parse_schema_file, validate_schema,
};

// Generation
pub use ironts_codegen::{
    CodegenError, Diagnostic, GeneratedFile, Generator, GeneratorConfig, GeneratorOutput,
    LifecycleMapping, Severity, generate_from_file, generate_from_xml,
};

pub use std::path::Path;
