//! # IronTS
//!
//! TypeScript types and runtime typeguards generated from schemas.
//!
//! IronTS reads a schema of models, enums, unions, scalars and routed
//! operations and emits one TypeScript module per namespace: a type
//! declaration and, optionally, an `is<Name>` typeguard for every named type.
//! Properties restricted to lifecycle states (read, create, update, delete,
//! query) produce declarations generic over the requested lifecycle.
//!
//! ## Quick Start
//!
//! ```ignore
//! use ironts::prelude::*;
//!
//! let config = GeneratorConfig::default().with_typeguards(true);
//! let output = generate_from_file(Path::new("api.xml"), &config)?;
//! output.write_to("generated")?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`schema`] - Schema graph, XML parsing, validation and registry
//! - [`codegen`] - Resolution engine and TypeScript file generation

pub mod prelude;

/// Schema graph, parsing and validation.
pub mod schema {
    pub use ironts_schema::*;
}

/// TypeScript generation.
pub mod codegen {
    pub use ironts_codegen::*;
}

pub use ironts_codegen::{
    CodegenError, GeneratorConfig, GeneratorOutput, generate_from_file, generate_from_xml,
};
pub use ironts_schema::{Registry, Schema, parse_schema};
