//! # IronTS Codegen
//!
//! TypeScript generation from IronTS schemas.
//!
//! This crate provides:
//! - The resolution engine, which turns schema nodes into type expressions
//!   and typeguard predicates
//! - Lifecycle visibility filtering through the generated `FilterLifecycle`
//!   helper
//! - Per-namespace declaration files and per-root routed typemaps
//! - Diagnostics with stable `ironts-` codes

pub mod config;
pub mod diagnostics;
pub mod doc;
pub mod error;
pub mod generator;
pub mod resolve;
pub mod typescript;

pub use config::{GeneratorConfig, LifecycleMapping};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::CodegenError;
pub use generator::{GeneratedFile, Generator, GeneratorOutput};
pub use resolve::{Context, Engine, Mode, Resolution};

use ironts_schema::Registry;

/// Generates TypeScript from an XML schema string.
///
/// # Arguments
/// * `xml` - Schema XML content
/// * `config` - Generator options
///
/// # Returns
/// The generated files and any warnings.
///
/// # Errors
/// Returns `CodegenError` if parsing, validation or generation fails.
pub fn generate_from_xml(
    xml: &str,
    config: &GeneratorConfig,
) -> Result<GeneratorOutput, CodegenError> {
    let schema = ironts_schema::parse_schema(xml)?;
    ironts_schema::validate_schema(&schema)?;
    let registry = Registry::from_schema(&schema)?;
    Generator::new(&schema, &registry, config).generate()
}

/// Generates TypeScript from an XML schema file.
///
/// # Arguments
/// * `path` - Path to the schema file
/// * `config` - Generator options
///
/// # Returns
/// The generated files and any warnings.
///
/// # Errors
/// Returns `CodegenError` if reading, parsing, validation or generation fails.
pub fn generate_from_file(
    path: &std::path::Path,
    config: &GeneratorConfig,
) -> Result<GeneratorOutput, CodegenError> {
    let xml = std::fs::read_to_string(path)?;
    generate_from_xml(&xml, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_from_xml() {
        let xml = r#"
            <schema rootNamespaces="Zoo">
              <namespace name="Zoo">
                <model name="Animal"><property name="legs" type="int8"/></model>
              </namespace>
            </schema>
        "#;
        let output = generate_from_xml(xml, &GeneratorConfig::default()).expect("Failed to generate");
        let file = output.file("Zoo.ts").expect("Zoo.ts missing");
        assert!(file.content.contains("export type Animal = {\n  legs: number\n};\n"));
        assert!(output.file("lifecycle.ts").is_none());
    }

    #[test]
    fn test_generate_from_xml_parse_error() {
        let result = generate_from_xml("<schema><namespace>", &GeneratorConfig::default());
        assert!(matches!(result, Err(CodegenError::Parse(_))));
    }

    #[test]
    fn test_generate_from_missing_file() {
        let result = generate_from_file(
            std::path::Path::new("/nonexistent/schema.xml"),
            &GeneratorConfig::default(),
        );
        assert!(matches!(result, Err(CodegenError::Io(_))));
    }
}
