//! Top-level generator: runs every emitter over a schema and collects the
//! resulting files.

use std::fs;
use std::path::{Path, PathBuf};

use ironts_schema::{Registry, Schema};
use tracing::info;

use crate::config::GeneratorConfig;
use crate::diagnostics::Diagnostic;
use crate::error::CodegenError;
use crate::resolve::Engine;
use crate::typescript::{
    LIFECYCLE_FILE, NamespaceGenerator, RoutedTypemapGenerator, lifecycle_module,
};

/// One generated file, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// File name.
    pub path: PathBuf,
    /// File content.
    pub content: String,
}

/// Everything produced by one generation run.
#[derive(Debug, Clone, Default)]
pub struct GeneratorOutput {
    /// Generated files in emission order.
    pub files: Vec<GeneratedFile>,
    /// Warnings reported along the way.
    pub diagnostics: Vec<Diagnostic>,
}

impl GeneratorOutput {
    /// Finds a generated file by name.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.path == Path::new(name))
    }

    /// Writes every file below `dir`, creating it if needed.
    ///
    /// # Errors
    /// Returns `CodegenError::Io` if a directory or file cannot be written.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<(), CodegenError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        for file in &self.files {
            fs::write(dir.join(&file.path), &file.content)?;
        }
        info!(files = self.files.len(), dir = %dir.display(), "wrote generated files");
        Ok(())
    }
}

/// TypeScript generator over a parsed schema.
pub struct Generator<'a> {
    schema: &'a Schema,
    registry: &'a Registry,
    config: &'a GeneratorConfig,
}

impl<'a> Generator<'a> {
    /// Creates a new generator.
    #[must_use]
    pub fn new(schema: &'a Schema, registry: &'a Registry, config: &'a GeneratorConfig) -> Self {
        Self {
            schema,
            registry,
            config,
        }
    }

    /// Generates all files.
    ///
    /// # Errors
    /// Returns `CodegenError::InvalidConfig` for inconsistent options, or the
    /// first fatal resolution error.
    pub fn generate(&self) -> Result<GeneratorOutput, CodegenError> {
        self.config.validate()?;
        let mut engine = Engine::new(self.schema, self.registry, self.config);
        let mut output = GeneratorOutput::default();
        let mut uses_lifecycle = false;

        if self.config.enable_types {
            for namespace in self.registry.namespaces() {
                let file = NamespaceGenerator::new(&mut engine, &namespace).generate()?;
                uses_lifecycle |= file.uses_lifecycle;
                output.files.push(GeneratedFile {
                    path: PathBuf::from(file.file_name()),
                    content: file.content,
                });
            }
        }

        if self.config.enable_routed_typemap {
            let roots = RoutedTypemapGenerator::roots(
                &self.schema.operations,
                &self.schema.root_namespaces,
            );
            for root in &roots {
                let file = RoutedTypemapGenerator::new(&mut engine, root).generate()?;
                uses_lifecycle = true;
                output.files.push(GeneratedFile {
                    path: PathBuf::from(file.file_name()),
                    content: file.content,
                });
            }
        }

        if uses_lifecycle {
            output.files.push(GeneratedFile {
                path: PathBuf::from(LIFECYCLE_FILE),
                content: lifecycle_module(),
            });
        }

        output.diagnostics = engine.take_diagnostics().into_vec();
        info!(
            files = output.files.len(),
            diagnostics = output.diagnostics.len(),
            "generation finished"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironts_schema::parse_schema;

    const SCHEMA: &str = r#"
        <schema rootNamespaces="Shop">
          <namespace name="Shop">
            <model name="Item">
              <property name="sku" type="string" visibility="read"/>
              <property name="price" type="float64"/>
            </model>
            <namespace name="Tags">
              <enum name="Tag"><member name="New"/></enum>
            </namespace>
            <operation name="add" verb="post" path="/items">
              <request type="Item"/>
              <response status="201" type="Item"/>
            </operation>
          </namespace>
        </schema>
    "#;

    fn run(config: GeneratorConfig) -> Result<GeneratorOutput, CodegenError> {
        let schema = parse_schema(SCHEMA).expect("Failed to parse");
        let registry = Registry::from_schema(&schema).expect("Failed to build registry");
        Generator::new(&schema, &registry, &config).generate()
    }

    #[test]
    fn test_generate_namespace_files() {
        let output = run(GeneratorConfig::default()).expect("Failed to generate");
        let names: Vec<_> = output
            .files
            .iter()
            .map(|f| f.path.display().to_string())
            .collect();
        assert_eq!(names, vec!["Shop.ts", "Shop.Tags.ts", "lifecycle.ts"]);
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_generate_routed_typemap() {
        let config = GeneratorConfig::default()
            .with_typeguards(true)
            .with_routed_typemap(true);
        let output = run(config).expect("Failed to generate");
        let routed = output
            .file("routedTypemap_Shop.ts")
            .expect("routed typemap missing");
        assert!(routed.content.contains("['/items']"));
        assert!(
            output
                .file("Shop.ts")
                .is_some_and(|f| f.content.contains("export function isItem"))
        );
        assert_eq!(
            output.files.last().map(|f| f.path.clone()),
            Some(PathBuf::from(LIFECYCLE_FILE))
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = GeneratorConfig::default()
            .with_types(false)
            .with_typeguards(true);
        assert!(matches!(run(config), Err(CodegenError::InvalidConfig { .. })));
    }

    #[test]
    fn test_types_disabled_emits_nothing() {
        let output = run(GeneratorConfig::default().with_types(false)).expect("Failed to generate");
        assert!(output.files.is_empty());
    }

    #[test]
    fn test_write_to() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let output = run(GeneratorConfig::default()).expect("Failed to generate");
        output.write_to(dir.path().join("out")).expect("Failed to write");
        let written = fs::read_to_string(dir.path().join("out").join("Shop.Tags.ts"))
            .expect("Failed to read");
        assert!(written.contains("export enum Tag"));
    }
}
