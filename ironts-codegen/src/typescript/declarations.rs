//! Namespace files: one `export` declaration per registered type, plus its
//! typeguard.

use ironts_schema::{NodeKind, RegistryEntry};
use tracing::debug;

use super::lifecycle::LIFECYCLE_GENERIC;
use super::syntax::{doc_comment, file_name};
use super::{GENERATED_HEADER, lifecycle_import, namespace_imports};
use crate::error::CodegenError;
use crate::resolve::{Context, Engine, Mode, Resolution};

/// Generated source of one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceFile {
    /// Namespace path.
    pub namespace: Vec<String>,
    /// File content.
    pub content: String,
    /// Whether the file refers to the lifecycle helpers.
    pub uses_lifecycle: bool,
}

impl NamespaceFile {
    /// File name, e.g. `Store.Pets.ts`.
    #[must_use]
    pub fn file_name(&self) -> String {
        file_name(&self.namespace)
    }
}

/// Generator for the file of one namespace.
pub struct NamespaceGenerator<'e, 'a> {
    engine: &'e mut Engine<'a>,
    namespace: Vec<String>,
}

impl<'e, 'a> NamespaceGenerator<'e, 'a> {
    /// Creates a generator for `namespace`.
    #[must_use]
    pub fn new(engine: &'e mut Engine<'a>, namespace: &[String]) -> Self {
        Self {
            engine,
            namespace: namespace.to_vec(),
        }
    }

    /// Generates the file.
    ///
    /// # Errors
    /// Propagates any fatal resolution error.
    pub fn generate(&mut self) -> Result<NamespaceFile, CodegenError> {
        let registry = self.engine.registry();
        let with_ext = self.engine.config().import_file_extensions;

        let mut imports: Vec<Vec<String>> = Vec::new();
        let mut declarations = Vec::new();
        let mut uses_lifecycle = false;

        let entries: Vec<&RegistryEntry> = registry
            .entries()
            .iter()
            .filter(|e| e.namespace() == self.namespace.as_slice())
            .collect();
        for entry in entries {
            let (text, resolutions, has_visibility) = self.declaration(entry)?;
            uses_lifecycle |= has_visibility;
            for res in &resolutions {
                for ns in &res.imports {
                    if *ns != self.namespace && !imports.contains(ns) {
                        imports.push(ns.clone());
                    }
                }
            }
            declarations.push(text);
        }

        let mut content = String::new();
        content.push_str(GENERATED_HEADER);
        content.push('\n');
        if uses_lifecycle {
            content.push_str(&lifecycle_import(with_ext));
        }
        content.push_str(&namespace_imports(&imports, with_ext));
        if uses_lifecycle || !imports.is_empty() {
            content.push('\n');
        }
        content.push_str(&declarations.join("\n"));

        Ok(NamespaceFile {
            namespace: self.namespace.clone(),
            content,
            uses_lifecycle,
        })
    }

    /// Emits the declaration of one registry entry and, when enabled, its
    /// typeguard.
    fn declaration(
        &mut self,
        entry: &RegistryEntry,
    ) -> Result<(String, Vec<Resolution>, bool), CodegenError> {
        let schema = self.engine.schema();
        let config = self.engine.config();
        let name = entry.name();
        let is_enum = schema.get(entry.node).map(|n| n.kind()) == Some(NodeKind::Enum);
        let has_visibility = self.engine.has_visibility(entry.node);
        let generic = if has_visibility { LIFECYCLE_GENERIC } else { "" };
        debug!(declaration = %entry.identity, has_visibility, "emitting declaration");

        let ctx = Context::new(&self.namespace);
        let ty = self.engine.resolve(Mode::Type, entry.node, &ctx)?;

        let mut output = String::new();
        if let Some(doc) = &ty.doc {
            output.push_str(&doc_comment(doc));
            output.push('\n');
        }
        if is_enum {
            output.push_str(&format!("export enum {name} {}\n", ty.pretty()));
        } else {
            output.push_str(&format!("export type {name}{generic} = {};\n", ty.pretty()));
        }

        let mut resolutions = vec![ty];
        if config.enable_typeguards && !is_enum {
            let guard = self.engine.resolve(Mode::Predicate, entry.node, &ctx)?;
            output.push('\n');
            if has_visibility {
                output.push_str(&format!(
                    "export function is{name}{generic}(t: any, vis: V = Lifecycle.All as V): t is {name}<V> {{\n"
                ));
            } else {
                output.push_str(&format!(
                    "export function is{name}(t: any): t is {name} {{\n"
                ));
            }
            output.push_str(&format!("  return {};\n}}\n", guard.text.pretty_at(2)));
            resolutions.push(guard);
        }
        Ok((output, resolutions, has_visibility))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::resolve::test_support::Fixture;

    const STORE: &str = r#"
        <schema rootNamespaces="Store">
          <namespace name="Store">
            <model name="Pet" doc="A pet">
              <property name="id" type="string" visibility="read"/>
              <property name="name" type="string"/>
              <property name="owner" type="People.Person" optional="true"/>
            </model>
            <enum name="Kind"><member name="Dog"/><member name="Cat"/></enum>
            <namespace name="People">
              <model name="Person"><property name="name" type="string"/></model>
            </namespace>
          </namespace>
        </schema>
    "#;

    fn store(fx: &Fixture, ns: &[&str]) -> NamespaceFile {
        let ns: Vec<String> = ns.iter().map(|s| (*s).to_string()).collect();
        let mut engine = fx.engine();
        NamespaceGenerator::new(&mut engine, &ns)
            .generate()
            .expect("Failed to generate")
    }

    #[test]
    fn test_namespace_file_types_only() {
        let fx = Fixture::new(STORE);
        let file = store(&fx, &["Store"]);
        assert_eq!(file.file_name(), "Store.ts");
        assert!(file.uses_lifecycle);
        assert!(file.content.starts_with(GENERATED_HEADER));
        assert!(
            file.content
                .contains("import {Lifecycle, FilterLifecycle} from './lifecycle';\n")
        );
        assert!(
            file.content
                .contains("import * as Store_People from './Store.People';\n")
        );
        assert!(file.content.contains(
            "/** A pet */\nexport type Pet<V extends Lifecycle = Lifecycle.All> = FilterLifecycle<{\n  id: string,\n"
        ));
        assert!(file.content.contains("  owner?: Store_People.Person\n}"));
        assert!(file.content.contains("export enum Kind {\n  Dog,\n  Cat\n}\n"));
        assert!(!file.content.contains("function"));
    }

    #[test]
    fn test_namespace_file_with_typeguards() {
        let fx = Fixture::with_config(STORE, GeneratorConfig::default().with_typeguards(true));
        let file = store(&fx, &["Store"]);
        assert!(file.content.contains(
            "export function isPet<V extends Lifecycle = Lifecycle.All>(t: any, vis: V = Lifecycle.All as V): t is Pet<V> {\n  return "
        ));
        assert!(file.content.contains("Store_People.isPerson(t['owner'])"));
        assert!(!file.content.contains("function isKind"));

        let people = store(&fx, &["Store", "People"]);
        assert!(!people.uses_lifecycle);
        assert!(people.content.contains(
            "export function isPerson(t: any): t is Person {\n  return t['name'] !== undefined && (typeof t['name'] === 'string');\n}\n"
        ));
        assert!(!people.content.contains("import"));
    }

    #[test]
    fn test_import_extensions() {
        let fx = Fixture::with_config(
            STORE,
            GeneratorConfig::default().with_import_file_extensions(true),
        );
        let file = store(&fx, &["Store"]);
        assert!(file.content.contains("from './Store.People.js';"));
        assert!(file.content.contains("from './lifecycle.js';"));
    }
}
