//! Routed typemap files: one `types_<Root>` map per root namespace, keyed by
//! route path and HTTP verb, giving the request and response bodies of every
//! operation.

use ironts_schema::{HttpVerb, LifecycleSet, NodeId, OperationDef};
use tracing::debug;

use super::lifecycle::LIFECYCLE_GENERIC;
use super::syntax::{doc_comment, quote};
use super::{GENERATED_HEADER, lifecycle_import, namespace_imports};
use crate::diagnostics::Diagnostic;
use crate::error::CodegenError;
use crate::resolve::visibility::bound_lifecycle_param;
use crate::resolve::{Context, DEFAULT_LIFECYCLE_PARAM, Engine, Mode, Resolution};

/// Status assumed for responses that do not declare one.
pub const DEFAULT_STATUS: u16 = 200;

/// Generated routed typemap of one root namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedTypemapFile {
    /// Root namespace, dot separated.
    pub root: String,
    /// File content.
    pub content: String,
}

impl RoutedTypemapFile {
    /// File name, e.g. `routedTypemap_Store.ts`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("routedTypemap_{}.ts", self.root.replace('.', "_"))
    }
}

struct Route {
    path: String,
    verbs: Vec<(HttpVerb, String)>,
}

/// Generator for the routed typemap of one root namespace.
pub struct RoutedTypemapGenerator<'e, 'a> {
    engine: &'e mut Engine<'a>,
    root: Vec<String>,
}

impl<'e, 'a> RoutedTypemapGenerator<'e, 'a> {
    /// Creates a generator for the operations declared under `root`
    /// (dot separated).
    #[must_use]
    pub fn new(engine: &'e mut Engine<'a>, root: &str) -> Self {
        Self {
            engine,
            root: root.split('.').map(str::to_string).collect(),
        }
    }

    /// Root namespaces that get a routed typemap: the schema's configured
    /// roots, or the outermost namespace of every operation when none are
    /// configured.
    #[must_use]
    pub fn roots(operations: &[OperationDef], configured: &[String]) -> Vec<String> {
        if !configured.is_empty() {
            return configured.to_vec();
        }
        let mut roots: Vec<String> = Vec::new();
        for root in operations.iter().filter_map(OperationDef::root_namespace) {
            if !roots.iter().any(|r| r == root) {
                roots.push(root.to_string());
            }
        }
        roots
    }

    /// Generates the file.
    ///
    /// # Errors
    /// Propagates any fatal resolution error.
    pub fn generate(&mut self) -> Result<RoutedTypemapFile, CodegenError> {
        let schema = self.engine.schema();
        let with_ext = self.engine.config().import_file_extensions;
        let root = self.root.clone();

        let mut imports: Vec<Vec<String>> = Vec::new();
        let mut routes: Vec<Route> = Vec::new();

        let operations = schema
            .operations
            .iter()
            .filter(|op| op.namespace.starts_with(&root));
        for op in operations {
            let route_index = match routes.iter().position(|r| r.path == op.path) {
                Some(index) => index,
                None => {
                    routes.push(Route {
                        path: op.path.clone(),
                        verbs: Vec::new(),
                    });
                    routes.len() - 1
                }
            };
            if routes[route_index].verbs.iter().any(|(v, _)| *v == op.verb) {
                self.engine.report(Diagnostic::warning(
                    "routed-typemap-duplicate-route",
                    format!(
                        "operation '{}' repeats route {} {}; keeping the first",
                        op.name, op.verb, op.path
                    ),
                ));
                continue;
            }

            debug!(operation = %op.name, verb = %op.verb, path = %op.path, "emitting route");
            let (entry, resolutions) = self.operation(op)?;
            for res in &resolutions {
                for ns in &res.imports {
                    if !imports.contains(ns) {
                        imports.push(ns.clone());
                    }
                }
            }
            routes[route_index].verbs.push((op.verb, entry));
        }

        let mut content = String::new();
        content.push_str(GENERATED_HEADER);
        content.push('\n');
        content.push_str(&lifecycle_import(with_ext));
        content.push_str(&namespace_imports(&imports, with_ext));
        content.push('\n');

        let alias = root.join("_");
        if routes.is_empty() {
            content.push_str(&format!("export type types_{alias}{LIFECYCLE_GENERIC} = {{}};\n"));
        } else {
            content.push_str(&format!("export type types_{alias}{LIFECYCLE_GENERIC} = {{\n"));
            for route in &routes {
                content.push_str(&format!("  [{}]: {{\n", quote(&route.path)));
                for (_, entry) in &route.verbs {
                    content.push_str(entry);
                }
                content.push_str("  };\n");
            }
            content.push_str("};\n");
        }

        Ok(RoutedTypemapFile {
            root: root.join("."),
            content,
        })
    }

    /// Renders the entry of one verb under its route.
    fn operation(&mut self, op: &OperationDef) -> Result<(String, Vec<Resolution>), CodegenError> {
        let mapping = &self.engine.config().lifecycle_mapping;
        let emit_docs = self.engine.config().emit_docs;

        let request_param = match mapping.request_states(op.verb) {
            Some(states) => Self::param(states),
            None => {
                self.engine.report(Diagnostic::warning(
                    "routed-typemap-unmapped-verb",
                    format!(
                        "no lifecycle is mapped to {}; the request of '{}' is left unfiltered",
                        op.verb, op.name
                    ),
                ));
                DEFAULT_LIFECYCLE_PARAM.to_string()
            }
        };
        let response_param = Self::param(&mapping.response);

        let mut resolutions = Vec::new();
        let request = self.body(op.request, &request_param, &mut resolutions)?;

        let mut responses = Vec::with_capacity(op.responses.len());
        for response in &op.responses {
            let body = self.body(response.body, &response_param, &mut resolutions)?;
            let status = response.status.unwrap_or(DEFAULT_STATUS);
            responses.push(format!("{{status: {status}, body: {body}}}"));
        }
        let response = if responses.is_empty() {
            "void".to_string()
        } else {
            responses.join(" | ")
        };

        let mut entry = String::new();
        if emit_docs && let Some(doc) = &op.doc {
            for line in doc_comment(doc).lines() {
                entry.push_str(&format!("    {line}\n"));
            }
        }
        entry.push_str(&format!("    [{}]: {{\n", quote(op.verb.as_str())));
        entry.push_str(&format!("      request: {request};\n"));
        entry.push_str(&format!("      response: {response};\n"));
        entry.push_str("    };\n");
        Ok((entry, resolutions))
    }

    /// Type text of a request or response body; `null` when there is none.
    fn body(
        &mut self,
        body: Option<NodeId>,
        param: &str,
        resolutions: &mut Vec<Resolution>,
    ) -> Result<String, CodegenError> {
        let Some(id) = body else {
            return Ok("null".to_string());
        };
        let ctx = Context::detached().with_lifecycle_param(param);
        let res = self.engine.resolve(Mode::Type, id, &ctx)?;
        let text = res.text.pretty_at(3);
        resolutions.push(res);
        Ok(text)
    }

    fn param(states: &LifecycleSet) -> String {
        if states.is_empty() {
            DEFAULT_LIFECYCLE_PARAM.to_string()
        } else {
            bound_lifecycle_param(DEFAULT_LIFECYCLE_PARAM, states)
        }
    }
}
