//! Resolution engine.
//!
//! [`Engine::resolve`] turns one schema node into either a TypeScript type
//! expression ([`Mode::Type`]) or a boolean predicate expression
//! ([`Mode::Predicate`]). Nested nodes that are registered under a name are
//! referenced instead of expanded, which is what bounds recursion on cyclic
//! schemas: only the root of a resolution is ever expanded in full.

mod dispatch;
mod enums;
mod indexed;
mod model;
mod primitive;
mod scalar;
mod tuple;
mod union;
pub mod visibility;

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use ironts_schema::{NodeId, NodeKind, Registry, RegistryEntry, Schema, SchemaNode};
use tracing::trace;

use crate::config::GeneratorConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::doc::Doc;
use crate::error::CodegenError;
use crate::typescript::syntax::namespace_alias;

pub use dispatch::{ResolverKind, classify};
pub use visibility::{VisibilityEntry, VisibilityMap};

/// Name of the lifecycle type parameter of generic declarations.
pub const DEFAULT_LIFECYCLE_PARAM: &str = "V";

/// Which of the two parallel outputs to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// TypeScript type expression.
    Type,
    /// Boolean predicate over the value reached by the context's accessor.
    Predicate,
}

impl Mode {
    /// Short name used in diagnostic codes.
    #[must_use]
    pub const fn code_name(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Predicate => "typeguard",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code_name())
    }
}

#[derive(Debug)]
struct Frame {
    node: NodeId,
    parent: Option<Rc<Frame>>,
}

/// Immutable per-call resolution state.
///
/// Child contexts are derived with [`Context::enter`]; the ancestry is a
/// persistent list, so deriving a child never affects the parent.
#[derive(Debug, Clone)]
pub struct Context {
    depth: usize,
    accessor: Rc<str>,
    ancestry: Option<Rc<Frame>>,
    root_locked: bool,
    target_namespace: Option<Rc<[String]>>,
    lifecycle_param: Rc<str>,
}

impl Context {
    /// Creates the context for resolving a declaration emitted into the
    /// file of `namespace`.
    #[must_use]
    pub fn new(namespace: &[String]) -> Self {
        Self {
            depth: 0,
            accessor: Rc::from("t"),
            ancestry: None,
            root_locked: false,
            target_namespace: Some(Rc::from(namespace)),
            lifecycle_param: Rc::from(DEFAULT_LIFECYCLE_PARAM),
        }
    }

    /// Creates a context that belongs to no file: every registered node,
    /// including the root, becomes a qualified, imported reference.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            depth: 0,
            accessor: Rc::from("t"),
            ancestry: None,
            root_locked: true,
            target_namespace: None,
            lifecycle_param: Rc::from(DEFAULT_LIFECYCLE_PARAM),
        }
    }

    /// Returns a copy with a different accessor.
    #[must_use]
    pub fn with_accessor(&self, accessor: impl AsRef<str>) -> Self {
        Self {
            accessor: Rc::from(accessor.as_ref()),
            ..self.clone()
        }
    }

    /// Returns a copy whose lifecycle type argument is `param`.
    #[must_use]
    pub fn with_lifecycle_param(&self, param: impl AsRef<str>) -> Self {
        Self {
            lifecycle_param: Rc::from(param.as_ref()),
            ..self.clone()
        }
    }

    /// Context for the children of `node`: one level deeper, with `node`
    /// pushed onto the ancestry and the root identity locked.
    #[must_use]
    pub fn enter(&self, node: NodeId) -> Self {
        let mut child = self.enter_flat(node);
        child.depth += 1;
        child
    }

    /// Like [`Context::enter`] without adding a nesting level.
    #[must_use]
    pub fn enter_flat(&self, node: NodeId) -> Self {
        Self {
            ancestry: Some(Rc::new(Frame {
                node,
                parent: self.ancestry.clone(),
            })),
            root_locked: true,
            ..self.clone()
        }
    }

    /// Nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Expression reaching the value under test.
    #[must_use]
    pub fn accessor(&self) -> &str {
        &self.accessor
    }

    /// Lifecycle type argument used by references and wrappers.
    #[must_use]
    pub fn lifecycle_param(&self) -> &str {
        &self.lifecycle_param
    }

    /// Namespace of the file being generated.
    #[must_use]
    pub fn target_namespace(&self) -> Option<&[String]> {
        self.target_namespace.as_deref()
    }

    /// Returns true once the root of the resolution has been entered.
    #[must_use]
    pub fn is_root_locked(&self) -> bool {
        self.root_locked
    }

    /// Node whose children are being resolved.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.ancestry.as_ref().map(|f| f.node)
    }

    /// Nodes being expanded, innermost first.
    pub fn ancestors(&self) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.ancestry.as_deref(), |f| f.parent.as_deref()).map(|f| f.node)
    }

    /// Returns true if `node` is being expanded higher up.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.ancestors().any(|n| n == node)
    }
}

/// Output of one resolve call.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Generated expression.
    pub text: Doc,
    /// Namespace paths that must be imported, without duplicates.
    pub imports: Vec<Vec<String>>,
    /// Whether anything reachable from the node carries a lifecycle
    /// restriction.
    pub has_visibility: bool,
    /// Per-property lifecycle restrictions of an expanded model.
    pub visibility_map: Option<VisibilityMap>,
    /// Documentation of the root node.
    pub doc: Option<String>,
}

impl Resolution {
    /// Creates a resolution holding only text.
    #[must_use]
    pub fn new(text: impl Into<Doc>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Records an import requirement.
    pub fn add_import(&mut self, namespace: &[String]) {
        if !self.imports.iter().any(|ns| ns == namespace) {
            self.imports.push(namespace.to_vec());
        }
    }

    /// Unions the imports of a child resolution into this one.
    pub fn merge_imports(&mut self, child: &Resolution) {
        for ns in &child.imports {
            self.add_import(ns);
        }
    }

    /// Single-line text.
    #[must_use]
    pub fn flat(&self) -> String {
        self.text.flat()
    }

    /// Multi-line text.
    #[must_use]
    pub fn pretty(&self) -> String {
        self.text.pretty()
    }

    /// Single-line rendering of the visibility map; empty when there is none.
    #[must_use]
    pub fn visibility_map_text(&self) -> String {
        self.visibility_map
            .as_ref()
            .map(|m| m.to_doc().flat())
            .unwrap_or_default()
    }
}

/// Recursive resolver over one schema and registry.
pub struct Engine<'a> {
    schema: &'a Schema,
    registry: &'a Registry,
    config: &'a GeneratorConfig,
    diagnostics: Diagnostics,
    visibility_cache: HashMap<NodeId, bool>,
}

impl<'a> Engine<'a> {
    /// Creates a new engine.
    #[must_use]
    pub fn new(schema: &'a Schema, registry: &'a Registry, config: &'a GeneratorConfig) -> Self {
        Self {
            schema,
            registry,
            config,
            diagnostics: Diagnostics::new(),
            visibility_cache: HashMap::new(),
        }
    }

    /// The schema being resolved.
    #[must_use]
    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// The registry of named types.
    #[must_use]
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// The generator configuration.
    #[must_use]
    pub fn config(&self) -> &'a GeneratorConfig {
        self.config
    }

    /// Diagnostics collected so far.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Takes the collected diagnostics, leaving the engine's list empty.
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// Records a diagnostic.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.report(diagnostic);
    }

    /// Resolves a node.
    ///
    /// # Arguments
    /// * `mode` - Which output to produce
    /// * `id` - Node to resolve
    /// * `ctx` - Call context; a root call has its identity unlocked
    ///
    /// # Errors
    /// Returns a contract-violation `CodegenError` (after reporting an error
    /// diagnostic) if the node kind is unsupported, a resolver receives a
    /// malformed node, or an unregistered node references itself.
    pub fn resolve(
        &mut self,
        mode: Mode,
        id: NodeId,
        ctx: &Context,
    ) -> Result<Resolution, CodegenError> {
        let schema = self.schema;
        let Some(node) = schema.get(id) else {
            let err = CodegenError::DanglingNode {
                node: id.to_string(),
            };
            return Err(self.fatal("resolve-unresolved", err));
        };
        let kind = match classify(node) {
            Ok(kind) => kind,
            Err(err) => return Err(self.fatal("resolve-unresolved", err)),
        };
        trace!(depth = ctx.depth(), node = %id, ?kind, %mode, "resolve");

        let has_visibility = self.has_visibility(id);

        if ctx.is_root_locked()
            && let Some(identity) = node.identity()
            && let Some(entry) = self.registry.find(&identity)
        {
            return Ok(self.reference(mode, node, entry, has_visibility, ctx));
        }

        if ctx.contains(id) {
            let name = node.qualified_name().unwrap_or_else(|| id.to_string());
            return Err(self.fatal(
                "resolve-unresolvable-cycle",
                CodegenError::UnresolvableCycle { name },
            ));
        }

        let resolver = kind.resolver();
        let mut resolution = match mode {
            Mode::Type => resolver.emit_type(self, id, ctx)?,
            Mode::Predicate => resolver.emit_predicate(self, id, ctx)?,
        };
        resolution.has_visibility = has_visibility;
        if mode == Mode::Type && !ctx.is_root_locked() && self.config.emit_docs {
            resolution.doc = node.doc().map(str::to_string);
        }
        Ok(resolution)
    }

    /// Returns true if a lifecycle restriction is reachable from `id`,
    /// following properties, bases, indexers, tuple elements and union
    /// variants.
    pub fn has_visibility(&mut self, id: NodeId) -> bool {
        if let Some(&cached) = self.visibility_cache.get(&id) {
            return cached;
        }
        let found = visibility::reaches_restriction(self.schema, id);
        self.visibility_cache.insert(id, found);
        found
    }

    /// Renders a reference to a registered declaration.
    fn reference(
        &self,
        mode: Mode,
        node: &SchemaNode,
        entry: &RegistryEntry,
        has_visibility: bool,
        ctx: &Context,
    ) -> Resolution {
        let same_file = ctx.target_namespace() == Some(entry.namespace());
        let prefix = if same_file {
            String::new()
        } else {
            format!("{}.", namespace_alias(entry.namespace()))
        };
        let name = entry.name();

        let text = match mode {
            Mode::Type if has_visibility => format!("{prefix}{name}<{}>", ctx.lifecycle_param()),
            Mode::Type => format!("{prefix}{name}"),
            Mode::Predicate if node.kind() == NodeKind::Enum => return Resolution::new("true"),
            Mode::Predicate if has_visibility => {
                format!("{prefix}is{name}({}, vis)", ctx.accessor())
            }
            Mode::Predicate => format!("{prefix}is{name}({})", ctx.accessor()),
        };

        let mut resolution = Resolution::new(text);
        resolution.has_visibility = has_visibility;
        if !same_file {
            resolution.add_import(entry.namespace());
        }
        resolution
    }

    /// Returns true if the node whose children are being resolved is a
    /// model, shaped or indexed.
    pub(crate) fn parent_is_model(&self, ctx: &Context) -> bool {
        ctx.parent()
            .and_then(|p| self.schema.get(p))
            .is_some_and(|n| n.kind() == NodeKind::Model)
    }

    /// Fetches a node through a kind-specific projection, failing with a
    /// kind mismatch if the node is not what the resolver expects.
    pub(crate) fn node_as<T: ?Sized>(
        &mut self,
        mode: Mode,
        id: NodeId,
        expected: &str,
        project: impl FnOnce(&'a SchemaNode) -> Option<&'a T>,
    ) -> Result<&'a T, CodegenError> {
        let schema = self.schema;
        let node = schema.get(id);
        if let Some(value) = node.and_then(project) {
            return Ok(value);
        }
        let found = node.map_or_else(|| "missing".to_string(), |n| n.kind().to_string());
        let err = CodegenError::KindMismatch {
            expected: expected.to_string(),
            found,
            node: id.to_string(),
        };
        Err(self.fatal(&format!("resolve-{}-typeclass-mismatch", mode.code_name()), err))
    }

    /// Reports a fatal error and hands it back for propagation.
    pub(crate) fn fatal(&mut self, code: &str, err: CodegenError) -> CodegenError {
        self.report(Diagnostic::error(code, err.to_string()));
        err
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::Fixture;
    use super::*;

    const CYCLIC: &str = r#"
        <schema rootNamespaces="G">
          <namespace name="G">
            <model name="Tree">
              <property name="value" type="string"/>
              <property name="children"><array type="Tree"/></property>
              <property name="parent" type="Tree" optional="true"/>
            </model>
            <model name="A"><property name="b" type="B" optional="true"/></model>
            <model name="B"><property name="a" type="A" optional="true"/></model>
          </namespace>
        </schema>
    "#;

    #[test]
    fn test_primitive_scenario() {
        let fx = Fixture::new(
            r#"<schema><namespace name="T">
                 <model name="M"><property name="n"><number value="42"/></property></model>
               </namespace></schema>"#,
        );
        let n = fx.prop("T.M", "n");
        assert_eq!(fx.nested(Mode::Type, n, &["T"]).flat(), "42");
        let pred = fx.engine().resolve(
            Mode::Predicate,
            n,
            &Context::new(&["T".to_string()]).with_accessor("x"),
        );
        assert_eq!(pred.expect("Failed to resolve").flat(), "x === 42");
    }

    #[test]
    fn test_self_reference_terminates() {
        let fx = Fixture::new(CYCLIC);
        let tree = fx.root(Mode::Type, "G.Tree");
        assert_eq!(
            tree.flat(),
            "{value: string, children: (Tree)[], parent?: Tree}"
        );
        assert!(tree.imports.is_empty());

        let guard = fx.root(Mode::Predicate, "G.Tree");
        assert!(guard.flat().contains("v['children'].every((e) => isTree(e))"));
        assert!(guard.flat().contains("v['parent'] === undefined || (isTree(v['parent']))"));
    }

    #[test]
    fn test_mutual_reference_terminates() {
        let fx = Fixture::new(CYCLIC);
        assert_eq!(fx.root(Mode::Type, "G.A").flat(), "{b?: B}");
        assert_eq!(fx.root(Mode::Type, "G.B").flat(), "{a?: A}");
    }

    #[test]
    fn test_detached_root_is_a_reference() {
        let fx = Fixture::new(CYCLIC);
        let mut engine = fx.engine();
        let res = engine
            .resolve(Mode::Type, fx.id("G.Tree"), &Context::detached())
            .expect("Failed to resolve");
        assert_eq!(res.flat(), "G.Tree");
        assert_eq!(res.imports, vec![vec!["G".to_string()]]);
    }

    #[test]
    fn test_determinism() {
        let fx = Fixture::with_config(CYCLIC, GeneratorConfig::default().with_typeguards(true));
        for mode in [Mode::Type, Mode::Predicate] {
            let first = fx.root(mode, "G.Tree");
            let second = fx.root(mode, "G.Tree");
            assert_eq!(first.pretty(), second.pretty());
            assert_eq!(first.imports, second.imports);
        }
    }

    #[test]
    fn test_unsupported_kind_is_fatal() {
        let fx = Fixture::new(
            r#"<schema rootNamespaces="T"><namespace name="T">
                 <model name="M"><property name="x"><opaque kind="Interface"/></property></model>
               </namespace></schema>"#,
        );
        let mut engine = fx.engine();
        let ctx = Context::new(&["T".to_string()]);
        let err = engine
            .resolve(Mode::Type, fx.id("T.M"), &ctx)
            .unwrap_err();
        assert!(matches!(err, CodegenError::UnsupportedKind { ref kind } if kind == "Interface"));
        assert!(err.is_contract_violation());
        assert!(engine.diagnostics().has_errors());
        assert_eq!(
            engine.diagnostics().items()[0].code,
            "ironts-resolve-unresolved"
        );
    }

    #[test]
    fn test_unregistered_cycle_is_fatal() {
        // Nothing is registered: the root namespace does not exist.
        let fx = Fixture::new(
            r#"<schema rootNamespaces="Elsewhere"><namespace name="T">
                 <model name="L"><property name="next" type="L" optional="true"/></model>
               </namespace></schema>"#,
        );
        assert!(fx.registry.is_empty());
        let mut engine = fx.engine();
        let err = engine
            .resolve(Mode::Type, fx.id("T.L"), &Context::new(&["T".to_string()]))
            .unwrap_err();
        assert!(matches!(err, CodegenError::UnresolvableCycle { ref name } if name == "T.L"));
    }

    #[test]
    fn test_doc_only_on_root_type_mode() {
        let fx = Fixture::new(
            r#"<schema rootNamespaces="T"><namespace name="T">
                 <model name="M" doc="A model"><property name="x" type="string"/></model>
               </namespace></schema>"#,
        );
        assert_eq!(fx.root(Mode::Type, "T.M").doc.as_deref(), Some("A model"));
        assert_eq!(fx.root(Mode::Predicate, "T.M").doc, None);

        let quiet = Fixture::with_config(
            r#"<schema rootNamespaces="T"><namespace name="T">
                 <model name="M" doc="A model"/>
               </namespace></schema>"#,
            GeneratorConfig::default().with_docs(false),
        );
        assert_eq!(quiet.root(Mode::Type, "T.M").doc, None);
    }

    #[test]
    fn test_context_is_persistent() {
        let mut schema = Schema::default();
        let a = schema.add_node(SchemaNode::Opaque { kind: "a".into() });
        let b = schema.add_node(SchemaNode::Opaque { kind: "b".into() });

        let root = Context::new(&["X".to_string()]);
        let child = root.enter(a);
        let grandchild = child.enter_flat(b);
        assert!(!root.is_root_locked());
        assert!(child.is_root_locked());
        assert_eq!(root.parent(), None);
        assert_eq!(child.parent(), Some(a));
        assert_eq!(grandchild.ancestors().collect::<Vec<_>>(), vec![b, a]);
        assert_eq!(child.depth(), 1);
        assert_eq!(grandchild.depth(), 1);
        assert!(!child.contains(b));
    }

    #[test]
    fn test_resolution_imports_are_deduplicated() {
        let mut res = Resolution::new("x");
        let mut child = Resolution::new("y");
        child.add_import(&["A".to_string()]);
        child.add_import(&["A".to_string()]);
        res.merge_imports(&child);
        res.merge_imports(&child);
        assert_eq!(res.imports, vec![vec!["A".to_string()]]);
    }
}
