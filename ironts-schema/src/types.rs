//! Schema node definitions.
//!
//! The schema is an arena of [`SchemaNode`]s addressed by [`NodeId`]. Nodes
//! reference each other by id, so self-referential and mutually-referential
//! declarations need no special representation.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::operations::OperationDef;

/// Namespace holding the built-in scalars and the `Array`/`Record` models.
pub const BUILTIN_NAMESPACE: &str = "TypeSpec";

/// Index of a node inside a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the arena index of this node.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Complete schema graph produced by the schema provider.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Namespaces whose declarations are emitted.
    pub root_namespaces: Vec<String>,
    /// Node arena.
    nodes: Vec<SchemaNode>,
    /// Top-level declarations in source order.
    pub declarations: Vec<NodeId>,
    /// HTTP operations in source order.
    pub operations: Vec<OperationDef>,
    /// Qualified declaration name -> node.
    decl_map: HashMap<String, NodeId>,
}

impl Schema {
    /// Creates a new empty schema.
    #[must_use]
    pub fn new(root_namespaces: Vec<String>) -> Self {
        Self {
            root_namespaces,
            ..Self::default()
        }
    }

    /// Adds a node to the arena and returns its id.
    pub fn add_node(&mut self, node: SchemaNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Replaces a node in place. Used to fill declarations reserved before
    /// their bodies were resolved.
    pub fn replace_node(&mut self, id: NodeId, node: SchemaNode) {
        self.nodes[id.index()] = node;
    }

    /// Adds a node and records it as a top-level declaration.
    pub fn add_declaration(&mut self, node: SchemaNode) -> NodeId {
        let qualified = node.qualified_name();
        let id = self.add_node(node);
        self.declarations.push(id);
        if let Some(qualified) = qualified {
            self.decl_map.insert(qualified, id);
        }
        id
    }

    /// Returns the node with the given id.
    ///
    /// # Panics
    /// Panics if the id was not produced by this schema.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.index()]
    }

    /// Returns the node with the given id, if it exists.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&SchemaNode> {
        self.nodes.get(id.index())
    }

    /// Looks up a declaration by its dotted, fully-qualified name.
    #[must_use]
    pub fn get_declaration(&self, qualified: &str) -> Option<NodeId> {
        self.decl_map.get(qualified).copied()
    }

    /// Returns true if a declaration with the given qualified name exists.
    #[must_use]
    pub fn has_declaration(&self, qualified: &str) -> bool {
        self.decl_map.contains_key(qualified)
    }

    /// Number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all nodes with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SchemaNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }
}

/// Discriminant of a [`SchemaNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    /// Literal or intrinsic.
    Primitive,
    /// Enum declaration.
    Enum,
    /// Reference to one member of an enum.
    EnumMember,
    /// Scalar declaration.
    Scalar,
    /// Shaped or indexed model.
    Model,
    /// Fixed-length heterogeneous sequence.
    Tuple,
    /// Set of variants.
    Union,
    /// A kind the generator does not handle.
    Opaque,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Primitive => "Primitive",
            Self::Enum => "Enum",
            Self::EnumMember => "EnumMember",
            Self::Scalar => "Scalar",
            Self::Model => "Model",
            Self::Tuple => "Tuple",
            Self::Union => "Union",
            Self::Opaque => "Opaque",
        };
        f.write_str(s)
    }
}

/// The (kind, name, namespace path) triple that makes a node referenceable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    /// Node kind.
    pub kind: NodeKind,
    /// Declared name.
    pub name: String,
    /// Namespace path from the outermost namespace inwards.
    pub namespace: Vec<String>,
}

impl Identity {
    /// Dotted qualified name (`A.B.Name`).
    #[must_use]
    pub fn qualified_name(&self) -> String {
        let mut parts = self.namespace.clone();
        parts.push(self.name.clone());
        parts.join(".")
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.qualified_name())
    }
}

/// Name, namespace and documentation shared by declarable nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decl {
    /// Declared name; `None` for anonymous nodes.
    pub name: Option<String>,
    /// Owning namespace path; empty for nodes outside any namespace.
    pub namespace: Vec<String>,
    /// Documentation comment.
    pub doc: Option<String>,
}

impl Decl {
    /// Creates an anonymous declaration.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Creates a named declaration inside a namespace.
    #[must_use]
    pub fn named(name: impl Into<String>, namespace: Vec<String>) -> Self {
        Self {
            name: Some(name.into()),
            namespace,
            doc: None,
        }
    }

    /// Sets the documentation comment.
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

/// One typed definition in the schema graph.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// Literal or intrinsic.
    Primitive(Primitive),
    /// Enum declaration.
    Enum(EnumDef),
    /// Reference to one member of an enum.
    EnumMember(EnumMemberRef),
    /// Scalar declaration.
    Scalar(ScalarDef),
    /// Shaped or indexed model.
    Model(ModelDef),
    /// Fixed-length heterogeneous sequence.
    Tuple(TupleDef),
    /// Set of variants.
    Union(UnionDef),
    /// A node kind the provider knows but the generator does not.
    Opaque {
        /// Provider-side kind name.
        kind: String,
    },
}

impl SchemaNode {
    /// Returns the node kind.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Primitive(_) => NodeKind::Primitive,
            Self::Enum(_) => NodeKind::Enum,
            Self::EnumMember(_) => NodeKind::EnumMember,
            Self::Scalar(_) => NodeKind::Scalar,
            Self::Model(_) => NodeKind::Model,
            Self::Tuple(_) => NodeKind::Tuple,
            Self::Union(_) => NodeKind::Union,
            Self::Opaque { .. } => NodeKind::Opaque,
        }
    }

    /// Returns the shared declaration data, if this kind has any.
    #[must_use]
    pub fn decl(&self) -> Option<&Decl> {
        match self {
            Self::Enum(e) => Some(&e.decl),
            Self::Scalar(s) => Some(&s.decl),
            Self::Model(m) => Some(&m.decl),
            Self::Union(u) => Some(&u.decl),
            _ => None,
        }
    }

    /// Returns the declared name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::EnumMember(m) => Some(&m.member),
            _ => self.decl().and_then(|d| d.name.as_deref()),
        }
    }

    /// Returns the owning namespace path (empty when there is none).
    #[must_use]
    pub fn namespace(&self) -> &[String] {
        self.decl().map_or(&[], |d| d.namespace.as_slice())
    }

    /// Returns the documentation comment, if any.
    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        self.decl().and_then(|d| d.doc.as_deref())
    }

    /// Returns the identity of this node. A node has identity iff it has a
    /// non-empty name and a non-empty namespace path.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        let name = self.name().filter(|n| !n.is_empty())?;
        let namespace = self.namespace();
        if namespace.is_empty() {
            return None;
        }
        Some(Identity {
            kind: self.kind(),
            name: name.to_string(),
            namespace: namespace.to_vec(),
        })
    }

    /// Returns the dotted qualified name of a named, namespaced node.
    #[must_use]
    pub fn qualified_name(&self) -> Option<String> {
        self.identity().map(|i| i.qualified_name())
    }

    /// Returns true if this is an `Array` or `Record` model.
    #[must_use]
    pub fn is_indexed_model(&self) -> bool {
        matches!(self, Self::Model(m) if m.indexed_kind().is_some())
    }

    /// Returns true if this is the `never` intrinsic.
    #[must_use]
    pub const fn is_never(&self) -> bool {
        matches!(self, Self::Primitive(Primitive::Intrinsic(Intrinsic::Never)))
    }

    /// Returns true if this is `unknown` or `void`, both of which accept an
    /// absent value.
    #[must_use]
    pub const fn admits_absence(&self) -> bool {
        matches!(
            self,
            Self::Primitive(Primitive::Intrinsic(Intrinsic::Unknown | Intrinsic::Void))
        )
    }
}

/// Literal values and intrinsic types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Primitive {
    /// `true` or `false`.
    Boolean(bool),
    /// Numeric literal in its canonical textual form.
    Number(String),
    /// String literal (unquoted).
    String(String),
    /// One of the fixed intrinsics.
    Intrinsic(Intrinsic),
}

/// Intrinsic types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    /// No value is accepted.
    Never,
    /// Any value is accepted.
    Unknown,
    /// Absent value.
    Void,
    /// The null value.
    Null,
}

impl Intrinsic {
    /// Parses an intrinsic from its name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "never" => Some(Self::Never),
            "unknown" => Some(Self::Unknown),
            "void" => Some(Self::Void),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    /// Returns the intrinsic's bare name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::Unknown => "unknown",
            Self::Void => "void",
            Self::Null => "null",
        }
    }
}

/// Enum declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    /// Name, namespace and doc.
    pub decl: Decl,
    /// Members in declaration order.
    pub members: Vec<EnumMember>,
}

impl EnumDef {
    /// Creates a new enum with no members.
    #[must_use]
    pub fn new(decl: Decl) -> Self {
        Self {
            decl,
            members: Vec::new(),
        }
    }

    /// Adds a member.
    pub fn add_member(&mut self, member: EnumMember) {
        self.members.push(member);
    }

    /// Looks up a member by name.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Returns the position of a member.
    #[must_use]
    pub fn member_index(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name == name)
    }
}

/// One enum member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    /// Member name.
    pub name: String,
    /// Explicit value.
    pub value: Option<EnumValue>,
    /// Documentation comment.
    pub doc: Option<String>,
}

impl EnumMember {
    /// Creates a member without an explicit value.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            doc: None,
        }
    }

    /// Creates a member with an explicit value.
    #[must_use]
    pub fn with_value(name: impl Into<String>, value: EnumValue) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
            doc: None,
        }
    }
}

/// Explicit enum member value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumValue {
    /// String value (unquoted).
    String(String),
    /// Numeric value in canonical textual form.
    Number(String),
}

/// Reference to one member of an enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMemberRef {
    /// The owning enum.
    pub enum_id: NodeId,
    /// Member name.
    pub member: String,
}

/// Scalar declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarDef {
    /// Name, namespace and doc.
    pub decl: Decl,
    /// Scalar this one extends.
    pub base: Option<NodeId>,
}

/// Model declaration. Models named `Array` or `Record` with an indexer are
/// indexed; every other model is shaped.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDef {
    /// Name, namespace and doc.
    pub decl: Decl,
    /// Own properties in declaration order.
    pub properties: Vec<Property>,
    /// Model this one extends.
    pub base: Option<NodeId>,
    /// Element type of an indexed model.
    pub indexer: Option<NodeId>,
}

impl ModelDef {
    /// Creates a shaped model with no properties.
    #[must_use]
    pub fn new(decl: Decl) -> Self {
        Self {
            decl,
            properties: Vec::new(),
            base: None,
            indexer: None,
        }
    }

    /// Creates an `Array` model of the given element.
    #[must_use]
    pub fn array(element: NodeId) -> Self {
        Self::indexed(IndexedKind::Array, element)
    }

    /// Creates a `Record` model of the given element.
    #[must_use]
    pub fn record(element: NodeId) -> Self {
        Self::indexed(IndexedKind::Record, element)
    }

    fn indexed(kind: IndexedKind, element: NodeId) -> Self {
        Self {
            decl: Decl::named(kind.as_str(), vec![BUILTIN_NAMESPACE.to_string()]),
            properties: Vec::new(),
            base: None,
            indexer: Some(element),
        }
    }

    /// Adds a property.
    pub fn add_property(&mut self, property: Property) {
        self.properties.push(property);
    }

    /// Returns the indexed kind selected by the model's reserved name.
    #[must_use]
    pub fn indexed_kind(&self) -> Option<IndexedKind> {
        self.decl.name.as_deref().and_then(IndexedKind::from_name)
    }
}

/// Discriminator of indexed models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexedKind {
    /// Ordered, integer-indexed.
    Array,
    /// String-keyed.
    Record,
}

impl IndexedKind {
    /// Maps a reserved model name to its kind.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Array" => Some(Self::Array),
            "Record" => Some(Self::Record),
            _ => None,
        }
    }

    /// Returns the reserved model name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Array => "Array",
            Self::Record => "Record",
        }
    }
}

/// A model property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Property type.
    pub ty: NodeId,
    /// Whether the property may be absent.
    pub optional: bool,
    /// Lifecycle states the property is restricted to.
    pub visibility: Option<LifecycleSet>,
    /// Documentation comment.
    pub doc: Option<String>,
}

impl Property {
    /// Creates a required property without restrictions.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: NodeId) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            visibility: None,
            doc: None,
        }
    }

    /// Marks the property optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Restricts the property to the given lifecycle states.
    #[must_use]
    pub fn visible_in(mut self, states: impl IntoIterator<Item = Lifecycle>) -> Self {
        self.visibility = Some(states.into_iter().collect());
        self
    }
}

/// Tuple definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleDef {
    /// Element types in order.
    pub elements: Vec<NodeId>,
}

/// Union definition.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionDef {
    /// Name, namespace and doc.
    pub decl: Decl,
    /// Variant types.
    pub variants: Vec<NodeId>,
}

/// Request/response phase a model property can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Lifecycle {
    /// Returned to the caller.
    Read,
    /// Sent on creation.
    Create,
    /// Sent on update.
    Update,
    /// Sent on deletion.
    Delete,
    /// Sent as query parameters.
    Query,
}

impl Lifecycle {
    /// All states in canonical order.
    pub const ALL: [Self; 5] = [
        Self::Read,
        Self::Create,
        Self::Update,
        Self::Delete,
        Self::Query,
    ];

    /// Parses a state from its name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Some(Self::Read),
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "query" => Some(Self::Query),
            _ => None,
        }
    }

    /// Returns the state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "Read",
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::Query => "Query",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered set of lifecycle states.
pub type LifecycleSet = BTreeSet<Lifecycle>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_requires_name_and_namespace() {
        let named = SchemaNode::Model(ModelDef::new(Decl::named("Pet", vec!["Store".into()])));
        let identity = named.identity().expect("named model has identity");
        assert_eq!(identity.kind, NodeKind::Model);
        assert_eq!(identity.qualified_name(), "Store.Pet");

        let no_ns = SchemaNode::Model(ModelDef::new(Decl::named("Pet", Vec::new())));
        assert!(no_ns.identity().is_none());

        let anonymous = SchemaNode::Model(ModelDef::new(Decl::anonymous()));
        assert!(anonymous.identity().is_none());
    }

    #[test]
    fn test_identity_equality_includes_kind() {
        let model = SchemaNode::Model(ModelDef::new(Decl::named("X", vec!["A".into()])));
        let union = SchemaNode::Union(UnionDef {
            decl: Decl::named("X", vec!["A".into()]),
            variants: Vec::new(),
        });
        assert_ne!(model.identity(), union.identity());
    }

    #[test]
    fn test_schema_declarations() {
        let mut schema = Schema::new(vec!["A".into()]);
        let id = schema.add_declaration(SchemaNode::Model(ModelDef::new(Decl::named(
            "M",
            vec!["A".into(), "B".into()],
        ))));
        assert_eq!(schema.get_declaration("A.B.M"), Some(id));
        assert!(schema.has_declaration("A.B.M"));
        assert!(!schema.has_declaration("A.M"));
        assert_eq!(schema.declarations, vec![id]);
    }

    #[test]
    fn test_indexed_kind() {
        let mut schema = Schema::default();
        let s = schema.add_node(SchemaNode::Primitive(Primitive::Boolean(true)));
        let array = ModelDef::array(s);
        assert_eq!(array.indexed_kind(), Some(IndexedKind::Array));
        assert!(SchemaNode::Model(ModelDef::record(s)).is_indexed_model());
        assert!(!SchemaNode::Model(ModelDef::new(Decl::anonymous())).is_indexed_model());
    }

    #[test]
    fn test_lifecycle_parse_and_order() {
        assert_eq!(Lifecycle::parse("READ"), Some(Lifecycle::Read));
        assert_eq!(Lifecycle::parse(" query "), Some(Lifecycle::Query));
        assert_eq!(Lifecycle::parse("patch"), None);

        let set: LifecycleSet = [Lifecycle::Query, Lifecycle::Read].into_iter().collect();
        let ordered: Vec<_> = set.into_iter().collect();
        assert_eq!(ordered, vec![Lifecycle::Read, Lifecycle::Query]);
    }

    #[test]
    fn test_intrinsic_parse() {
        assert_eq!(Intrinsic::parse("null"), Some(Intrinsic::Null));
        assert_eq!(Intrinsic::Never.as_str(), "never");
        assert_eq!(Intrinsic::parse("string"), None);
    }
}
