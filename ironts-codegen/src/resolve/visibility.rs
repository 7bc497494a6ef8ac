//! Lifecycle visibility: reachability analysis, per-property maps and the
//! emitted filter constructs.

use std::collections::HashSet;

use ironts_schema::{Lifecycle, LifecycleSet, NodeId, Schema, SchemaNode};

use crate::doc::Doc;
use crate::typescript::syntax::quote;

/// Key under which a record's element map is nested.
pub const WILDCARD_KEY: &str = "*";

/// Returns true if a lifecycle restriction is reachable from `id`.
///
/// Every node is visited at most once, so cycles terminate and the answer is
/// exact reachability over the graph.
pub(crate) fn reaches_restriction(schema: &Schema, id: NodeId) -> bool {
    let mut visited = HashSet::new();
    let mut stack = vec![id];
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        match schema.get(id) {
            Some(SchemaNode::Model(m)) => {
                if m.properties.iter().any(|p| p.visibility.is_some()) {
                    return true;
                }
                stack.extend(m.base);
                stack.extend(m.indexer);
                stack.extend(m.properties.iter().map(|p| p.ty));
            }
            Some(SchemaNode::Tuple(t)) => stack.extend(t.elements.iter().copied()),
            Some(SchemaNode::Union(u)) => stack.extend(u.variants.iter().copied()),
            _ => {}
        }
    }
    false
}

/// One entry of a [`VisibilityMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityEntry {
    /// Property name, or [`WILDCARD_KEY`] for record elements.
    pub key: String,
    /// States the property is restricted to.
    pub restricted_to: Option<LifecycleSet>,
    /// Restrictions inside the property's own type.
    pub nested: Option<VisibilityMap>,
}

impl VisibilityEntry {
    /// Creates an entry; an empty nested map is dropped.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        restricted_to: Option<LifecycleSet>,
        nested: Option<VisibilityMap>,
    ) -> Self {
        Self {
            key: key.into(),
            restricted_to,
            nested: nested.filter(|n| !n.is_empty()),
        }
    }

    /// Returns true if the entry restricts anything.
    #[must_use]
    pub fn is_meaningful(&self) -> bool {
        self.restricted_to.is_some() || self.nested.is_some()
    }

    fn to_doc(&self) -> Doc {
        let mut fields = Vec::new();
        if let Some(states) = &self.restricted_to {
            fields.push(Doc::text(format!("vis: [{}]", lifecycle_list(states))));
        }
        if let Some(nested) = &self.nested {
            let mut field = Doc::text("nested: ");
            field.append(nested.to_doc());
            fields.push(field);
        }
        let mut doc = Doc::text(format!("{}: {{", quote(&self.key)));
        doc.append(Doc::join(fields, ",", " "));
        doc.push("}");
        doc
    }
}

/// Ordered per-property lifecycle restrictions of a model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityMap {
    entries: Vec<VisibilityEntry>,
}

impl VisibilityMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an element map under the record wildcard key.
    #[must_use]
    pub fn wildcard(element: VisibilityMap) -> Self {
        let mut map = Self::new();
        map.push(VisibilityEntry::new(WILDCARD_KEY, None, Some(element)));
        map
    }

    /// Adds an entry if it restricts anything.
    pub fn push(&mut self, entry: VisibilityEntry) {
        if entry.is_meaningful() {
            self.entries.push(entry);
        }
    }

    /// Appends the entries of another map.
    pub fn extend(&mut self, other: VisibilityMap) {
        for entry in other.entries {
            self.push(entry);
        }
    }

    /// Entries in order.
    #[must_use]
    pub fn entries(&self) -> &[VisibilityEntry] {
        &self.entries
    }

    /// Looks up an entry by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&VisibilityEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Returns true if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the map as a TypeScript object type.
    #[must_use]
    pub fn to_doc(&self) -> Doc {
        if self.entries.is_empty() {
            return Doc::text("{}");
        }
        let mut body = Doc::new();
        body.line("");
        body.append(Doc::join(
            self.entries.iter().map(VisibilityEntry::to_doc),
            ",",
            " ",
        ));
        let mut doc = Doc::text("{");
        doc.nest(body).line("").push("}");
        doc
    }
}

/// `Lifecycle.A, Lifecycle.B`
pub(crate) fn lifecycle_list(states: &LifecycleSet) -> String {
    states
        .iter()
        .map(|s| lifecycle_ref(*s))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `Lifecycle.A`
pub(crate) fn lifecycle_ref(state: Lifecycle) -> String {
    format!("Lifecycle.{state}")
}

/// Wraps a shape in the `FilterLifecycle` helper type.
pub(crate) fn filter_lifecycle(shape: Doc, map: &VisibilityMap, param: &str) -> Doc {
    let mut doc = Doc::text("FilterLifecycle<");
    doc.append(shape);
    doc.push(", ");
    doc.append(map.to_doc());
    doc.push(format!(", {param}>"));
    doc
}

/// Predicate clause for a restricted property: when the requested lifecycle
/// is not among `states` the property must be absent, otherwise `present`
/// applies.
pub(crate) fn restricted_clause(
    states: &LifecycleSet,
    key: &str,
    accessor: &str,
    present: Doc,
) -> Doc {
    let mut doc = Doc::text(format!(
        "((vis as any) !== Lifecycle.All && ![{}].includes(vis) ? !({key} in {accessor}) : (",
        lifecycle_list(states)
    ));
    doc.append(present);
    doc.push("))");
    doc
}

/// Type argument binding the lifecycle parameter to `states` when no
/// specific lifecycle was requested.
#[must_use]
pub fn bound_lifecycle_param(param: &str, states: &LifecycleSet) -> String {
    let union = states
        .iter()
        .map(|s| lifecycle_ref(*s))
        .collect::<Vec<_>>()
        .join(" | ");
    format!("{param} extends Lifecycle.All ? ({union}) : {param}")
}
