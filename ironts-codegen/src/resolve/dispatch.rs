//! Node classification and resolver dispatch.

use ironts_schema::{NodeId, SchemaNode};

use super::{Context, Engine, Resolution};
use crate::error::CodegenError;

/// Resolver selected for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverKind {
    /// Literal or intrinsic.
    Primitive,
    /// Enum declaration.
    Enum,
    /// Single enum member.
    EnumMember,
    /// Scalar declaration.
    Scalar,
    /// Model with named properties.
    ShapedModel,
    /// `Array` or `Record` model.
    IndexedModel,
    /// Tuple.
    Tuple,
    /// Union.
    Union,
}

/// One resolver per [`ResolverKind`].
pub(crate) trait KindResolver: Sync {
    /// Produces the TypeScript type expression.
    fn emit_type(
        &self,
        engine: &mut Engine<'_>,
        id: NodeId,
        ctx: &Context,
    ) -> Result<Resolution, CodegenError>;

    /// Produces the predicate expression over `ctx.accessor()`.
    fn emit_predicate(
        &self,
        engine: &mut Engine<'_>,
        id: NodeId,
        ctx: &Context,
    ) -> Result<Resolution, CodegenError>;
}

static PRIMITIVE: super::primitive::PrimitiveResolver = super::primitive::PrimitiveResolver;
static ENUM: super::enums::EnumResolver = super::enums::EnumResolver;
static ENUM_MEMBER: super::enums::EnumMemberResolver = super::enums::EnumMemberResolver;
static SCALAR: super::scalar::ScalarResolver = super::scalar::ScalarResolver;
static SHAPED_MODEL: super::model::ShapedModelResolver = super::model::ShapedModelResolver;
static INDEXED_MODEL: super::indexed::IndexedModelResolver = super::indexed::IndexedModelResolver;
static TUPLE: super::tuple::TupleResolver = super::tuple::TupleResolver;
static UNION: super::union::UnionResolver = super::union::UnionResolver;

impl ResolverKind {
    /// Returns the resolver for this kind.
    pub(crate) fn resolver(self) -> &'static dyn KindResolver {
        match self {
            Self::Primitive => &PRIMITIVE,
            Self::Enum => &ENUM,
            Self::EnumMember => &ENUM_MEMBER,
            Self::Scalar => &SCALAR,
            Self::ShapedModel => &SHAPED_MODEL,
            Self::IndexedModel => &INDEXED_MODEL,
            Self::Tuple => &TUPLE,
            Self::Union => &UNION,
        }
    }
}

/// Picks the resolver for a node.
///
/// # Errors
/// Returns `CodegenError::UnsupportedKind` for opaque nodes.
pub fn classify(node: &SchemaNode) -> Result<ResolverKind, CodegenError> {
    Ok(match node {
        SchemaNode::Primitive(_) => ResolverKind::Primitive,
        SchemaNode::Enum(_) => ResolverKind::Enum,
        SchemaNode::EnumMember(_) => ResolverKind::EnumMember,
        SchemaNode::Scalar(_) => ResolverKind::Scalar,
        SchemaNode::Model(m) if m.indexed_kind().is_some() => ResolverKind::IndexedModel,
        SchemaNode::Model(_) => ResolverKind::ShapedModel,
        SchemaNode::Tuple(_) => ResolverKind::Tuple,
        SchemaNode::Union(_) => ResolverKind::Union,
        SchemaNode::Opaque { kind } => {
            return Err(CodegenError::UnsupportedKind { kind: kind.clone() });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironts_schema::{Decl, Intrinsic, ModelDef, Primitive, Schema};

    #[test]
    fn test_classify() {
        let mut schema = Schema::default();
        let s = schema.add_node(SchemaNode::Primitive(Primitive::Intrinsic(Intrinsic::Null)));

        assert_eq!(classify(schema.node(s)).ok(), Some(ResolverKind::Primitive));
        assert_eq!(
            classify(&SchemaNode::Model(ModelDef::array(s))).ok(),
            Some(ResolverKind::IndexedModel)
        );
        assert_eq!(
            classify(&SchemaNode::Model(ModelDef::new(Decl::named("Pet", vec!["S".into()])))).ok(),
            Some(ResolverKind::ShapedModel)
        );
        assert!(matches!(
            classify(&SchemaNode::Opaque { kind: "Interface".into() }),
            Err(CodegenError::UnsupportedKind { .. })
        ));
    }

    #[test]
    fn test_indexed_name_without_indexer_is_indexed() {
        let mut model = ModelDef::new(Decl::named("Record", vec!["S".into()]));
        model.indexer = None;
        assert_eq!(
            classify(&SchemaNode::Model(model)).ok(),
            Some(ResolverKind::IndexedModel)
        );
    }
}
