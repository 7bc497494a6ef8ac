//! Unions.

use ironts_schema::{NodeId, SchemaNode, UnionDef};

use super::dispatch::KindResolver;
use super::{Context, Engine, Mode, Resolution};
use crate::doc::Doc;
use crate::error::CodegenError;

pub(crate) struct UnionResolver;

impl UnionResolver {
    /// Resolves every variant. Variants share the union's nesting level.
    fn variants(
        engine: &mut Engine<'_>,
        mode: Mode,
        id: NodeId,
        ctx: &Context,
    ) -> Result<(Vec<Doc>, Resolution), CodegenError> {
        let def: &UnionDef = engine.node_as(mode, id, "Union", |n| match n {
            SchemaNode::Union(u) => Some(u),
            _ => None,
        })?;
        let child = ctx.enter_flat(id);
        let mut out = Resolution::default();
        let mut docs = Vec::with_capacity(def.variants.len());
        for &variant in &def.variants {
            let res = engine.resolve(mode, variant, &child)?;
            out.merge_imports(&res);
            docs.push(res.text);
        }
        Ok((docs, out))
    }
}

impl KindResolver for UnionResolver {
    fn emit_type(
        &self,
        engine: &mut Engine<'_>,
        id: NodeId,
        ctx: &Context,
    ) -> Result<Resolution, CodegenError> {
        let (docs, mut out) = Self::variants(engine, Mode::Type, id, ctx)?;
        out.text = if docs.is_empty() {
            Doc::text("never")
        } else {
            let mut text = Doc::new();
            for (i, doc) in docs.into_iter().enumerate() {
                if i > 0 {
                    text.push(" | ");
                }
                text.append(doc);
            }
            text
        };
        Ok(out)
    }

    fn emit_predicate(
        &self,
        engine: &mut Engine<'_>,
        id: NodeId,
        ctx: &Context,
    ) -> Result<Resolution, CodegenError> {
        let (docs, mut out) = Self::variants(engine, Mode::Predicate, id, ctx)?;
        out.text = if docs.is_empty() {
            Doc::text("false")
        } else {
            Doc::join(docs.into_iter().map(|d| d.wrapped("(", ")")), " ||", " ")
        };
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;

    const UNIONS: &str = r#"
        <schema rootNamespaces="T">
          <namespace name="T">
            <union name="Shape" doc="Any shape">
              <ref type="Circle"/>
              <ref type="Square"/>
              <string value="none"/>
            </union>
            <model name="Circle"><property name="r" type="float64"/></model>
            <model name="Square"><property name="side" type="float64"/></model>
            <union name="Nothing"/>
            <model name="M">
              <property name="choice">
                <union>
                  <model><property name="a" type="string" visibility="read"/></model>
                  <ref type="null"/>
                </union>
              </property>
            </model>
          </namespace>
        </schema>
    "#;

    #[test]
    fn test_named_union() {
        let fx = Fixture::new(UNIONS);
        let ty = fx.root(Mode::Type, "T.Shape");
        assert_eq!(ty.flat(), "Circle | Square | 'none'");
        assert_eq!(ty.doc.as_deref(), Some("Any shape"));
        assert_eq!(
            fx.root(Mode::Predicate, "T.Shape").flat(),
            "(isCircle(v)) || (isSquare(v)) || (v === 'none')"
        );
    }

    #[test]
    fn test_empty_union() {
        let fx = Fixture::new(UNIONS);
        assert_eq!(fx.root(Mode::Type, "T.Nothing").flat(), "never");
        assert_eq!(fx.root(Mode::Predicate, "T.Nothing").flat(), "false");
    }

    #[test]
    fn test_model_variant_wraps_itself() {
        let fx = Fixture::new(UNIONS);
        let m = fx.root(Mode::Type, "T.M");
        assert!(m.has_visibility);
        assert_eq!(
            m.flat(),
            "{choice: FilterLifecycle<{a: string}, {'a': {vis: [Lifecycle.Read]}}, V> | null}"
        );
        assert!(m.visibility_map.is_none());
    }
}
