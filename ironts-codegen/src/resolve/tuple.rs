//! Fixed-length tuples.

use ironts_schema::{NodeId, SchemaNode, TupleDef};

use super::dispatch::KindResolver;
use super::{Context, Engine, Mode, Resolution};
use crate::doc::Doc;
use crate::error::CodegenError;

pub(crate) struct TupleResolver;

fn tuple<'a>(engine: &mut Engine<'a>, mode: Mode, id: NodeId) -> Result<&'a TupleDef, CodegenError> {
    engine.node_as(mode, id, "Tuple", |n| match n {
        SchemaNode::Tuple(t) => Some(t),
        _ => None,
    })
}

impl KindResolver for TupleResolver {
    fn emit_type(
        &self,
        engine: &mut Engine<'_>,
        id: NodeId,
        ctx: &Context,
    ) -> Result<Resolution, CodegenError> {
        let def = tuple(engine, Mode::Type, id)?;
        let child = ctx.enter(id);
        let mut out = Resolution::default();
        let mut text = Doc::text("[");
        for (i, &element) in def.elements.iter().enumerate() {
            let res = engine.resolve(Mode::Type, element, &child)?;
            out.merge_imports(&res);
            if i > 0 {
                text.push(", ");
            }
            text.append(res.text);
        }
        text.push("]");
        out.text = text;
        Ok(out)
    }

    fn emit_predicate(
        &self,
        engine: &mut Engine<'_>,
        id: NodeId,
        ctx: &Context,
    ) -> Result<Resolution, CodegenError> {
        let def = tuple(engine, Mode::Predicate, id)?;
        let child = ctx.enter(id);
        let acc = ctx.accessor();
        let mut out = Resolution::default();
        let mut text = Doc::text(format!(
            "Array.isArray({acc}) && {acc}.length === {}",
            def.elements.len()
        ));
        for (i, &element) in def.elements.iter().enumerate() {
            let res = engine.resolve(
                Mode::Predicate,
                element,
                &child.with_accessor(format!("{acc}[{i}]")),
            )?;
            out.merge_imports(&res);
            text.push(" && (").append(res.text).push(")");
        }
        out.text = text;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;

    const TUPLES: &str = r#"
        <schema rootNamespaces="T,O">
          <namespace name="T">
            <model name="M">
              <property name="pair"><tuple><ref type="string"/><ref type="O.Point"/></tuple></property>
              <property name="unit"><tuple/></property>
            </model>
          </namespace>
          <namespace name="O">
            <model name="Point"><property name="x" type="float32"/></model>
          </namespace>
        </schema>
    "#;

    #[test]
    fn test_tuple_type() {
        let fx = Fixture::new(TUPLES);
        let pair = fx.nested(Mode::Type, fx.prop("T.M", "pair"), &["T"]);
        assert_eq!(pair.flat(), "[string, O.Point]");
        assert_eq!(pair.imports, vec![vec!["O".to_string()]]);
        assert_eq!(
            fx.nested(Mode::Type, fx.prop("T.M", "unit"), &["T"]).flat(),
            "[]"
        );
    }

    #[test]
    fn test_tuple_predicate() {
        let fx = Fixture::new(TUPLES);
        assert_eq!(
            fx.nested(Mode::Predicate, fx.prop("T.M", "pair"), &["T"]).flat(),
            "Array.isArray(v) && v.length === 2 && (typeof v[0] === 'string') && (O.isPoint(v[1]))"
        );
        assert_eq!(
            fx.nested(Mode::Predicate, fx.prop("T.M", "unit"), &["T"]).flat(),
            "Array.isArray(v) && v.length === 0"
        );
    }
}
