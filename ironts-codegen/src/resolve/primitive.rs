//! Literals and intrinsics.

use ironts_schema::{Intrinsic, NodeId, Primitive, SchemaNode};

use super::dispatch::KindResolver;
use super::{Context, Engine, Mode, Resolution};
use crate::error::CodegenError;
use crate::typescript::syntax::quote;

pub(crate) struct PrimitiveResolver;

fn literal(primitive: &Primitive) -> String {
    match primitive {
        Primitive::Boolean(b) => b.to_string(),
        Primitive::Number(n) => n.clone(),
        Primitive::String(s) => quote(s),
        Primitive::Intrinsic(i) => i.as_str().to_string(),
    }
}

fn primitive<'a>(
    engine: &mut Engine<'a>,
    mode: Mode,
    id: NodeId,
) -> Result<&'a Primitive, CodegenError> {
    engine.node_as(mode, id, "Primitive", |n| match n {
        SchemaNode::Primitive(p) => Some(p),
        _ => None,
    })
}

impl KindResolver for PrimitiveResolver {
    fn emit_type(
        &self,
        engine: &mut Engine<'_>,
        id: NodeId,
        _ctx: &Context,
    ) -> Result<Resolution, CodegenError> {
        let p = primitive(engine, Mode::Type, id)?;
        Ok(Resolution::new(literal(p)))
    }

    fn emit_predicate(
        &self,
        engine: &mut Engine<'_>,
        id: NodeId,
        ctx: &Context,
    ) -> Result<Resolution, CodegenError> {
        let acc = ctx.accessor();
        let text = match primitive(engine, Mode::Predicate, id)? {
            Primitive::Intrinsic(Intrinsic::Unknown) => "true".to_string(),
            Primitive::Intrinsic(Intrinsic::Never) => "false".to_string(),
            Primitive::Intrinsic(Intrinsic::Void) => format!("{acc} === undefined"),
            p => format!("{acc} === {}", literal(p)),
        };
        Ok(Resolution::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;

    const LITERALS: &str = r#"
        <schema rootNamespaces="T"><namespace name="T">
          <model name="M">
            <property name="s"><string value="it's"/></property>
            <property name="b"><boolean value="false"/></property>
            <property name="u" type="unknown"/>
            <property name="n" type="null"/>
            <property name="v" type="void"/>
            <property name="x" type="never"/>
          </model>
        </namespace></schema>
    "#;

    fn both(fx: &Fixture, prop: &str) -> (String, String) {
        let id = fx.prop("T.M", prop);
        (
            fx.nested(Mode::Type, id, &["T"]).flat(),
            fx.nested(Mode::Predicate, id, &["T"]).flat(),
        )
    }

    #[test]
    fn test_literals() {
        let fx = Fixture::new(LITERALS);
        assert_eq!(both(&fx, "s"), ("'it\\'s'".into(), "v === 'it\\'s'".into()));
        assert_eq!(both(&fx, "b"), ("false".into(), "v === false".into()));
    }

    #[test]
    fn test_intrinsics() {
        let fx = Fixture::new(LITERALS);
        assert_eq!(both(&fx, "u"), ("unknown".into(), "true".into()));
        assert_eq!(both(&fx, "n"), ("null".into(), "v === null".into()));
        assert_eq!(both(&fx, "v"), ("void".into(), "v === undefined".into()));
        assert_eq!(both(&fx, "x"), ("never".into(), "false".into()));
    }
}
