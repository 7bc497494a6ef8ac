//! `Array` and `Record` models.

use ironts_schema::{IndexedKind, NodeId, SchemaNode};

use super::dispatch::KindResolver;
use super::visibility::filter_lifecycle;
use super::{Context, Engine, Mode, Resolution, VisibilityMap};
use crate::doc::Doc;
use crate::error::CodegenError;

pub(crate) struct IndexedModelResolver;

impl IndexedModelResolver {
    /// Returns the indexed kind and element of a model, failing if the model
    /// is not a well-formed `Array`/`Record`.
    fn shape(
        engine: &mut Engine<'_>,
        mode: Mode,
        id: NodeId,
    ) -> Result<(IndexedKind, NodeId), CodegenError> {
        let model = engine.node_as(mode, id, "Model", |n| match n {
            SchemaNode::Model(m) => Some(m),
            _ => None,
        })?;
        let name = model.decl.name.clone().unwrap_or_default();
        let Some(kind) = model.indexed_kind() else {
            let err = CodegenError::MalformedIndexedModel {
                name,
                reason: "only Array and Record models are indexed".to_string(),
            };
            let code = format!("resolve-{}-typeclass-modeltype-mismatch", mode.code_name());
            return Err(engine.fatal(&code, err));
        };
        let Some(element) = model.indexer else {
            let err = CodegenError::MalformedIndexedModel {
                name,
                reason: "no element indexer".to_string(),
            };
            let code = format!("resolve-{}-no-indexer", mode.code_name());
            return Err(engine.fatal(&code, err));
        };
        Ok((kind, element))
    }
}

impl KindResolver for IndexedModelResolver {
    fn emit_type(
        &self,
        engine: &mut Engine<'_>,
        id: NodeId,
        ctx: &Context,
    ) -> Result<Resolution, CodegenError> {
        let (kind, element) = Self::shape(engine, Mode::Type, id)?;
        let res = engine.resolve(Mode::Type, element, &ctx.enter(id))?;

        let mut out = Resolution::default();
        out.merge_imports(&res);
        let text = match kind {
            IndexedKind::Array => res.text.wrapped("(", ")[]"),
            IndexedKind::Record => res.text.wrapped("{[key: string]: ", "}"),
        };
        let map = res.visibility_map.map(|m| match kind {
            IndexedKind::Array => m,
            IndexedKind::Record => VisibilityMap::wildcard(m),
        });

        match map {
            Some(map) if !map.is_empty() => {
                out.text = if engine.parent_is_model(ctx) {
                    text
                } else {
                    filter_lifecycle(text, &map, ctx.lifecycle_param())
                };
                out.visibility_map = Some(map);
            }
            _ => out.text = text,
        }
        Ok(out)
    }

    fn emit_predicate(
        &self,
        engine: &mut Engine<'_>,
        id: NodeId,
        ctx: &Context,
    ) -> Result<Resolution, CodegenError> {
        let (kind, element) = Self::shape(engine, Mode::Predicate, id)?;
        let acc = ctx.accessor();
        let element_acc = match kind {
            IndexedKind::Array => "e",
            IndexedKind::Record => "e[1]",
        };
        let res = engine.resolve(
            Mode::Predicate,
            element,
            &ctx.enter(id).with_accessor(element_acc),
        )?;

        let head = match kind {
            IndexedKind::Array => format!("Array.isArray({acc}) && {acc}.every((e) => "),
            IndexedKind::Record => format!(
                "typeof {acc} === 'object' && {acc} !== null && \
                 Object.entries({acc} as Record<string, any>).every((e) => "
            ),
        };
        let mut out = Resolution::default();
        out.merge_imports(&res);
        let mut text = Doc::text(head);
        text.append(res.text).push(")");
        out.text = text;
        Ok(out)
    }
}
