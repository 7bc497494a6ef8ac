//! Shaped models: object literals, base intersections and per-property
//! lifecycle restrictions.

use ironts_schema::{ModelDef, NodeId, SchemaNode};

use super::dispatch::KindResolver;
use super::visibility::{filter_lifecycle, restricted_clause};
use super::{Context, Engine, Mode, Resolution, VisibilityEntry, VisibilityMap};
use crate::doc::Doc;
use crate::error::CodegenError;
use crate::typescript::syntax::{doc_comment, index_access, property_key, quote};

pub(crate) struct ShapedModelResolver;

fn shaped<'a>(
    engine: &mut Engine<'a>,
    mode: Mode,
    id: NodeId,
) -> Result<&'a ModelDef, CodegenError> {
    engine.node_as(mode, id, "shaped Model", |n| match n {
        SchemaNode::Model(m) if m.indexed_kind().is_none() => Some(m),
        _ => None,
    })
}

/// Returns true if `expr` contains `||` outside of any brackets or string
/// literals.
fn has_top_level_or(expr: &str) -> bool {
    let mut depth = 0usize;
    let mut quote_char: Option<char> = None;
    let mut escaped = false;
    let mut prev = '\0';
    for c in expr.chars() {
        if let Some(q) = quote_char {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote_char = None;
            }
            prev = c;
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote_char = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '|' if prev == '|' && depth == 0 => return true,
            _ => {}
        }
        prev = c;
    }
    false
}

impl KindResolver for ShapedModelResolver {
    fn emit_type(
        &self,
        engine: &mut Engine<'_>,
        id: NodeId,
        ctx: &Context,
    ) -> Result<Resolution, CodegenError> {
        let model = shaped(engine, Mode::Type, id)?;
        let child = ctx.enter(id);
        let emit_docs = engine.config().emit_docs;

        let mut out = Resolution::default();
        let mut map = VisibilityMap::new();
        let mut text = Doc::new();

        if let Some(base) = model.base {
            let res = engine.resolve(Mode::Type, base, &child)?;
            out.merge_imports(&res);
            if let Some(base_map) = res.visibility_map {
                map.extend(base_map);
            }
            text.append(res.text);
            text.push(" & ");
        }

        let mut fields = Vec::with_capacity(model.properties.len());
        for prop in &model.properties {
            let res = engine.resolve(Mode::Type, prop.ty, &child)?;
            out.merge_imports(&res);

            let mut field = Doc::new();
            if emit_docs && let Some(doc) = &prop.doc {
                field.push(doc_comment(doc)).line(" ");
            }
            let marker = if prop.optional { "?" } else { "" };
            field.push(format!("{}{marker}: ", property_key(&prop.name)));
            field.append(res.text);
            fields.push(field);

            map.push(VisibilityEntry::new(
                prop.name.as_str(),
                prop.visibility.clone(),
                res.visibility_map,
            ));
        }

        if fields.is_empty() {
            text.push("{}");
        } else {
            let mut body = Doc::new();
            body.line("").append(Doc::join(fields, ",", " "));
            text.push("{").nest(body).line("").push("}");
        }

        if map.is_empty() {
            out.text = text;
        } else {
            out.text = if engine.parent_is_model(ctx) {
                text
            } else {
                filter_lifecycle(text, &map, ctx.lifecycle_param())
            };
            out.visibility_map = Some(map);
        }
        Ok(out)
    }

    fn emit_predicate(
        &self,
        engine: &mut Engine<'_>,
        id: NodeId,
        ctx: &Context,
    ) -> Result<Resolution, CodegenError> {
        let model = shaped(engine, Mode::Predicate, id)?;
        let child = ctx.enter(id);
        let schema = engine.schema();

        let mut out = Resolution::default();
        let mut clauses = Vec::new();
        let mut acc = ctx.accessor().to_string();

        if let Some(base) = model.base {
            let res = engine.resolve(Mode::Predicate, base, &child)?;
            out.merge_imports(&res);
            clauses.push(res.text);
            // own properties are not declared on the base's type
            acc = format!("({acc} as any)");
        }

        for prop in &model.properties {
            let key = quote(&prop.name);
            let prop_acc = index_access(&acc, &prop.name);

            let node = schema.get(prop.ty);
            let presence = if node.is_some_and(SchemaNode::is_never) {
                Doc::text(format!("!({key} in {acc})"))
            } else {
                let res = engine.resolve(Mode::Predicate, prop.ty, &child.with_accessor(&prop_acc))?;
                out.merge_imports(&res);
                if node.is_some_and(SchemaNode::admits_absence) {
                    // `unknown` and `void` already accept an absent value
                    res.text
                } else {
                    let head = if prop.optional {
                        format!("{prop_acc} === undefined || (")
                    } else {
                        format!("{prop_acc} !== undefined && (")
                    };
                    let mut doc = Doc::text(head);
                    doc.append(res.text).push(")");
                    doc
                }
            };

            clauses.push(match &prop.visibility {
                Some(states) => restricted_clause(states, &key, &acc, presence),
                None => presence,
            });
        }

        out.text = match clauses.len() {
            0 => Doc::text("true"),
            1 => clauses.remove(0),
            _ => Doc::join(
                clauses.into_iter().map(|clause| {
                    if has_top_level_or(&clause.flat()) {
                        clause.wrapped("(", ")")
                    } else {
                        clause
                    }
                }),
                " &&",
                " ",
            ),
        };
        Ok(out)
    }
}
