//! Enums and enum member references.

use ironts_schema::{EnumDef, EnumMember, EnumMemberRef, EnumValue, NodeId, SchemaNode};

use super::dispatch::KindResolver;
use super::{Context, Engine, Mode, Resolution};
use crate::config::GeneratorConfig;
use crate::doc::Doc;
use crate::error::CodegenError;
use crate::typescript::syntax::{doc_comment, is_identifier, namespace_alias, property_key, quote};

pub(crate) struct EnumResolver;
pub(crate) struct EnumMemberResolver;

/// Explicit initializer of a member, if one is emitted.
fn member_value(member: &EnumMember, config: &GeneratorConfig) -> Option<String> {
    match &member.value {
        None if config.string_nominal_enums => Some(quote(&member.name)),
        None => None,
        Some(EnumValue::String(s)) => Some(quote(s)),
        Some(EnumValue::Number(_)) if config.string_nominal_enums => Some(quote(&member.name)),
        Some(EnumValue::Number(n)) => Some(n.clone()),
    }
}

/// Runtime value of a member when written as a literal. Members without an
/// explicit value continue numbering from the previous numeric member.
fn member_literal(def: &EnumDef, index: usize, config: &GeneratorConfig) -> String {
    let member = &def.members[index];
    if let Some(value) = member_value(member, config) {
        return value;
    }
    let mut next = 0f64;
    for m in &def.members[..index] {
        next = match &m.value {
            Some(EnumValue::Number(n)) => n.parse::<f64>().map_or(next, |v| v + 1.0),
            _ => next + 1.0,
        };
    }
    format_number(next)
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl KindResolver for EnumResolver {
    fn emit_type(
        &self,
        engine: &mut Engine<'_>,
        id: NodeId,
        _ctx: &Context,
    ) -> Result<Resolution, CodegenError> {
        let def = engine.node_as(Mode::Type, id, "Enum", |n| match n {
            SchemaNode::Enum(e) => Some(e),
            _ => None,
        })?;
        if def.members.is_empty() {
            return Ok(Resolution::new("{}"));
        }
        let config = engine.config();
        let members = def.members.iter().map(|m| {
            let mut doc = Doc::new();
            if config.emit_docs
                && let Some(text) = &m.doc
            {
                doc.push(doc_comment(text)).line(" ");
            }
            doc.push(property_key(&m.name));
            if let Some(value) = member_value(m, config) {
                doc.push(format!(" = {value}"));
            }
            doc
        });
        let mut body = Doc::new();
        body.line("").append(Doc::join(members, ",", " "));
        let mut text = Doc::text("{");
        text.nest(body).line("").push("}");
        Ok(Resolution::new(text))
    }

    fn emit_predicate(
        &self,
        engine: &mut Engine<'_>,
        id: NodeId,
        _ctx: &Context,
    ) -> Result<Resolution, CodegenError> {
        engine.node_as(Mode::Predicate, id, "Enum", |n| match n {
            SchemaNode::Enum(e) => Some(e),
            _ => None,
        })?;
        Ok(Resolution::new("true"))
    }
}

impl EnumMemberResolver {
    fn lookup<'a>(
        engine: &mut Engine<'a>,
        mode: Mode,
        id: NodeId,
    ) -> Result<(&'a EnumMemberRef, &'a EnumDef, usize), CodegenError> {
        let member = engine.node_as(mode, id, "EnumMember", |n| match n {
            SchemaNode::EnumMember(m) => Some(m),
            _ => None,
        })?;
        let def = engine.node_as(mode, member.enum_id, "Enum", |n| match n {
            SchemaNode::Enum(e) => Some(e),
            _ => None,
        })?;
        let Some(index) = def.member_index(&member.member) else {
            let err = CodegenError::UnknownEnumMember {
                enum_name: def.decl.name.clone().unwrap_or_default(),
                member: member.member.clone(),
            };
            return Err(engine.fatal(&format!("resolve-{}-enum-member", mode.code_name()), err));
        };
        Ok((member, def, index))
    }
}

impl KindResolver for EnumMemberResolver {
    fn emit_type(
        &self,
        engine: &mut Engine<'_>,
        id: NodeId,
        ctx: &Context,
    ) -> Result<Resolution, CodegenError> {
        let (member, def, index) = Self::lookup(engine, Mode::Type, id)?;
        let schema = engine.schema();
        let registered = schema
            .node(member.enum_id)
            .identity()
            .and_then(|identity| engine.registry().find(&identity));

        let Some(entry) = registered else {
            return Ok(Resolution::new(member_literal(def, index, engine.config())));
        };
        let same_file = ctx.target_namespace() == Some(entry.namespace());
        let owner = if same_file {
            entry.name().to_string()
        } else {
            format!("{}.{}", namespace_alias(entry.namespace()), entry.name())
        };
        let text = if is_identifier(&member.member) {
            format!("{owner}.{}", member.member)
        } else {
            format!("(typeof {owner})[{}]", quote(&member.member))
        };
        let mut resolution = Resolution::new(text);
        if !same_file {
            resolution.add_import(entry.namespace());
        }
        Ok(resolution)
    }

    fn emit_predicate(
        &self,
        engine: &mut Engine<'_>,
        id: NodeId,
        _ctx: &Context,
    ) -> Result<Resolution, CodegenError> {
        Self::lookup(engine, Mode::Predicate, id)?;
        Ok(Resolution::new("true"))
    }
}
