//! Scalars: configured overrides, base chains and the built-in terminals.

use ironts_schema::{BUILTIN_NAMESPACE, NodeId, ScalarDef, SchemaNode};

use super::dispatch::KindResolver;
use super::{Context, Engine, Mode, Resolution};
use crate::diagnostics::Diagnostic;
use crate::error::CodegenError;

pub(crate) struct ScalarResolver;

/// Target representation of a terminal scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminal {
    Boolean,
    Number,
    String,
    Date,
    Bytes,
}

impl Terminal {
    fn type_name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Date => "Date",
            Self::Bytes => "Uint8Array",
        }
    }

    fn predicate(self, acc: &str) -> String {
        match self {
            Self::Date => format!("{acc} instanceof Date"),
            Self::Bytes => format!("{acc} instanceof Uint8Array"),
            _ => format!("typeof {acc} === '{}'", self.type_name()),
        }
    }
}

/// Maps a scalar name to its terminal representation.
///
/// Calendar and byte scalars are checked before the base chain so that
/// their representation follows `serializable_date_types` no matter what
/// they extend.
fn terminal(name: &str, serializable: bool) -> Option<Terminal> {
    let t = match name {
        "offsetDateTime" | "plainDate" | "utcDateTime" if serializable => Terminal::String,
        "unixTimestamp32" if serializable => Terminal::Number,
        "offsetDateTime" | "plainDate" | "utcDateTime" | "unixTimestamp32" => Terminal::Date,
        "bytes" if serializable => Terminal::String,
        "bytes" => Terminal::Bytes,
        "boolean" => Terminal::Boolean,
        "duration" | "numeric" => Terminal::Number,
        "plainTime" | "string" | "url" => Terminal::String,
        _ => return None,
    };
    Some(t)
}

fn is_calendar_or_bytes(name: &str) -> bool {
    matches!(
        name,
        "offsetDateTime" | "plainDate" | "utcDateTime" | "unixTimestamp32" | "bytes"
    )
}

impl ScalarResolver {
    fn emit(
        engine: &mut Engine<'_>,
        mode: Mode,
        id: NodeId,
        ctx: &Context,
    ) -> Result<Resolution, CodegenError> {
        let def: &ScalarDef = engine.node_as(mode, id, "Scalar", |n| match n {
            SchemaNode::Scalar(s) => Some(s),
            _ => None,
        })?;
        let name = def.decl.name.as_deref().unwrap_or_default();
        let config = engine.config();
        let acc = ctx.accessor();

        let mapped = match mode {
            Mode::Type => config.type_mappings.get(name).cloned(),
            Mode::Predicate => config
                .typeguard_mappings
                .get(name)
                .map(|template| template.replace("{}", acc)),
        };
        if let Some(text) = mapped {
            return Ok(Resolution::new(text));
        }

        let serializable = config.serializable_date_types;
        let builtin = def.decl.namespace.len() == 1 && def.decl.namespace[0] == BUILTIN_NAMESPACE;
        if !(builtin && is_calendar_or_bytes(name))
            && let Some(base) = def.base
        {
            return engine.resolve(mode, base, &ctx.enter_flat(id));
        }

        let terminal = if builtin { terminal(name, serializable) } else { None };
        let text = match (terminal, mode) {
            (Some(t), Mode::Type) => t.type_name().to_string(),
            (Some(t), Mode::Predicate) => t.predicate(acc),
            (None, _) => {
                engine.report(Diagnostic::warning(
                    "resolve-unresolved-scalar",
                    format!("could not resolve scalar '{name}' ({mode}), using a permissive fallback"),
                ));
                match mode {
                    Mode::Type => "unknown".to_string(),
                    Mode::Predicate => "true".to_string(),
                }
            }
        };
        Ok(Resolution::new(text))
    }
}

impl KindResolver for ScalarResolver {
    fn emit_type(
        &self,
        engine: &mut Engine<'_>,
        id: NodeId,
        ctx: &Context,
    ) -> Result<Resolution, CodegenError> {
        Self::emit(engine, Mode::Type, id, ctx)
    }

    fn emit_predicate(
        &self,
        engine: &mut Engine<'_>,
        id: NodeId,
        ctx: &Context,
    ) -> Result<Resolution, CodegenError> {
        Self::emit(engine, Mode::Predicate, id, ctx)
    }
}
