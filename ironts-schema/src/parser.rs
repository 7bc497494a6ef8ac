//! XML schema parser.
//!
//! Parsing happens in two passes. The first pass reads the XML into a small
//! declaration tree where type references are still plain names. The second
//! pass reserves one node per declaration and then resolves every body, so
//! forward and cyclic references need no special handling.

use std::collections::HashMap;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::ParseError;
use crate::operations::{HttpVerb, OperationDef, ResponseDef};
use crate::types::{
    BUILTIN_NAMESPACE, Decl, EnumDef, EnumMember, EnumMemberRef, EnumValue, Intrinsic, Lifecycle,
    LifecycleSet, ModelDef, NodeId, NodeKind, Primitive, Property, ScalarDef, Schema, SchemaNode,
    TupleDef, UnionDef,
};

type XmlReader<'a> = Reader<&'a [u8]>;

/// Built-in scalars and the scalar each one extends.
const BUILTIN_SCALARS: &[(&str, Option<&str>)] = &[
    ("boolean", None),
    ("bytes", None),
    ("duration", None),
    ("numeric", None),
    ("plainTime", None),
    ("string", None),
    ("url", None),
    ("offsetDateTime", None),
    ("plainDate", None),
    ("utcDateTime", None),
    ("unixTimestamp32", None),
    ("integer", Some("numeric")),
    ("int8", Some("integer")),
    ("int16", Some("integer")),
    ("int32", Some("integer")),
    ("int64", Some("integer")),
    ("uint8", Some("integer")),
    ("uint16", Some("integer")),
    ("uint32", Some("integer")),
    ("uint64", Some("integer")),
    ("safeint", Some("integer")),
    ("float", Some("numeric")),
    ("float32", Some("float")),
    ("float64", Some("float")),
    ("decimal", Some("numeric")),
    ("decimal128", Some("decimal")),
];

/// Parses an XML schema from a string.
///
/// # Arguments
/// * `xml` - XML schema content
///
/// # Returns
/// The schema graph with every type reference resolved.
///
/// # Errors
/// Returns `ParseError` if the XML is malformed, an element or attribute is
/// invalid, a name is declared twice or a referenced type does not exist.
pub fn parse_schema(xml: &str) -> Result<Schema, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut ast: Option<SchemaAst> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = element_name(e)?;
                if name != "schema" {
                    return Err(ParseError::unknown_element(name, "document"));
                }
                let mut schema_ast = SchemaAst::new(&Attrs::parse(e)?);
                parse_schema_body(&mut reader, &mut schema_ast)?;
                ast = Some(schema_ast);
            }
            Ok(Event::Empty(ref e)) => {
                let name = element_name(e)?;
                if name != "schema" {
                    return Err(ParseError::unknown_element(name, "document"));
                }
                ast = Some(SchemaAst::new(&Attrs::parse(e)?));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    let ast = ast.ok_or_else(|| ParseError::structure("No schema element found"))?;
    lower(ast)
}

/// Reads and parses an XML schema file.
///
/// # Errors
/// Returns `ParseError::Io` if the file cannot be read, or any error of
/// [`parse_schema`].
pub fn parse_schema_file(path: impl AsRef<Path>) -> Result<Schema, ParseError> {
    let xml = std::fs::read_to_string(path)?;
    parse_schema(&xml)
}

#[derive(Debug, Default)]
struct SchemaAst {
    root_namespaces: Vec<String>,
    decls: Vec<DeclAst>,
    operations: Vec<OperationAst>,
}

impl SchemaAst {
    fn new(attrs: &Attrs) -> Self {
        let root_namespaces = attrs
            .get("rootNamespaces")
            .map(|roots| {
                roots
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            root_namespaces,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
struct DeclAst {
    name: String,
    namespace: Vec<String>,
    doc: Option<String>,
    body: DeclBody,
}

impl DeclAst {
    fn qualified_name(&self) -> String {
        let mut parts = self.namespace.clone();
        parts.push(self.name.clone());
        parts.join(".")
    }

    fn decl(&self) -> Decl {
        Decl {
            name: Some(self.name.clone()),
            namespace: self.namespace.clone(),
            doc: self.doc.clone(),
        }
    }
}

#[derive(Debug)]
enum DeclBody {
    Model {
        base: Option<String>,
        properties: Vec<PropertyAst>,
    },
    Enum(Vec<EnumMember>),
    Union(Vec<TypeExpr>),
    Scalar {
        base: Option<String>,
    },
}

impl DeclBody {
    const fn kind_name(&self) -> &'static str {
        match self {
            Self::Model { .. } => "model",
            Self::Enum(_) => "enum",
            Self::Union(_) => "union",
            Self::Scalar { .. } => "scalar",
        }
    }
}

#[derive(Debug)]
struct PropertyAst {
    name: String,
    ty: TypeExpr,
    optional: bool,
    visibility: Option<LifecycleSet>,
    doc: Option<String>,
}

#[derive(Debug)]
enum TypeExpr {
    Named(String),
    Array(Box<TypeExpr>),
    Record(Box<TypeExpr>),
    Tuple(Vec<TypeExpr>),
    Union(Vec<TypeExpr>),
    Model(Vec<PropertyAst>),
    String(String),
    Number(String),
    Boolean(bool),
    Opaque(String),
}

#[derive(Debug)]
struct OperationAst {
    name: String,
    namespace: Vec<String>,
    verb: HttpVerb,
    path: String,
    doc: Option<String>,
    request: Option<TypeExpr>,
    responses: Vec<(Option<u16>, Option<TypeExpr>)>,
}

/// Attributes of one element, decoded up front.
struct Attrs(Vec<(String, String)>);

impl Attrs {
    fn parse(e: &BytesStart<'_>) -> Result<Self, ParseError> {
        let mut out = Vec::new();
        for attr in e.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?;
            let value = std::str::from_utf8(&attr.value)?;
            out.push((key.to_string(), value.to_string()));
        }
        Ok(Self(out))
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn require(&self, element: &str, key: &str) -> Result<&str, ParseError> {
        self.get(key)
            .ok_or_else(|| ParseError::missing_attr(element, key))
    }

    fn flag(&self, element: &str, key: &str) -> Result<bool, ParseError> {
        match self.get(key) {
            None | Some("false") => Ok(false),
            Some("true") => Ok(true),
            Some(other) => Err(ParseError::invalid_attr(element, key, other)),
        }
    }

    fn doc(&self) -> Option<String> {
        self.get("doc").map(str::to_string)
    }
}

fn element_name(e: &BytesStart<'_>) -> Result<String, ParseError> {
    Ok(std::str::from_utf8(e.name().as_ref())?.to_string())
}

fn unexpected_eof(element: &str) -> ParseError {
    ParseError::structure(format!("unexpected end of document inside '{element}'"))
}

/// Reads the children of an element up to its end tag.
///
/// `on_child` receives every child element together with a flag telling
/// whether it was self-closing; for non-empty children it must consume
/// everything up to and including the child's end tag.
fn read_children<'a, F>(
    reader: &mut XmlReader<'a>,
    element: &str,
    mut on_child: F,
) -> Result<(), ParseError>
where
    F: FnMut(&mut XmlReader<'a>, &BytesStart<'_>, bool) -> Result<(), ParseError>,
{
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => on_child(reader, e, false)?,
            Ok(Event::Empty(ref e)) => on_child(reader, e, true)?,
            Ok(Event::End(_)) => break,
            Ok(Event::Eof) => return Err(unexpected_eof(element)),
            Err(e) => return Err(ParseError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

/// Consumes the end tag of an element that takes no children.
fn finish_leaf(reader: &mut XmlReader<'_>, element: &str, empty: bool) -> Result<(), ParseError> {
    if empty {
        return Ok(());
    }
    read_children(reader, element, |_, child, _| {
        Err(ParseError::unknown_element(element_name(child)?, element))
    })
}

fn parse_schema_body(reader: &mut XmlReader<'_>, ast: &mut SchemaAst) -> Result<(), ParseError> {
    read_children(reader, "schema", |reader, e, empty| {
        let name = element_name(e)?;
        if name != "namespace" {
            return Err(ParseError::unknown_element(name, "schema"));
        }
        parse_namespace(reader, e, empty, &[], ast)
    })
}

fn parse_namespace(
    reader: &mut XmlReader<'_>,
    e: &BytesStart<'_>,
    empty: bool,
    parent: &[String],
    ast: &mut SchemaAst,
) -> Result<(), ParseError> {
    let attrs = Attrs::parse(e)?;
    let mut path = parent.to_vec();
    for segment in attrs.require("namespace", "name")?.split('.') {
        path.push(segment.to_string());
    }
    if empty {
        return Ok(());
    }

    read_children(reader, "namespace", |reader, e, empty| {
        let name = element_name(e)?;
        match name.as_str() {
            "namespace" => parse_namespace(reader, e, empty, &path, ast),
            "operation" => {
                let op = parse_operation(reader, e, empty, &path)?;
                ast.operations.push(op);
                Ok(())
            }
            _ => {
                let decl = parse_declaration(reader, e, empty, &name, &path)?;
                ast.decls.push(decl);
                Ok(())
            }
        }
    })
}

fn parse_declaration(
    reader: &mut XmlReader<'_>,
    e: &BytesStart<'_>,
    empty: bool,
    element: &str,
    namespace: &[String],
) -> Result<DeclAst, ParseError> {
    let attrs = Attrs::parse(e)?;
    let name = attrs.require(element, "name")?.to_string();

    let body = match element {
        "model" => DeclBody::Model {
            base: attrs.get("base").map(str::to_string),
            properties: parse_properties(reader, element, empty)?,
        },
        "enum" => DeclBody::Enum(parse_enum_members(reader, empty)?),
        "union" => DeclBody::Union(parse_type_list(reader, element, empty)?),
        "scalar" => {
            finish_leaf(reader, element, empty)?;
            DeclBody::Scalar {
                base: attrs.get("base").map(str::to_string),
            }
        }
        _ => return Err(ParseError::unknown_element(element, "namespace")),
    };

    Ok(DeclAst {
        name,
        namespace: namespace.to_vec(),
        doc: attrs.doc(),
        body,
    })
}

fn parse_enum_members(
    reader: &mut XmlReader<'_>,
    empty: bool,
) -> Result<Vec<EnumMember>, ParseError> {
    let mut members = Vec::new();
    if empty {
        return Ok(members);
    }
    read_children(reader, "enum", |reader, e, empty| {
        let element = element_name(e)?;
        if element != "member" {
            return Err(ParseError::unknown_element(element, "enum"));
        }
        let attrs = Attrs::parse(e)?;
        let mut member = EnumMember::new(attrs.require("member", "name")?);
        if let Some(number) = attrs.get("number") {
            member.value = Some(EnumValue::Number(parse_number(
                "member", "number", number,
            )?));
        } else if let Some(value) = attrs.get("value") {
            member.value = Some(EnumValue::String(value.to_string()));
        }
        member.doc = attrs.doc();
        finish_leaf(reader, "member", empty)?;
        members.push(member);
        Ok(())
    })?;
    Ok(members)
}

fn parse_properties(
    reader: &mut XmlReader<'_>,
    element: &str,
    empty: bool,
) -> Result<Vec<PropertyAst>, ParseError> {
    let mut properties = Vec::new();
    if empty {
        return Ok(properties);
    }
    read_children(reader, element, |reader, e, empty| {
        let child = element_name(e)?;
        if child != "property" {
            return Err(ParseError::unknown_element(child, element));
        }
        properties.push(parse_property(reader, e, empty)?);
        Ok(())
    })?;
    Ok(properties)
}

fn parse_property(
    reader: &mut XmlReader<'_>,
    e: &BytesStart<'_>,
    empty: bool,
) -> Result<PropertyAst, ParseError> {
    let attrs = Attrs::parse(e)?;
    let name = attrs.require("property", "name")?.to_string();
    let optional = attrs.flag("property", "optional")?;
    let visibility = attrs
        .get("visibility")
        .map(parse_visibility)
        .transpose()?;
    let ty = parse_required_type(reader, "property", &attrs, empty)?;

    Ok(PropertyAst {
        name,
        ty,
        optional,
        visibility,
        doc: attrs.doc(),
    })
}

/// Parses a comma-separated list of lifecycle states.
fn parse_visibility(value: &str) -> Result<LifecycleSet, ParseError> {
    value
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            Lifecycle::parse(s)
                .ok_or_else(|| ParseError::invalid_attr("property", "visibility", value))
        })
        .collect()
}

/// Accepts a finite decimal literal: `-?digits[.digits][(e|E)[+-]digits]`.
fn parse_number(element: &str, attribute: &str, value: &str) -> Result<String, ParseError> {
    let trimmed = value.trim();
    let finite = trimmed.parse::<f64>().is_ok_and(f64::is_finite);
    if !finite || !is_numeric_literal(trimmed) {
        return Err(ParseError::invalid_attr(element, attribute, value));
    }
    Ok(trimmed.to_string())
}

fn is_numeric_literal(s: &str) -> bool {
    fn digits(s: &str) -> (usize, &str) {
        let n = s.bytes().take_while(u8::is_ascii_digit).count();
        (n, &s[n..])
    }

    let s = s.strip_prefix('-').unwrap_or(s);
    let (int_len, mut rest) = digits(s);
    if int_len == 0 {
        return false;
    }
    if let Some(fraction) = rest.strip_prefix('.') {
        let (frac_len, after) = digits(fraction);
        if frac_len == 0 {
            return false;
        }
        rest = after;
    }
    if let Some(exponent) = rest.strip_prefix(['e', 'E']) {
        let exponent = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
        let (exp_len, after) = digits(exponent);
        if exp_len == 0 {
            return false;
        }
        rest = after;
    }
    rest.is_empty()
}

/// Reads a type given either by a `type` attribute or by one child element.
fn parse_optional_type(
    reader: &mut XmlReader<'_>,
    element: &str,
    attrs: &Attrs,
    empty: bool,
) -> Result<Option<TypeExpr>, ParseError> {
    if let Some(name) = attrs.get("type") {
        finish_leaf(reader, element, empty)?;
        return Ok(Some(TypeExpr::Named(name.to_string())));
    }
    if empty {
        return Ok(None);
    }
    let mut found = None;
    read_children(reader, element, |reader, child, empty| {
        let ty = parse_type_element(reader, child, empty)?;
        if found.replace(ty).is_some() {
            return Err(ParseError::structure(format!(
                "'{element}' takes exactly one type"
            )));
        }
        Ok(())
    })?;
    Ok(found)
}

fn parse_required_type(
    reader: &mut XmlReader<'_>,
    element: &str,
    attrs: &Attrs,
    empty: bool,
) -> Result<TypeExpr, ParseError> {
    parse_optional_type(reader, element, attrs, empty)?
        .ok_or_else(|| ParseError::missing_attr(element, "type"))
}

fn parse_type_list(
    reader: &mut XmlReader<'_>,
    element: &str,
    empty: bool,
) -> Result<Vec<TypeExpr>, ParseError> {
    let mut types = Vec::new();
    if empty {
        return Ok(types);
    }
    read_children(reader, element, |reader, child, empty| {
        types.push(parse_type_element(reader, child, empty)?);
        Ok(())
    })?;
    Ok(types)
}

/// Parses one inline type element.
fn parse_type_element(
    reader: &mut XmlReader<'_>,
    e: &BytesStart<'_>,
    empty: bool,
) -> Result<TypeExpr, ParseError> {
    let element = element_name(e)?;
    let attrs = Attrs::parse(e)?;
    let element = element.as_str();

    let ty = match element {
        "ref" | "variant" => {
            let name = attrs.require(element, "type")?.to_string();
            finish_leaf(reader, element, empty)?;
            TypeExpr::Named(name)
        }
        "string" => {
            let value = attrs.require(element, "value")?.to_string();
            finish_leaf(reader, element, empty)?;
            TypeExpr::String(value)
        }
        "number" => {
            let value = parse_number(element, "value", attrs.require(element, "value")?)?;
            finish_leaf(reader, element, empty)?;
            TypeExpr::Number(value)
        }
        "boolean" => {
            let value = match attrs.require(element, "value")? {
                "true" => true,
                "false" => false,
                other => return Err(ParseError::invalid_attr(element, "value", other)),
            };
            finish_leaf(reader, element, empty)?;
            TypeExpr::Boolean(value)
        }
        "opaque" => {
            let kind = attrs.require(element, "kind")?.to_string();
            finish_leaf(reader, element, empty)?;
            TypeExpr::Opaque(kind)
        }
        "array" => TypeExpr::Array(Box::new(parse_required_type(
            reader, element, &attrs, empty,
        )?)),
        "record" => TypeExpr::Record(Box::new(parse_required_type(
            reader, element, &attrs, empty,
        )?)),
        "tuple" => TypeExpr::Tuple(parse_type_list(reader, element, empty)?),
        "union" => TypeExpr::Union(parse_type_list(reader, element, empty)?),
        "model" => TypeExpr::Model(parse_properties(reader, element, empty)?),
        _ => return Err(ParseError::unknown_element(element, "type")),
    };
    Ok(ty)
}

fn parse_operation(
    reader: &mut XmlReader<'_>,
    e: &BytesStart<'_>,
    empty: bool,
    namespace: &[String],
) -> Result<OperationAst, ParseError> {
    let attrs = Attrs::parse(e)?;
    let name = attrs.require("operation", "name")?.to_string();
    let verb_str = attrs.require("operation", "verb")?;
    let verb = HttpVerb::parse(verb_str)
        .ok_or_else(|| ParseError::invalid_attr("operation", "verb", verb_str))?;
    let path = attrs.require("operation", "path")?.to_string();

    let mut op = OperationAst {
        name,
        namespace: namespace.to_vec(),
        verb,
        path,
        doc: attrs.doc(),
        request: None,
        responses: Vec::new(),
    };
    if empty {
        return Ok(op);
    }

    read_children(reader, "operation", |reader, e, empty| {
        let element = element_name(e)?;
        let attrs = Attrs::parse(e)?;
        match element.as_str() {
            "request" => {
                if op.request.is_some() {
                    return Err(ParseError::duplicate("request", &op.name));
                }
                op.request = Some(parse_required_type(reader, "request", &attrs, empty)?);
            }
            "response" => {
                let status = attrs
                    .get("status")
                    .map(|s| {
                        s.trim()
                            .parse::<u16>()
                            .map_err(|_| ParseError::invalid_attr("response", "status", s))
                    })
                    .transpose()?;
                let body = parse_optional_type(reader, "response", &attrs, empty)?;
                op.responses.push((status, body));
            }
            _ => return Err(ParseError::unknown_element(element, "operation")),
        }
        Ok(())
    })?;
    Ok(op)
}

/// Second pass: builds the node arena from the declaration tree.
fn lower(ast: SchemaAst) -> Result<Schema, ParseError> {
    let mut lowering = Lowering {
        schema: Schema::new(ast.root_namespaces),
        builtins: HashMap::new(),
    };

    let mut ids = Vec::with_capacity(ast.decls.len());
    for decl in &ast.decls {
        ids.push(lowering.declare(decl)?);
    }
    for (decl, id) in ast.decls.iter().zip(ids) {
        lowering.define(decl, id)?;
    }
    for op in &ast.operations {
        lowering.operation(op)?;
    }

    Ok(lowering.schema)
}

struct Lowering {
    schema: Schema,
    builtins: HashMap<&'static str, NodeId>,
}

impl Lowering {
    /// Reserves the node of a declaration. Enums are complete after this
    /// step; other kinds get their bodies in [`Self::define`].
    fn declare(&mut self, decl: &DeclAst) -> Result<NodeId, ParseError> {
        let qualified = decl.qualified_name();
        if self.schema.has_declaration(&qualified) {
            return Err(ParseError::duplicate(decl.body.kind_name(), qualified));
        }
        let node = match &decl.body {
            DeclBody::Model { .. } => SchemaNode::Model(ModelDef::new(decl.decl())),
            DeclBody::Enum(members) => SchemaNode::Enum(EnumDef {
                decl: decl.decl(),
                members: members.clone(),
            }),
            DeclBody::Union(_) => SchemaNode::Union(UnionDef {
                decl: decl.decl(),
                variants: Vec::new(),
            }),
            DeclBody::Scalar { .. } => SchemaNode::Scalar(ScalarDef {
                decl: decl.decl(),
                base: None,
            }),
        };
        Ok(self.schema.add_declaration(node))
    }

    fn define(&mut self, decl: &DeclAst, id: NodeId) -> Result<(), ParseError> {
        let scope = decl.namespace.as_slice();
        let referrer = decl.qualified_name();
        let node = match &decl.body {
            DeclBody::Enum(_) => return Ok(()),
            DeclBody::Model { base, properties } => {
                let mut model = ModelDef::new(decl.decl());
                if let Some(base) = base {
                    let base_id = self.resolve_name(base, scope, &referrer)?;
                    if self.schema.node(base_id).kind() != NodeKind::Model {
                        return Err(ParseError::structure(format!(
                            "base '{base}' of model '{referrer}' is not a model"
                        )));
                    }
                    model.base = Some(base_id);
                }
                for prop in properties {
                    model.add_property(self.property(prop, scope, &referrer)?);
                }
                SchemaNode::Model(model)
            }
            DeclBody::Union(variants) => SchemaNode::Union(UnionDef {
                decl: decl.decl(),
                variants: self.type_list(variants, scope, &referrer)?,
            }),
            DeclBody::Scalar { base } => {
                let base = match base {
                    Some(base) => {
                        let base_id = self.resolve_name(base, scope, &referrer)?;
                        if self.schema.node(base_id).kind() != NodeKind::Scalar {
                            return Err(ParseError::structure(format!(
                                "base '{base}' of scalar '{referrer}' is not a scalar"
                            )));
                        }
                        Some(base_id)
                    }
                    None => None,
                };
                SchemaNode::Scalar(ScalarDef {
                    decl: decl.decl(),
                    base,
                })
            }
        };
        self.schema.replace_node(id, node);
        Ok(())
    }

    fn operation(&mut self, op: &OperationAst) -> Result<(), ParseError> {
        let scope = op.namespace.as_slice();
        let referrer = format!("{}.{}", op.namespace.join("."), op.name);

        let mut def = OperationDef::new(&op.name, op.namespace.clone(), &op.path, op.verb);
        def.doc = op.doc.clone();
        if let Some(request) = &op.request {
            def.request = Some(self.lower_type(request, scope, &referrer)?);
        }
        for (status, body) in &op.responses {
            let body = match body {
                Some(body) => Some(self.lower_type(body, scope, &referrer)?),
                None => None,
            };
            def.responses.push(ResponseDef {
                status: *status,
                body,
            });
        }
        self.schema.operations.push(def);
        Ok(())
    }

    fn property(
        &mut self,
        prop: &PropertyAst,
        scope: &[String],
        referrer: &str,
    ) -> Result<Property, ParseError> {
        let referrer = format!("{referrer}.{}", prop.name);
        Ok(Property {
            name: prop.name.clone(),
            ty: self.lower_type(&prop.ty, scope, &referrer)?,
            optional: prop.optional,
            visibility: prop.visibility.clone(),
            doc: prop.doc.clone(),
        })
    }

    fn type_list(
        &mut self,
        types: &[TypeExpr],
        scope: &[String],
        referrer: &str,
    ) -> Result<Vec<NodeId>, ParseError> {
        types
            .iter()
            .map(|t| self.lower_type(t, scope, referrer))
            .collect()
    }

    fn lower_type(
        &mut self,
        ty: &TypeExpr,
        scope: &[String],
        referrer: &str,
    ) -> Result<NodeId, ParseError> {
        let node = match ty {
            TypeExpr::Named(name) => return self.resolve_name(name, scope, referrer),
            TypeExpr::Array(element) => {
                let element = self.lower_type(element, scope, referrer)?;
                SchemaNode::Model(ModelDef::array(element))
            }
            TypeExpr::Record(element) => {
                let element = self.lower_type(element, scope, referrer)?;
                SchemaNode::Model(ModelDef::record(element))
            }
            TypeExpr::Tuple(elements) => SchemaNode::Tuple(TupleDef {
                elements: self.type_list(elements, scope, referrer)?,
            }),
            TypeExpr::Union(variants) => SchemaNode::Union(UnionDef {
                decl: Decl::anonymous(),
                variants: self.type_list(variants, scope, referrer)?,
            }),
            TypeExpr::Model(properties) => {
                let mut model = ModelDef::new(Decl::anonymous());
                for prop in properties {
                    model.add_property(self.property(prop, scope, referrer)?);
                }
                SchemaNode::Model(model)
            }
            TypeExpr::String(value) => SchemaNode::Primitive(Primitive::String(value.clone())),
            TypeExpr::Number(value) => SchemaNode::Primitive(Primitive::Number(value.clone())),
            TypeExpr::Boolean(value) => SchemaNode::Primitive(Primitive::Boolean(*value)),
            TypeExpr::Opaque(kind) => SchemaNode::Opaque { kind: kind.clone() },
        };
        Ok(self.schema.add_node(node))
    }

    /// Resolves a type name as written in the schema.
    ///
    /// Lookup order: intrinsics, declarations relative to the enclosing
    /// namespaces (innermost first), built-in scalars, then `Enum.Member`.
    fn resolve_name(
        &mut self,
        name: &str,
        scope: &[String],
        referrer: &str,
    ) -> Result<NodeId, ParseError> {
        if let Some(intrinsic) = Intrinsic::parse(name) {
            return Ok(self
                .schema
                .add_node(SchemaNode::Primitive(Primitive::Intrinsic(intrinsic))));
        }
        if let Some(id) = self.lookup_declaration(name, scope) {
            return Ok(id);
        }
        if let Some(id) = self.builtin(name) {
            return Ok(id);
        }
        if let Some((owner, member)) = name.rsplit_once('.')
            && let Some(enum_id) = self.lookup_declaration(owner, scope)
            && let SchemaNode::Enum(def) = self.schema.node(enum_id)
            && def.member(member).is_some()
        {
            return Ok(self.schema.add_node(SchemaNode::EnumMember(EnumMemberRef {
                enum_id,
                member: member.to_string(),
            })));
        }
        Err(ParseError::unknown_type(name, referrer))
    }

    fn lookup_declaration(&self, name: &str, scope: &[String]) -> Option<NodeId> {
        (0..=scope.len()).rev().find_map(|len| {
            let candidate = if len == 0 {
                name.to_string()
            } else {
                format!("{}.{name}", scope[..len].join("."))
            };
            self.schema.get_declaration(&candidate)
        })
    }

    /// Returns the node of a built-in scalar, creating it and its base chain
    /// on first use.
    fn builtin(&mut self, name: &str) -> Option<NodeId> {
        let name = name
            .strip_prefix(BUILTIN_NAMESPACE)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(name);
        let &(builtin, base) = BUILTIN_SCALARS.iter().find(|(n, _)| *n == name)?;
        if let Some(&id) = self.builtins.get(builtin) {
            return Some(id);
        }
        let base = base.and_then(|b| self.builtin(b));
        let id = self.schema.add_node(SchemaNode::Scalar(ScalarDef {
            decl: Decl::named(builtin, vec![BUILTIN_NAMESPACE.to_string()]),
            base,
        }));
        self.builtins.insert(builtin, id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IndexedKind;

    const PETSTORE: &str = r#"
        <schema rootNamespaces="Store">
          <namespace name="Store">
            <model name="Pet" doc="A pet in the store">
              <property name="name" type="string" doc="Display name"/>
              <property name="age" type="int32" optional="true"/>
              <property name="owner" type="People.Person"/>
              <property name="id" type="string" visibility="read"/>
            </model>
            <enum name="Kind">
              <member name="Dog"/>
              <member name="Cat" value="cat"/>
              <member name="Bird" number="3"/>
            </enum>
            <namespace name="People">
              <model name="Person">
                <property name="pets" optional="true">
                  <array type="Pet"/>
                </property>
              </model>
            </namespace>
          </namespace>
        </schema>
    "#;

    fn model<'a>(schema: &'a Schema, qualified: &str) -> &'a ModelDef {
        let id = schema
            .get_declaration(qualified)
            .expect("declaration not found");
        match schema.node(id) {
            SchemaNode::Model(m) => m,
            other => panic!("expected model, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_simple_schema() {
        let schema = parse_schema(PETSTORE).expect("Failed to parse");
        assert_eq!(schema.root_namespaces, vec!["Store".to_string()]);
        assert_eq!(schema.declarations.len(), 3);

        let pet = model(&schema, "Store.Pet");
        assert_eq!(pet.decl.doc.as_deref(), Some("A pet in the store"));
        assert_eq!(pet.properties.len(), 4);
        assert!(pet.properties[1].optional);
        assert_eq!(pet.properties[0].doc.as_deref(), Some("Display name"));
        let id_vis = pet.properties[3].visibility.as_ref().expect("visibility");
        assert!(id_vis.contains(&Lifecycle::Read));
        assert_eq!(id_vis.len(), 1);
    }

    #[test]
    fn test_parse_resolves_relative_and_outer_names() {
        let schema = parse_schema(PETSTORE).expect("Failed to parse");
        let pet = model(&schema, "Store.Pet");
        let person_id = schema.get_declaration("Store.People.Person").expect("person");
        assert_eq!(pet.properties[2].ty, person_id);

        // Person refers to Pet from an inner namespace.
        let person = model(&schema, "Store.People.Person");
        let SchemaNode::Model(array) = schema.node(person.properties[0].ty) else {
            panic!("expected array model");
        };
        assert_eq!(array.indexed_kind(), Some(IndexedKind::Array));
        assert_eq!(array.indexer, schema.get_declaration("Store.Pet"));
    }

    #[test]
    fn test_parse_builtin_scalar_chain() {
        let schema = parse_schema(PETSTORE).expect("Failed to parse");
        let pet = model(&schema, "Store.Pet");
        let SchemaNode::Scalar(int32) = schema.node(pet.properties[1].ty) else {
            panic!("expected scalar");
        };
        assert_eq!(int32.decl.name.as_deref(), Some("int32"));
        assert_eq!(int32.decl.namespace, vec![BUILTIN_NAMESPACE.to_string()]);

        let integer = int32.base.expect("int32 extends integer");
        let SchemaNode::Scalar(integer) = schema.node(integer) else {
            panic!("expected scalar");
        };
        assert_eq!(integer.decl.name.as_deref(), Some("integer"));
        let numeric = integer.base.expect("integer extends numeric");
        assert_eq!(schema.node(numeric).name(), Some("numeric"));
    }

    #[test]
    fn test_parse_builtins_are_shared() {
        let schema = parse_schema(PETSTORE).expect("Failed to parse");
        let pet = model(&schema, "Store.Pet");
        assert_eq!(pet.properties[0].ty, pet.properties[3].ty);
    }

    #[test]
    fn test_parse_enum_values() {
        let schema = parse_schema(PETSTORE).expect("Failed to parse");
        let id = schema.get_declaration("Store.Kind").expect("enum");
        let SchemaNode::Enum(kind) = schema.node(id) else {
            panic!("expected enum");
        };
        assert_eq!(kind.members.len(), 3);
        assert_eq!(kind.members[0].value, None);
        assert_eq!(
            kind.members[1].value,
            Some(EnumValue::String("cat".to_string()))
        );
        assert_eq!(
            kind.members[2].value,
            Some(EnumValue::Number("3".to_string()))
        );
    }

    #[test]
    fn test_parse_self_reference() {
        let xml = r#"
            <schema rootNamespaces="T">
              <namespace name="T">
                <model name="Node">
                  <property name="next" type="Node" optional="true"/>
                  <property name="children"><array type="Node"/></property>
                </model>
              </namespace>
            </schema>
        "#;
        let schema = parse_schema(xml).expect("Failed to parse");
        let id = schema.get_declaration("T.Node").expect("node");
        let node = model(&schema, "T.Node");
        assert_eq!(node.properties[0].ty, id);
    }

    #[test]
    fn test_parse_inline_types_and_literals() {
        let xml = r#"
            <schema>
              <namespace name="T">
                <union name="Shape">
                  <string value="circle"/>
                  <number value="4"/>
                  <boolean value="false"/>
                  <ref type="null"/>
                </union>
                <model name="M">
                  <property name="pair">
                    <tuple><ref type="string"/><ref type="boolean"/></tuple>
                  </property>
                  <property name="tags"><record type="string"/></property>
                  <property name="inner">
                    <model><property name="x" type="float64"/></model>
                  </property>
                  <property name="kind" type="Color.Red"/>
                </model>
                <enum name="Color"><member name="Red"/></enum>
              </namespace>
            </schema>
        "#;
        let schema = parse_schema(xml).expect("Failed to parse");
        assert!(schema.root_namespaces.is_empty());

        let shape = schema.get_declaration("T.Shape").expect("union");
        let SchemaNode::Union(u) = schema.node(shape) else {
            panic!("expected union");
        };
        assert_eq!(u.variants.len(), 4);
        assert_eq!(
            schema.node(u.variants[0]),
            &SchemaNode::Primitive(Primitive::String("circle".into()))
        );
        assert_eq!(
            schema.node(u.variants[3]),
            &SchemaNode::Primitive(Primitive::Intrinsic(Intrinsic::Null))
        );

        let m = model(&schema, "T.M");
        assert!(matches!(schema.node(m.properties[0].ty), SchemaNode::Tuple(t) if t.elements.len() == 2));
        assert!(schema.node(m.properties[1].ty).is_indexed_model());
        assert!(matches!(schema.node(m.properties[2].ty), SchemaNode::Model(inner) if inner.decl.name.is_none()));
        let SchemaNode::EnumMember(member) = schema.node(m.properties[3].ty) else {
            panic!("expected enum member");
        };
        assert_eq!(member.member, "Red");
        assert_eq!(Some(member.enum_id), schema.get_declaration("T.Color"));
    }

    #[test]
    fn test_parse_model_base_and_scalar_base() {
        let xml = r#"
            <schema rootNamespaces="T">
              <namespace name="T">
                <model name="Derived" base="Base">
                  <property name="b" type="Id"/>
                </model>
                <model name="Base"><property name="a" type="string"/></model>
                <scalar name="Id" base="string"/>
              </namespace>
            </schema>
        "#;
        let schema = parse_schema(xml).expect("Failed to parse");
        let derived = model(&schema, "T.Derived");
        assert_eq!(derived.base, schema.get_declaration("T.Base"));
        let id = schema.get_declaration("T.Id").expect("scalar");
        let SchemaNode::Scalar(scalar) = schema.node(id) else {
            panic!("expected scalar");
        };
        assert_eq!(
            scalar.base.map(|b| schema.node(b).name().map(str::to_string)),
            Some(Some("string".to_string()))
        );
    }

    #[test]
    fn test_parse_operations() {
        let xml = r#"
            <schema rootNamespaces="Api">
              <namespace name="Api">
                <model name="Pet"><property name="name" type="string"/></model>
                <operation name="create" verb="post" path="/pets">
                  <request type="Pet"/>
                  <response status="201" type="Pet"/>
                  <response status="400"/>
                </operation>
                <operation name="list" verb="GET" path="/pets">
                  <response><array type="Pet"/></response>
                </operation>
              </namespace>
            </schema>
        "#;
        let schema = parse_schema(xml).expect("Failed to parse");
        assert_eq!(schema.operations.len(), 2);

        let create = &schema.operations[0];
        assert_eq!(create.verb, HttpVerb::Post);
        assert_eq!(create.request, schema.get_declaration("Api.Pet"));
        assert_eq!(create.responses.len(), 2);
        assert_eq!(create.responses[0].status, Some(201));
        assert_eq!(create.responses[1].body, None);

        let list = &schema.operations[1];
        assert_eq!(list.request, None);
        assert_eq!(list.responses[0].status, None);
        assert!(list.responses[0].body.is_some());
    }

    #[test]
    fn test_parse_unknown_type() {
        let xml = r#"
            <schema><namespace name="T">
              <model name="M"><property name="x" type="Missing"/></model>
            </namespace></schema>
        "#;
        let err = parse_schema(xml).unwrap_err();
        assert!(matches!(err, ParseError::UnknownType { ref type_name, .. } if type_name == "Missing"));
    }

    #[test]
    fn test_parse_duplicate_declaration() {
        let xml = r#"
            <schema><namespace name="T">
              <model name="M"/>
              <union name="M"/>
            </namespace></schema>
        "#;
        let err = parse_schema(xml).unwrap_err();
        assert!(matches!(err, ParseError::DuplicateDefinition { .. }));
    }

    #[test]
    fn test_parse_rejects_unknown_element() {
        let xml = r#"<schema><namespace name="T"><interface name="I"/></namespace></schema>"#;
        let err = parse_schema(xml).unwrap_err();
        assert!(matches!(err, ParseError::UnknownElement { .. }));
    }

    #[test]
    fn test_parse_missing_type() {
        let xml = r#"<schema><namespace name="T"><model name="M"><property name="x"/></model></namespace></schema>"#;
        let err = parse_schema(xml).unwrap_err();
        assert!(matches!(err, ParseError::MissingAttribute { .. }));
    }

    #[test]
    fn test_parse_invalid_visibility() {
        let xml = r#"
            <schema><namespace name="T">
              <model name="M"><property name="x" type="string" visibility="read,sometimes"/></model>
            </namespace></schema>
        "#;
        let err = parse_schema(xml).unwrap_err();
        assert!(matches!(err, ParseError::InvalidAttribute { .. }));
    }

    #[test]
    fn test_parse_number_literals() {
        let literal = |value: &str| {
            parse_schema(&format!(
                r#"<schema><namespace name="T">
                  <model name="M"><property name="n"><number value="{value}"/></property></model>
                </namespace></schema>"#
            ))
        };
        for accepted in ["0", "-12", "3.25", "1e3", "-6.02E+23", " 7 "] {
            assert!(literal(accepted).is_ok(), "{accepted} should parse");
        }
        for rejected in ["inf", "-infinity", "NaN", "+5", "1.", ".5", "1e", "0x10", "1e999", ""] {
            let err = literal(rejected).unwrap_err();
            assert!(
                matches!(err, ParseError::InvalidAttribute { .. }),
                "{rejected} should be rejected"
            );
        }

        let member = parse_schema(
            r#"<schema><namespace name="T">
              <enum name="E"><member name="A" number="NaN"/></enum>
            </namespace></schema>"#,
        );
        assert!(matches!(member, Err(ParseError::InvalidAttribute { .. })));
    }

    #[test]
    fn test_parse_no_schema_element() {
        let err = parse_schema("").unwrap_err();
        assert!(matches!(err, ParseError::InvalidStructure { .. }));
    }

    #[test]
    fn test_parse_dotted_namespace_name() {
        let xml = r#"
            <schema rootNamespaces="A">
              <namespace name="A.B"><model name="M"/></namespace>
            </schema>
        "#;
        let schema = parse_schema(xml).expect("Failed to parse");
        let id = schema.get_declaration("A.B.M").expect("model");
        assert_eq!(
            schema.node(id).namespace(),
            &["A".to_string(), "B".to_string()]
        );
    }
}
