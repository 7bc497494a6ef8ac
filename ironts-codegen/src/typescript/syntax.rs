//! TypeScript lexical helpers.

/// Single-quoted string literal with `\` and `'` escaped.
#[must_use]
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Returns true if `s` can be written as a bare identifier.
#[must_use]
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Object key: bare when it is an identifier, quoted otherwise.
#[must_use]
pub fn property_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        quote(name)
    }
}

/// Element access on an accessor expression: `acc['name']`.
#[must_use]
pub fn index_access(accessor: &str, name: &str) -> String {
    format!("{accessor}[{}]", quote(name))
}

/// Local alias under which a namespace file is imported.
#[must_use]
pub fn namespace_alias(namespace: &[String]) -> String {
    namespace.join("_")
}

/// Output file name of a namespace, e.g. `Store.Pets.ts`.
#[must_use]
pub fn file_name(namespace: &[String]) -> String {
    format!("{}.ts", namespace.join("."))
}

/// Module specifier used to import a namespace file.
#[must_use]
pub fn module_specifier(namespace: &[String], with_extension: bool) -> String {
    let ext = if with_extension { ".js" } else { "" };
    format!("./{}{ext}", namespace.join("."))
}

/// Block comment holding documentation text.
#[must_use]
pub fn doc_comment(doc: &str) -> String {
    let doc = doc.replace("*/", "*\\/");
    let lines: Vec<&str> = doc.lines().collect();
    if lines.len() <= 1 {
        return format!("/** {} */", doc.trim());
    }
    let mut out = String::from("/**\n");
    for line in lines {
        out.push_str(" * ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.push_str(" */");
    out
}
