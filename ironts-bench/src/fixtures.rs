//! Generated schema documents of configurable size.

use std::fmt::Write;

/// A schema with `namespaces` namespaces of `models` models each.
///
/// Every model has a restricted id, an optional reference to the next model
/// of its namespace, an array of the first model of the previous namespace
/// and a small enum, so the generator exercises references, cross-file
/// imports and lifecycle filtering.
#[must_use]
pub fn wide_schema(namespaces: usize, models: usize) -> String {
    let mut xml = String::from("<schema rootNamespaces=\"Bench\">\n<namespace name=\"Bench\">\n");
    for n in 0..namespaces {
        let _ = writeln!(xml, "<namespace name=\"N{n}\">");
        let _ = writeln!(
            xml,
            "<enum name=\"State\"><member name=\"On\"/><member name=\"Off\" value=\"off\"/></enum>"
        );
        for m in 0..models {
            let _ = writeln!(xml, "<model name=\"M{m}\" doc=\"Model {m} of namespace {n}\">");
            let _ = writeln!(
                xml,
                "<property name=\"id\" type=\"string\" visibility=\"read\"/>"
            );
            let _ = writeln!(xml, "<property name=\"state\" type=\"State\"/>");
            let _ = writeln!(
                xml,
                "<property name=\"next\" type=\"M{}\" optional=\"true\"/>",
                (m + 1) % models
            );
            if n > 0 {
                let _ = writeln!(
                    xml,
                    "<property name=\"prev\"><array type=\"Bench.N{}.M0\"/></property>",
                    n - 1
                );
            }
            xml.push_str("</model>\n");
        }
        let _ = writeln!(
            xml,
            "<operation name=\"get{n}\" verb=\"get\" path=\"/n{n}\"><response status=\"200\" type=\"M0\"/></operation>"
        );
        xml.push_str("</namespace>\n");
    }
    xml.push_str("</namespace>\n</schema>\n");
    xml
}

/// A schema with one chain of `depth` nested anonymous models ending in a
/// reference back to the root declaration.
#[must_use]
pub fn deep_schema(depth: usize) -> String {
    let mut xml = String::from(
        "<schema rootNamespaces=\"Deep\">\n<namespace name=\"Deep\">\n<model name=\"Root\">\n",
    );
    for level in 0..depth {
        let _ = writeln!(xml, "<property name=\"l{level}\" optional=\"true\"><model>");
    }
    xml.push_str("<property name=\"back\" type=\"Root\"/>\n");
    for _ in 0..depth {
        xml.push_str("</model></property>\n");
    }
    xml.push_str("</model>\n</namespace>\n</schema>\n");
    xml
}
