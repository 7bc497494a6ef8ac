//! TypeScript file assembly.

pub mod declarations;
pub mod lifecycle;
pub mod routed;
pub mod syntax;

pub use declarations::{NamespaceFile, NamespaceGenerator};
pub use lifecycle::{LIFECYCLE_FILE, lifecycle_module};
pub use routed::{RoutedTypemapFile, RoutedTypemapGenerator};

/// First lines of every generated file.
pub const GENERATED_HEADER: &str = "/* eslint-disable */\n\
// This file was generated by ironts. Do not edit it by hand.\n";

/// Renders `import * as Alias from './A.B';` lines.
pub(crate) fn namespace_imports(imports: &[Vec<String>], with_extension: bool) -> String {
    let mut output = String::new();
    for ns in imports {
        output.push_str(&format!(
            "import * as {} from '{}';\n",
            syntax::namespace_alias(ns),
            syntax::module_specifier(ns, with_extension)
        ));
    }
    output
}

/// Renders the import of the lifecycle helpers.
pub(crate) fn lifecycle_import(with_extension: bool) -> String {
    let ext = if with_extension { ".js" } else { "" };
    format!(
        "import {{Lifecycle, FilterLifecycle}} from '{}{ext}';\n",
        lifecycle::LIFECYCLE_MODULE
    )
}
