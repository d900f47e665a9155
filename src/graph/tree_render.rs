//! ASCII tree rendering for resolved instance graphs.

use std::fmt::Write as _;

use crate::graph::{ChildKind, ChildProperty, InstanceNode};

const INLINE: char = '●';
const REFERENCE: char = '→';
const DEFAULT: char = '◇';
const NOT_DEFINED: char = '?';

/// Get the symbol for a binding's kind.
fn kind_symbol(kind: &ChildKind) -> char {
    match kind {
        ChildKind::InlineDefinition { .. } => INLINE,
        ChildKind::Reference { .. } => REFERENCE,
        ChildKind::Default => DEFAULT,
        ChildKind::NotDefined => NOT_DEFINED,
    }
}

/// Render a resolved instance tree as ASCII art with per-kind symbols.
///
/// Example output:
/// ```text
/// auth.SqlCredentialStore ("primary")
/// ├── ● cache: cache.MemoryCache
/// │   └── → backing: ref "shared"
/// ├── → audit #0: ref "file-log"
/// └── ◇ clock
/// ```
pub fn render_tree(node: &InstanceNode) -> String {
    let mut output = String::new();
    output.push_str(&describe_instance(node));
    output.push('\n');
    render_children(&mut output, node, "");
    output
}

fn describe_instance(node: &InstanceNode) -> String {
    let type_name = node
        .plugged_type()
        .unwrap_or(node.plugin_type())
        .full_name()
        .to_string();
    match node.instance_key() {
        Some(key) => format!("{} (\"{}\")", type_name, key),
        None => type_name,
    }
}

fn render_children(output: &mut String, node: &InstanceNode, prefix: &str) {
    let children = node.children();
    for (i, child) in children.iter().enumerate() {
        let is_last = i == children.len() - 1;
        render_binding(output, child, prefix, is_last);
    }
}

/// Recursively render a binding; inline bindings continue into their
/// owned instance's children.
fn render_binding(output: &mut String, property: &ChildProperty, prefix: &str, is_last: bool) {
    let branch = if is_last { "└── " } else { "├── " };
    let symbol = kind_symbol(property.kind());

    output.push_str(prefix);
    output.push_str(branch);
    output.push(symbol);
    output.push(' ');
    output.push_str(&property.property_name());

    match property.kind() {
        ChildKind::Reference { reference_key } => {
            let _ = write!(output, ": ref \"{}\"", reference_key);
        }
        ChildKind::InlineDefinition { instance } => {
            if let Some(plugged) = instance.plugged_type() {
                let _ = write!(output, ": {}", plugged);
            }
        }
        ChildKind::Default | ChildKind::NotDefined => {}
    }
    output.push('\n');

    if let ChildKind::InlineDefinition { instance } = property.kind() {
        let continuation = if is_last { "    " } else { "│   " };
        let child_prefix = format!("{}{}", prefix, continuation);
        render_children(output, instance, &child_prefix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Memento, Plugin};
    use crate::registry::{PluginFamily, PluginRegistry};
    use crate::source::MemoryBackend;

    fn registry() -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.register(
            PluginFamily::new("auth.CredentialStore", Box::new(MemoryBackend::new())).with_plugin(
                Plugin::new("auth.SqlCredentialStore")
                    .scalar("connection")
                    .child("cache", "cache.Cache")
                    .child("clock", "time.Clock"),
            ),
        );
        registry.register(
            PluginFamily::new("cache.Cache", Box::new(MemoryBackend::new()))
                .with_plugin(Plugin::new("cache.MemoryCache").scalar("capacity")),
        );
        registry.register(
            PluginFamily::new("time.Clock", Box::new(MemoryBackend::new()))
                .with_plugin(Plugin::new("time.SystemClock")),
        );
        registry
    }

    #[test]
    fn renders_each_binding_kind() {
        let registry = registry();
        let memento = Memento::concrete("primary")
            .with_property("connection", "server=.;db=auth")
            .with_child("cache", Memento::anonymous().plugged("cache.MemoryCache"));
        let node = registry
            .build_from(&"auth.CredentialStore".into(), &memento)
            .expect("build failed");

        let output = render_tree(&node);
        assert_eq!(
            output,
            "auth.SqlCredentialStore (\"primary\")\n\
             ├── ● cache: cache.MemoryCache\n\
             └── ◇ clock\n"
        );
    }

    #[test]
    fn reference_bindings_render_key_without_expanding() {
        let registry = registry();
        let memento = Memento::concrete("primary")
            .with_child("cache", Memento::reference("shared-cache"));
        let node = registry
            .build_from(&"auth.CredentialStore".into(), &memento)
            .expect("build failed");

        let output = render_tree(&node);
        assert!(output.contains("→ cache: ref \"shared-cache\""));
        assert!(!output.contains("MemoryCache"));
    }
}
