use crate::graph::{ChildProperty, InstanceNode};
use crate::models::TypePath;

/// A sink receiving each node of a resolved instance tree.
///
/// Traversal is pre-order: an instance is visited before its child bindings,
/// and sibling bindings arrive in declaration order. Reference bindings are
/// reported as references; the referenced subtree is never expanded.
pub trait ConfigurationVisitor {
    fn visit_instance(&mut self, _node: &InstanceNode) {}
    fn visit_child_property(&mut self, _property: &ChildProperty) {}
}

/// Pluggability checks performed during the validation pass.
///
/// Implemented by the consumer; the resolution core only dispatches and
/// records nothing itself.
pub trait InstanceValidator {
    /// Confirm an instance named `instance_key` is registered for
    /// `plugin_type` and is type-compatible with it.
    fn validate_instance(&mut self, plugin_type: &TypePath, instance_key: &str);

    /// Confirm `plugged_type` is assignable to a slot declared as
    /// `plugin_type`, either an exact match or an acceptable subtype.
    fn validate_pluggability(&mut self, plugin_type: &TypePath, plugged_type: &TypePath);
}
