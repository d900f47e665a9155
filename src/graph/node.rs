use serde_json::Value;

use crate::error::ResolutionError;
use crate::graph::{ChildProperty, ConfigurationVisitor, InstanceValidator};
use crate::models::{Memento, Plugin, PropertyKind, TypePath};
use crate::registry::PluginRegistry;

/// A scalar property carried over from the plan, for the instance builder.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarProperty {
    pub name: String,
    pub value: Value,
}

/// A fully resolved, classified instance description.
///
/// This is what the resolution pass hands to the external instance builder:
/// the capability type the instance satisfies, the concrete type to
/// construct, scalar values, and every object-typed slot classified into a
/// [`ChildProperty`]. The tree is exclusively owned top-down; nothing links
/// back to a parent.
#[derive(Debug)]
pub struct InstanceNode {
    plugin_type: TypePath,
    instance_key: Option<String>,
    plugged_type: Option<TypePath>,
    scalars: Vec<ScalarProperty>,
    children: Vec<ChildProperty>,
}

impl InstanceNode {
    /// Build the description of one concrete plan against its plugin's
    /// declared properties.
    ///
    /// Child bindings are produced in the plugin's property declaration
    /// order: a declared child slot the plan never mentions still yields a
    /// binding (classified `Default`), so the plan's own entries cannot be
    /// the ordering source. Scalars follow the plan's property-name order.
    pub(crate) fn build(
        plugin_type: &TypePath,
        plugin: &Plugin,
        memento: &Memento,
        registry: &PluginRegistry,
    ) -> Result<Self, ResolutionError> {
        let scalars = memento
            .properties()
            .map(|(name, value)| ScalarProperty {
                name: name.to_string(),
                value: value.clone(),
            })
            .collect();

        let mut children = Vec::new();
        for definition in &plugin.properties {
            match &definition.kind {
                PropertyKind::Scalar => {}
                PropertyKind::Child {
                    plugin_type: child_type,
                } => {
                    children.push(ChildProperty::build(
                        &definition.name,
                        child_type,
                        memento,
                        registry,
                    )?);
                }
                PropertyKind::ChildArray {
                    plugin_type: child_type,
                } => match memento.child_array(&definition.name) {
                    Some(items) => {
                        for (index, item) in items.iter().enumerate() {
                            children.push(ChildProperty::build_array_child(
                                &definition.name,
                                child_type,
                                index,
                                item,
                                registry,
                            )?);
                        }
                    }
                    None => children.push(ChildProperty::undefined(&definition.name, child_type)),
                },
            }
        }

        Ok(Self {
            plugin_type: plugin_type.clone(),
            instance_key: memento.instance_key().map(str::to_string),
            plugged_type: Some(plugin.plugged_type.clone()),
            scalars,
            children,
        })
    }

    pub fn plugin_type(&self) -> &TypePath {
        &self.plugin_type
    }

    pub fn instance_key(&self) -> Option<&str> {
        self.instance_key.as_deref()
    }

    /// The concrete type the instance builder should construct.
    pub fn plugged_type(&self) -> Option<&TypePath> {
        self.plugged_type.as_ref()
    }

    pub fn scalars(&self) -> &[ScalarProperty] {
        &self.scalars
    }

    /// Child bindings in declared order.
    pub fn children(&self) -> &[ChildProperty] {
        &self.children
    }

    /// Run the pluggability pass over every child binding, depth-first.
    pub fn validate(&self, validator: &mut dyn InstanceValidator) {
        for child in &self.children {
            child.validate(validator);
        }
    }

    /// Walk the tree pre-order: this instance, then each binding in order,
    /// recursing into inline subtrees only.
    pub fn accept(&self, visitor: &mut dyn ConfigurationVisitor) {
        visitor.visit_instance(self);
        for child in &self.children {
            child.accept(visitor);
        }
    }
}
