use serde::{Deserialize, Serialize};

use crate::models::TypePath;

/// A concrete type pluggable into a family, with its declared properties.
///
/// The property list is the metadata the resolution pass consults when
/// classifying a plan's slots: it says which properties are scalar, which
/// hold a single nested instance, and which hold an ordered collection,
/// along with the capability type each object slot declares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    pub plugged_type: TypePath,
    /// Declared properties in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyDefinition>,
}

/// One declared property slot on a plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(flatten)]
    pub kind: PropertyKind,
}

/// What a declared property slot holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "property", rename_all = "snake_case")]
pub enum PropertyKind {
    /// A plain value (string, number, bool, ...).
    Scalar,
    /// A single nested instance of the given capability type.
    Child { plugin_type: TypePath },
    /// An ordered collection of nested instances of the given capability type.
    ChildArray { plugin_type: TypePath },
}

impl Plugin {
    pub fn new(plugged_type: impl Into<TypePath>) -> Self {
        Self {
            plugged_type: plugged_type.into(),
            properties: Vec::new(),
        }
    }

    /// Declare a scalar property.
    pub fn scalar(mut self, name: impl Into<String>) -> Self {
        self.properties.push(PropertyDefinition {
            name: name.into(),
            kind: PropertyKind::Scalar,
        });
        self
    }

    /// Declare a single-instance child property.
    pub fn child(mut self, name: impl Into<String>, plugin_type: impl Into<TypePath>) -> Self {
        self.properties.push(PropertyDefinition {
            name: name.into(),
            kind: PropertyKind::Child {
                plugin_type: plugin_type.into(),
            },
        });
        self
    }

    /// Declare an ordered-collection child property.
    pub fn child_array(mut self, name: impl Into<String>, plugin_type: impl Into<TypePath>) -> Self {
        self.properties.push(PropertyDefinition {
            name: name.into(),
            kind: PropertyKind::ChildArray {
                plugin_type: plugin_type.into(),
            },
        });
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|def| def.name == name)
    }
}
