use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::TypePath;

/// An immutable description of how to build one instance.
///
/// A memento is one of three things:
///
/// - **Default**: "use whatever the owning source's configured default is".
/// - **Reference**: an indirection naming another memento by instance key.
/// - **Concrete**: an inline definition carrying scalar properties and
///   nested child mementos.
///
/// Mementos are created by a memento source when its backing data is loaded
/// or registered, and are only ever read after that. Resolution never mutates
/// a memento; indirections are resolved by returning a different memento.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memento {
    /// Unique within the owning source. Absent for anonymous inline plans.
    #[serde(rename = "key", default, skip_serializing_if = "Option::is_none")]
    instance_key: Option<String>,
    #[serde(flatten)]
    kind: MementoKind,
}

/// The three shapes a memento can take. Exactly one holds at a time; a plan
/// is never simultaneously a reference and a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MementoKind {
    Default,
    Reference {
        reference_key: String,
    },
    Concrete {
        /// Declared concrete type, used for pluggability validation.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        plugged_type: Option<TypePath>,
        /// Scalar property values by name.
        #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
        properties: serde_json::Map<String, Value>,
        /// Nested child plans in declaration order.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<ChildEntry>,
    },
}

/// One named child slot of a concrete memento.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildEntry {
    pub name: String,
    #[serde(flatten)]
    pub slot: ChildSlot,
}

/// A child slot holds either a single nested plan or an ordered collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChildSlot {
    #[serde(rename = "instance")]
    One(Memento),
    #[serde(rename = "instances")]
    Many(Vec<Memento>),
}

impl Memento {
    /// A plan meaning "use the owning source's default".
    pub fn default_instance() -> Self {
        Self {
            instance_key: None,
            kind: MementoKind::Default,
        }
    }

    /// A plan referring to another plan by instance key.
    pub fn reference(reference_key: impl Into<String>) -> Self {
        Self {
            instance_key: None,
            kind: MementoKind::Reference {
                reference_key: reference_key.into(),
            },
        }
    }

    /// A named concrete plan with no properties yet.
    pub fn concrete(instance_key: impl Into<String>) -> Self {
        Self {
            instance_key: Some(instance_key.into()),
            kind: MementoKind::empty_concrete(),
        }
    }

    /// An anonymous concrete plan, as used for inline definitions.
    pub fn anonymous() -> Self {
        Self {
            instance_key: None,
            kind: MementoKind::empty_concrete(),
        }
    }

    /// Name this plan so it can be registered under a key. Any shape of
    /// plan may carry a key: sources can hold named defaults and named
    /// references alongside concrete plans.
    pub fn named(mut self, instance_key: impl Into<String>) -> Self {
        self.instance_key = Some(instance_key.into());
        self
    }

    /// Declare the concrete type this plan builds. No-op on indirections.
    pub fn plugged(mut self, plugged: impl Into<TypePath>) -> Self {
        if let MementoKind::Concrete { plugged_type, .. } = &mut self.kind {
            *plugged_type = Some(plugged.into());
        }
        self
    }

    /// Set a scalar property. No-op on indirections.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        if let MementoKind::Concrete { properties, .. } = &mut self.kind {
            properties.insert(name.into(), value.into());
        }
        self
    }

    /// Set a single nested child plan. No-op on indirections.
    pub fn with_child(mut self, name: impl Into<String>, child: Memento) -> Self {
        if let MementoKind::Concrete { children, .. } = &mut self.kind {
            children.push(ChildEntry {
                name: name.into(),
                slot: ChildSlot::One(child),
            });
        }
        self
    }

    /// Set an ordered collection of nested child plans. No-op on indirections.
    pub fn with_children(mut self, name: impl Into<String>, items: Vec<Memento>) -> Self {
        if let MementoKind::Concrete { children, .. } = &mut self.kind {
            children.push(ChildEntry {
                name: name.into(),
                slot: ChildSlot::Many(items),
            });
        }
        self
    }

    pub fn instance_key(&self) -> Option<&str> {
        self.instance_key.as_deref()
    }

    pub fn is_default(&self) -> bool {
        matches!(self.kind, MementoKind::Default)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, MementoKind::Reference { .. })
    }

    /// The referenced instance key. `None` unless this is a reference.
    pub fn reference_key(&self) -> Option<&str> {
        match &self.kind {
            MementoKind::Reference { reference_key } => Some(reference_key),
            _ => None,
        }
    }

    /// Declared concrete type, if this is a concrete plan that names one.
    pub fn plugged_type(&self) -> Option<&TypePath> {
        match &self.kind {
            MementoKind::Concrete { plugged_type, .. } => plugged_type.as_ref(),
            _ => None,
        }
    }

    /// Scalar property value by name.
    pub fn property(&self, name: &str) -> Option<&Value> {
        match &self.kind {
            MementoKind::Concrete { properties, .. } => properties.get(name),
            _ => None,
        }
    }

    /// Scalar properties in name order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Value)> {
        let map = match &self.kind {
            MementoKind::Concrete { properties, .. } => Some(properties),
            _ => None,
        };
        map.into_iter().flatten().map(|(k, v)| (k.as_str(), v))
    }

    /// The nested plan for a singular child property.
    ///
    /// Returns `None` when the named slot has no plan supplied, which callers
    /// must treat as "no plan" rather than an explicit default.
    pub fn child_memento(&self, name: &str) -> Option<&Memento> {
        match self.child_slot(name)? {
            ChildSlot::One(memento) => Some(memento),
            ChildSlot::Many(_) => None,
        }
    }

    /// The nested plans for an ordered collection property.
    pub fn child_array(&self, name: &str) -> Option<&[Memento]> {
        match self.child_slot(name)? {
            ChildSlot::One(_) => None,
            ChildSlot::Many(items) => Some(items),
        }
    }

    /// Child entries in declaration order.
    pub fn children(&self) -> &[ChildEntry] {
        match &self.kind {
            MementoKind::Concrete { children, .. } => children,
            _ => &[],
        }
    }

    fn child_slot(&self, name: &str) -> Option<&ChildSlot> {
        self.children()
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.slot)
    }
}

impl MementoKind {
    fn empty_concrete() -> Self {
        MementoKind::Concrete {
            plugged_type: None,
            properties: serde_json::Map::new(),
            children: Vec::new(),
        }
    }
}
