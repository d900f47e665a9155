use crate::error::ResolutionError;
use crate::graph::{ConfigurationVisitor, InstanceNode, InstanceValidator};
use crate::models::{Memento, TypePath};
use crate::registry::PluginRegistry;

/// One object-typed property slot of a resolved instance.
///
/// The binding's [`ChildKind`] is decided once, at construction time, from
/// the nested plan the owning memento supplies for the slot. It is never
/// recomputed afterwards.
#[derive(Debug)]
pub struct ChildProperty {
    name: String,
    plugin_type: TypePath,
    plugin_type_name: String,
    array_index: Option<usize>,
    kind: ChildKind,
}

/// How a child slot gets its value.
///
/// Exactly one classification results from any nested-plan input:
///
/// | nested plan                  | kind               |
/// |------------------------------|--------------------|
/// | absent                       | `Default`          |
/// | present, default indirection | `Default`          |
/// | present, reference           | `Reference`        |
/// | present, concrete            | `InlineDefinition` |
///
/// `NotDefined` is the pre-classification placeholder; it also classifies a
/// collection slot with no plans supplied, since a whole collection has no
/// per-type default to fall back to.
#[derive(Debug)]
pub enum ChildKind {
    NotDefined,
    Default,
    Reference {
        reference_key: String,
    },
    InlineDefinition {
        /// Exclusively owned nested instance; its subtree has no links back
        /// into the enclosing graph.
        instance: Box<InstanceNode>,
    },
}

impl ChildProperty {
    /// Classify a singular child slot from its owner's plan.
    pub(crate) fn build(
        name: &str,
        plugin_type: &TypePath,
        owner: &Memento,
        registry: &PluginRegistry,
    ) -> Result<Self, ResolutionError> {
        Self::classify(name, plugin_type, None, owner.child_memento(name), registry)
    }

    /// Classify one element of an ordered collection slot.
    pub(crate) fn build_array_child(
        name: &str,
        plugin_type: &TypePath,
        array_index: usize,
        memento: &Memento,
        registry: &PluginRegistry,
    ) -> Result<Self, ResolutionError> {
        Self::classify(name, plugin_type, Some(array_index), Some(memento), registry)
    }

    /// A collection slot with no plans supplied.
    pub(crate) fn undefined(name: &str, plugin_type: &TypePath) -> Self {
        Self {
            name: name.to_string(),
            plugin_type: plugin_type.clone(),
            plugin_type_name: plugin_type.full_name().to_string(),
            array_index: None,
            kind: ChildKind::NotDefined,
        }
    }

    fn classify(
        name: &str,
        plugin_type: &TypePath,
        array_index: Option<usize>,
        memento: Option<&Memento>,
        registry: &PluginRegistry,
    ) -> Result<Self, ResolutionError> {
        let kind = match memento {
            // No plan supplied: the slot falls back to the declared type's default.
            None => ChildKind::Default,
            Some(memento) if memento.is_default() => ChildKind::Default,
            Some(memento) => match memento.reference_key() {
                Some(reference_key) => ChildKind::Reference {
                    reference_key: reference_key.to_string(),
                },
                None => ChildKind::InlineDefinition {
                    instance: Box::new(registry.build_inline(plugin_type, memento)?),
                },
            },
        };

        Ok(Self {
            name: name.to_string(),
            plugin_type: plugin_type.clone(),
            plugin_type_name: plugin_type.full_name().to_string(),
            array_index,
            kind,
        })
    }

    /// Display name of the slot: the base property name, suffixed with
    /// `" #<index>"` when the binding is one element of a collection.
    pub fn property_name(&self) -> String {
        match self.array_index {
            Some(index) => format!("{} #{}", self.name, index),
            None => self.name.clone(),
        }
    }

    pub fn plugin_type(&self) -> &TypePath {
        &self.plugin_type
    }

    /// Type identity captured at construction time, so validation needs no
    /// live type handle.
    pub fn plugin_type_name(&self) -> &str {
        &self.plugin_type_name
    }

    pub fn array_index(&self) -> Option<usize> {
        self.array_index
    }

    pub fn kind(&self) -> &ChildKind {
        &self.kind
    }

    /// The referenced instance key. `None` unless the binding is a reference.
    pub fn reference_key(&self) -> Option<&str> {
        match &self.kind {
            ChildKind::Reference { reference_key } => Some(reference_key),
            _ => None,
        }
    }

    /// The owned nested instance. `None` unless the binding is inline.
    pub fn inner_instance(&self) -> Option<&InstanceNode> {
        match &self.kind {
            ChildKind::InlineDefinition { instance } => Some(instance),
            _ => None,
        }
    }

    /// Dispatch validation for this binding's kind.
    ///
    /// Default and undefined bindings validate nothing; references ask the
    /// validator to confirm the key exists and is compatible; inline
    /// definitions check their own pluggability and then recurse.
    pub fn validate(&self, validator: &mut dyn InstanceValidator) {
        match &self.kind {
            ChildKind::NotDefined | ChildKind::Default => {}
            ChildKind::Reference { reference_key } => {
                validator.validate_instance(&self.plugin_type, reference_key);
            }
            ChildKind::InlineDefinition { instance } => {
                if let Some(plugged) = instance.plugged_type() {
                    validator.validate_pluggability(&self.plugin_type, plugged);
                }
                instance.validate(validator);
            }
        }
    }

    /// Visit this binding; inline definitions recurse into the owned
    /// instance, references do not expand.
    pub fn accept(&self, visitor: &mut dyn ConfigurationVisitor) {
        visitor.visit_child_property(self);
        if let ChildKind::InlineDefinition { instance } = &self.kind {
            instance.accept(visitor);
        }
    }
}
