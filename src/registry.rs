//! Plugin families and the registry mediating plan lookups and builds.

use std::collections::{HashMap, HashSet};

use crate::error::ResolutionError;
use crate::graph::InstanceNode;
use crate::models::{Memento, Plugin, TypePath};
use crate::source::{MementoBackend, MementoSource};

/// One abstract capability type with its plans and pluggable implementations.
///
/// A family owns the [`MementoSource`] holding the capability's build-plans
/// and the [`Plugin`] metadata describing each concrete type that can
/// satisfy it. The family's type name is what error messages carry when a
/// default is missing or a reference fails to resolve.
#[derive(Debug)]
pub struct PluginFamily {
    plugin_type: TypePath,
    source: MementoSource,
    plugins: Vec<Plugin>,
}

impl PluginFamily {
    pub fn new(plugin_type: impl Into<TypePath>, backend: Box<dyn MementoBackend>) -> Self {
        let plugin_type = plugin_type.into();
        let mut source = MementoSource::new(backend);
        source.set_family_type(plugin_type.clone());
        Self {
            plugin_type,
            source,
            plugins: Vec::new(),
        }
    }

    /// Builder-style plugin registration.
    pub fn with_plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn add_plugin(&mut self, plugin: Plugin) {
        self.plugins.push(plugin);
    }

    pub fn plugin_type(&self) -> &TypePath {
        &self.plugin_type
    }

    pub fn source(&self) -> &MementoSource {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut MementoSource {
        &mut self.source
    }

    /// The plugin a concrete plan builds: the one the plan names, or the
    /// family's sole plugin when the plan names none.
    pub fn plugin_for(&self, memento: &Memento) -> Result<&Plugin, ResolutionError> {
        match memento.plugged_type() {
            Some(plugged) => self
                .plugins
                .iter()
                .find(|plugin| &plugin.plugged_type == plugged)
                .ok_or_else(|| ResolutionError::UnknownPlugin {
                    plugin_type: self.plugin_type.full_name().to_string(),
                    concrete: plugged.full_name().to_string(),
                }),
            None if self.plugins.len() == 1 => Ok(&self.plugins[0]),
            None => Err(ResolutionError::UnknownPlugin {
                plugin_type: self.plugin_type.full_name().to_string(),
                concrete: "(unspecified)".to_string(),
            }),
        }
    }
}

/// Registry of plugin families, keyed by capability type.
///
/// The registry mediates every lookup and resolution request to the owning
/// family's source, and drives the construction of resolved instance trees.
/// Re-registering a family for the same capability type replaces the
/// previous one.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    families: HashMap<String, PluginFamily>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, family: PluginFamily) {
        self.families
            .insert(family.plugin_type.full_name().to_string(), family);
    }

    pub fn family(&self, plugin_type: &TypePath) -> Option<&PluginFamily> {
        self.families.get(plugin_type.full_name())
    }

    pub fn family_mut(&mut self, plugin_type: &TypePath) -> Option<&mut PluginFamily> {
        self.families.get_mut(plugin_type.full_name())
    }

    fn family_required(&self, plugin_type: &TypePath) -> Result<&PluginFamily, ResolutionError> {
        self.family(plugin_type)
            .ok_or_else(|| ResolutionError::UnknownFamily {
                plugin_type: plugin_type.full_name().to_string(),
            })
    }

    // ============================================================
    // Source mediation
    // ============================================================

    /// Retrieve a plan by key from the family's source. `Ok(None)` means no
    /// plan is registered under this key.
    pub fn get_memento(
        &self,
        plugin_type: &TypePath,
        instance_key: &str,
    ) -> Result<Option<Memento>, ResolutionError> {
        self.family_required(plugin_type)?
            .source
            .get_memento(instance_key)
    }

    /// Resolve one level of indirection against the family's source.
    pub fn resolve_memento(
        &self,
        plugin_type: &TypePath,
        memento: &Memento,
    ) -> Result<Memento, ResolutionError> {
        self.family_required(plugin_type)?
            .source
            .resolve_memento(memento)
    }

    pub fn get_all_mementos(
        &self,
        plugin_type: &TypePath,
    ) -> Result<Vec<Memento>, ResolutionError> {
        self.family_required(plugin_type)?.source.get_all_mementos()
    }

    /// Register a plan at runtime with the family's source.
    pub fn add_external_memento(
        &mut self,
        plugin_type: &TypePath,
        memento: Memento,
    ) -> Result<(), ResolutionError> {
        let family = self
            .families
            .get_mut(plugin_type.full_name())
            .ok_or_else(|| ResolutionError::UnknownFamily {
                plugin_type: plugin_type.full_name().to_string(),
            })?;
        family.source.add_external_memento(memento);
        Ok(())
    }

    /// Nominate the family's default plan by key.
    pub fn set_default(
        &mut self,
        plugin_type: &TypePath,
        instance_key: &str,
    ) -> Result<(), ResolutionError> {
        let family = self
            .families
            .get_mut(plugin_type.full_name())
            .ok_or_else(|| ResolutionError::UnknownFamily {
                plugin_type: plugin_type.full_name().to_string(),
            })?;
        family.source.set_default(instance_key)
    }

    // ============================================================
    // Instance-tree construction
    // ============================================================

    /// Resolve the plan registered under `instance_key` into a validated,
    /// classified instance description. `Ok(None)` when no plan is
    /// registered under the key.
    pub fn build_instance(
        &self,
        plugin_type: &TypePath,
        instance_key: &str,
    ) -> Result<Option<InstanceNode>, ResolutionError> {
        let family = self.family_required(plugin_type)?;
        let Some(memento) = family.source.get_memento(instance_key)? else {
            return Ok(None);
        };

        tracing::debug!(plugin_type = %plugin_type, key = instance_key, "building instance");
        let resolved = self.resolve_fully(family, memento)?;
        self.build_node(family, &resolved).map(Some)
    }

    /// Resolve the family's default plan into an instance description.
    pub fn build_default(
        &self,
        plugin_type: &TypePath,
    ) -> Result<InstanceNode, ResolutionError> {
        self.build_from(plugin_type, &Memento::default_instance())
    }

    /// Resolve an explicit plan (possibly an indirection) into an instance
    /// description.
    pub fn build_from(
        &self,
        plugin_type: &TypePath,
        memento: &Memento,
    ) -> Result<InstanceNode, ResolutionError> {
        let family = self.family_required(plugin_type)?;
        let resolved = self.resolve_fully(family, memento.clone())?;
        self.build_node(family, &resolved)
    }

    /// Build the node for an inline child slot. The plan is concrete by
    /// classification; its family must be registered.
    pub(crate) fn build_inline(
        &self,
        plugin_type: &TypePath,
        memento: &Memento,
    ) -> Result<InstanceNode, ResolutionError> {
        let family = self.family_required(plugin_type)?;
        self.build_node(family, memento)
    }

    /// Chase indirections until a concrete plan emerges. The source resolves
    /// one level at a time; plans stored under keys may themselves be
    /// references, so a key cycle must be detected rather than followed.
    fn resolve_fully(
        &self,
        family: &PluginFamily,
        memento: Memento,
    ) -> Result<Memento, ResolutionError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut current = memento;
        loop {
            if current.is_default() {
                current = family.source.resolve_memento(&current)?;
                if current.is_default() {
                    // The stored default is itself flagged as a default;
                    // there is nothing further to chase.
                    return Ok(current);
                }
                continue;
            }
            if let Some(reference_key) = current.reference_key() {
                if !seen.insert(reference_key.to_string()) {
                    return Err(ResolutionError::MissingReference {
                        key: reference_key.to_string(),
                        plugin_type: family.plugin_type.full_name().to_string(),
                    });
                }
                current = family.source.resolve_memento(&current)?;
                continue;
            }
            return Ok(current);
        }
    }

    fn build_node(
        &self,
        family: &PluginFamily,
        memento: &Memento,
    ) -> Result<InstanceNode, ResolutionError> {
        let plugin = family.plugin_for(memento)?;
        InstanceNode::build(&family.plugin_type, plugin, memento, self)
    }
}
