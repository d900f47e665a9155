//! Memento sources: keyed storage of build-plans plus indirection resolution.
//!
//! A [`MementoSource`] layers two stores: a pluggable [`MementoBackend`]
//! holding internally-fetched plans, and a runtime-registered external map
//! that always shadows the backend for the same key. On top of the layered
//! lookup it owns the source's single optional default plan and implements
//! [`MementoSource::resolve_memento`], the entry point that turns default and
//! reference indirections into concrete plans.

mod composite;
mod file;
mod memory;
mod schema;
mod store;

pub use composite::CompositeBackend;
pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use store::{SqliteBackend, SqliteStore};

use std::collections::BTreeMap;
use std::fmt;

use crate::error::ResolutionError;
use crate::models::{Memento, TypePath};

/// Pluggable backend storage for build-plans.
///
/// Implementations may load lazily or eagerly and may fail for any reason;
/// a generic failure from [`retrieve`](Self::retrieve) is wrapped by the
/// owning source into [`ResolutionError::Retrieval`], while a
/// `ResolutionError` returned directly passes through unchanged.
pub trait MementoBackend {
    /// Human-readable description of the backing store, for error context.
    fn description(&self) -> String;

    /// Whether the backend holds a plan under `instance_key`.
    fn contains_key(&self, instance_key: &str) -> bool;

    /// Retrieve the plan stored under `instance_key`.
    ///
    /// Only called after [`contains_key`](Self::contains_key) returned true.
    fn retrieve(&self, instance_key: &str) -> anyhow::Result<Memento>;

    /// All internally stored plans, for enumeration.
    fn fetch_internal(&self) -> anyhow::Result<Vec<Memento>>;
}

/// A keyed collection of build-plans with one optional default.
///
/// Lookup order is external map first, then backend. External registration
/// takes effect immediately, including for resolutions already in progress
/// elsewhere in the same graph.
pub struct MementoSource {
    backend: Box<dyn MementoBackend>,
    external: BTreeMap<String, Memento>,
    default_memento: Option<Memento>,
    family_type: Option<TypePath>,
}

impl MementoSource {
    pub fn new(backend: Box<dyn MementoBackend>) -> Self {
        Self {
            backend,
            external: BTreeMap::new(),
            default_memento: None,
            family_type: None,
        }
    }

    pub fn description(&self) -> String {
        self.backend.description()
    }

    /// Record the owning family's capability type, for error messages.
    pub(crate) fn set_family_type(&mut self, plugin_type: TypePath) {
        self.family_type = Some(plugin_type);
    }

    fn family_type_name(&self) -> String {
        match &self.family_type {
            Some(plugin_type) => plugin_type.full_name().to_string(),
            None => "UNKNOWN".to_string(),
        }
    }

    /// Retrieve the plan registered under `instance_key`, external map first.
    ///
    /// `Ok(None)` is a valid, non-error outcome meaning no plan is registered
    /// under this key. Backend failures are wrapped with the offending key;
    /// a [`ResolutionError`] raised by the backend passes through as-is.
    pub fn get_memento(&self, instance_key: &str) -> Result<Option<Memento>, ResolutionError> {
        if let Some(memento) = self.external.get(instance_key) {
            return Ok(Some(memento.clone()));
        }

        if !self.backend.contains_key(instance_key) {
            return Ok(None);
        }

        match self.backend.retrieve(instance_key) {
            Ok(memento) => Ok(Some(memento)),
            Err(err) => match err.downcast::<ResolutionError>() {
                Ok(domain) => Err(domain),
                Err(other) => Err(ResolutionError::Retrieval {
                    key: instance_key.to_string(),
                    source: other,
                }),
            },
        }
    }

    /// Register a plan at runtime, shadowing any backend plan with the same
    /// key. Anonymous plans cannot be registered and are ignored.
    pub fn add_external_memento(&mut self, memento: Memento) {
        let Some(key) = memento.instance_key() else {
            tracing::warn!("ignoring external memento with no instance key");
            return;
        };
        tracing::debug!(key, "registered external memento");
        self.external.insert(key.to_string(), memento);
    }

    /// Resolve `instance_key` and store the result as this source's default.
    ///
    /// A key that resolves to nothing stores no default; the failure surfaces
    /// only if a caller later asks for the default.
    pub fn set_default(&mut self, instance_key: &str) -> Result<(), ResolutionError> {
        self.default_memento = self.get_memento(instance_key)?;
        if self.default_memento.is_none() {
            tracing::debug!(key = instance_key, "default key resolved to nothing");
        }
        Ok(())
    }

    pub fn default_memento(&self) -> Option<&Memento> {
        self.default_memento.as_ref()
    }

    /// Resolve one level of indirection.
    ///
    /// Default plans become the stored default, reference plans become the
    /// plan under their key, and concrete plans come back unchanged. Callers
    /// resolve again at each nesting level as they recurse; this method never
    /// chases an indirection more than one step.
    pub fn resolve_memento(&self, memento: &Memento) -> Result<Memento, ResolutionError> {
        if memento.is_default() {
            return match &self.default_memento {
                Some(default) => Ok(default.clone()),
                None => Err(ResolutionError::MissingDefault {
                    plugin_type: self.family_type_name(),
                }),
            };
        }

        if let Some(reference_key) = memento.reference_key() {
            return match self.get_memento(reference_key)? {
                Some(resolved) => Ok(resolved),
                None => Err(ResolutionError::MissingReference {
                    key: reference_key.to_string(),
                    plugin_type: self.family_type_name(),
                }),
            };
        }

        Ok(memento.clone())
    }

    /// Union of backend plans and external plans. An external plan sharing a
    /// key with a backend plan appears once, and the external one wins.
    pub fn get_all_mementos(&self) -> Result<Vec<Memento>, ResolutionError> {
        let internal = self
            .backend
            .fetch_internal()
            .map_err(|err| ResolutionError::Enumeration {
                description: self.backend.description(),
                source: err,
            })?;

        let mut mementos: Vec<Memento> = internal
            .into_iter()
            .filter(|memento| {
                memento
                    .instance_key()
                    .is_none_or(|key| !self.external.contains_key(key))
            })
            .collect();
        mementos.extend(self.external.values().cloned());

        Ok(mementos)
    }
}

impl fmt::Debug for MementoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MementoSource")
            .field("backend", &self.backend.description())
            .field("external", &self.external.len())
            .field("has_default", &self.default_memento.is_some())
            .field("family_type", &self.family_type)
            .finish()
    }
}
