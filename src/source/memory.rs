use std::collections::BTreeMap;

use crate::models::Memento;
use crate::source::MementoBackend;

/// In-memory backend, used for programmatic registration and tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    mementos: BTreeMap<String, Memento>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a plan under its instance key. Anonymous plans are ignored.
    pub fn add(&mut self, memento: Memento) {
        if let Some(key) = memento.instance_key() {
            self.mementos.insert(key.to_string(), memento);
        }
    }

    /// Builder-style [`add`](Self::add).
    pub fn with(mut self, memento: Memento) -> Self {
        self.add(memento);
        self
    }
}

impl MementoBackend for MemoryBackend {
    fn description(&self) -> String {
        format!("in-memory source with {} mementos", self.mementos.len())
    }

    fn contains_key(&self, instance_key: &str) -> bool {
        self.mementos.contains_key(instance_key)
    }

    fn retrieve(&self, instance_key: &str) -> anyhow::Result<Memento> {
        self.mementos
            .get(instance_key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no memento stored under \"{instance_key}\""))
    }

    fn fetch_internal(&self) -> anyhow::Result<Vec<Memento>> {
        Ok(self.mementos.values().cloned().collect())
    }
}
