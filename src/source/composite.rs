use std::collections::BTreeSet;

use crate::models::Memento;
use crate::source::MementoBackend;

/// Ordered chain of backends; the first backend containing a key wins.
///
/// Enumeration is the first-wins union: a plan from a later backend is
/// dropped when an earlier backend already supplied its key.
pub struct CompositeBackend {
    backends: Vec<Box<dyn MementoBackend>>,
}

impl CompositeBackend {
    pub fn new(backends: Vec<Box<dyn MementoBackend>>) -> Self {
        Self { backends }
    }
}

impl MementoBackend for CompositeBackend {
    fn description(&self) -> String {
        let parts: Vec<String> = self.backends.iter().map(|b| b.description()).collect();
        format!("composite of [{}]", parts.join(", "))
    }

    fn contains_key(&self, instance_key: &str) -> bool {
        self.backends.iter().any(|b| b.contains_key(instance_key))
    }

    fn retrieve(&self, instance_key: &str) -> anyhow::Result<Memento> {
        for backend in &self.backends {
            if backend.contains_key(instance_key) {
                return backend.retrieve(instance_key);
            }
        }
        anyhow::bail!("no chained backend holds \"{instance_key}\"")
    }

    fn fetch_internal(&self) -> anyhow::Result<Vec<Memento>> {
        let mut seen = BTreeSet::new();
        let mut mementos = Vec::new();
        for backend in &self.backends {
            for memento in backend.fetch_internal()? {
                match memento.instance_key() {
                    Some(key) if !seen.insert(key.to_string()) => continue,
                    _ => mementos.push(memento),
                }
            }
        }
        Ok(mementos)
    }
}
