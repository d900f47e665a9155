use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::{Memento, TypePath};
use crate::source::MementoBackend;

/// On-disk document format for a file-backed source.
///
/// ```json
/// {
///   "plugin_type": "auth.CredentialStore",
///   "default_instance": "primary",
///   "instances": [
///     { "key": "primary", "kind": "concrete", "plugged_type": "auth.SqlCredentialStore" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileDocument {
    #[serde(default)]
    plugin_type: Option<TypePath>,
    /// Instance key the document nominates as the family default.
    #[serde(default)]
    default_instance: Option<String>,
    #[serde(default)]
    instances: Vec<Memento>,
}

/// Backend reading build-plans from a JSON document, loaded eagerly at open.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    document: FileDocument,
}

impl FileBackend {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let document: FileDocument = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            instances = document.instances.len(),
            "loaded memento file"
        );
        Ok(Self { path, document })
    }

    /// Capability type the document declares itself for, if any.
    pub fn plugin_type(&self) -> Option<&TypePath> {
        self.document.plugin_type.as_ref()
    }

    /// Instance key the document nominates as the default, if any.
    pub fn default_key(&self) -> Option<&str> {
        self.document.default_instance.as_deref()
    }

    fn find(&self, instance_key: &str) -> Option<&Memento> {
        self.document
            .instances
            .iter()
            .find(|memento| memento.instance_key() == Some(instance_key))
    }
}

impl MementoBackend for FileBackend {
    fn description(&self) -> String {
        format!("memento file {}", self.path.display())
    }

    fn contains_key(&self, instance_key: &str) -> bool {
        self.find(instance_key).is_some()
    }

    fn retrieve(&self, instance_key: &str) -> Result<Memento> {
        self.find(instance_key).cloned().ok_or_else(|| {
            anyhow::anyhow!(
                "no instance \"{instance_key}\" in {}",
                self.path.display()
            )
        })
    }

    fn fetch_internal(&self) -> Result<Vec<Memento>> {
        Ok(self.document.instances.clone())
    }
}
