use std::fmt;

use serde::{Deserialize, Serialize};

/// Serialized identity of a capability type.
///
/// Plugboard never holds live type handles; capability types and concrete
/// plugged types are identified by a path string (e.g. `"auth.CredentialStore"`).
/// Two paths are the same type exactly when the strings are equal, which keeps
/// identity comparison valid across processes and configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypePath(String);

impl TypePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The full path string, used in error messages and lookups.
    pub fn full_name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypePath {
    fn from(path: &str) -> Self {
        Self(path.to_string())
    }
}

impl From<String> for TypePath {
    fn from(path: String) -> Self {
        Self(path)
    }
}
