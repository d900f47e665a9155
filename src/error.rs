use thiserror::Error;

/// Errors raised while resolving build-plans.
///
/// Every variant carries the capability type name (and instance key where one
/// applies) so the offending configuration entry can be located from the
/// message alone. "Not found" on a plain lookup is **not** an error: those
/// calls return `Ok(None)`.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// A plan asked for the default, but the owning source has none set.
    #[error("no default instance is defined for plugin type {plugin_type}")]
    MissingDefault { plugin_type: String },

    /// A reference plan's key resolves to nothing, internal or external.
    #[error("could not find an instance named \"{key}\" for plugin type {plugin_type}")]
    MissingReference { key: String, plugin_type: String },

    /// The backend failed unexpectedly while retrieving a plan by key.
    #[error("failed to retrieve instance \"{key}\" from the memento source")]
    Retrieval {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// The backend failed unexpectedly while enumerating its plans.
    #[error("failed to enumerate instances from memento source \"{description}\"")]
    Enumeration {
        description: String,
        #[source]
        source: anyhow::Error,
    },

    /// No family is registered for the requested capability type.
    #[error("no plugin family is registered for plugin type {plugin_type}")]
    UnknownFamily { plugin_type: String },

    /// A concrete plan names no registered pluggable type for its family.
    #[error("no plugin \"{concrete}\" is registered for plugin type {plugin_type}")]
    UnknownPlugin {
        plugin_type: String,
        concrete: String,
    },
}

impl ResolutionError {
    /// Stable numeric code identifying the error kind, independent of
    /// message wording.
    pub fn code(&self) -> u16 {
        match self {
            Self::MissingReference { .. } => 200,
            Self::MissingDefault { .. } => 202,
            Self::Retrieval { .. } | Self::Enumeration { .. } => 203,
            Self::UnknownFamily { .. } => 204,
            Self::UnknownPlugin { .. } => 205,
        }
    }
}
