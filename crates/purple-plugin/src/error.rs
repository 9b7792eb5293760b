//! Plugin manager errors.

use thiserror::Error;

/// Errors raised by the plugin manager, its loaders and plugin entry points.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PluginError {
    #[error("loader {0} was already registered")]
    LoaderAlreadyRegistered(String),

    #[error("loader {0} is not registered")]
    LoaderNotRegistered(String),

    /// No alternative of a dependency line resolved.
    #[error("{0}")]
    Dependency(String),

    #[error("plugin {0} did not return valid plugin info")]
    MissingInfo(String),

    #[error("plugin {0} has a NULL id")]
    MissingId(String),

    #[error("plugin {0} can not be unloaded")]
    NotUnloadable(String),

    /// A `loading` or `unloading` interceptor refused the operation.
    #[error("{0}")]
    Vetoed(String),

    #[error("failed to query {path}: {reason}")]
    Query { path: String, reason: String },

    /// Load failure reported by a loader or plugin entry point.
    #[error("{0}")]
    Load(String),

    /// Unload failure reported by a loader or plugin entry point.
    #[error("{0}")]
    Unload(String),

    #[error("invalid manifest {path}: {reason}")]
    Manifest { path: String, reason: String },

    #[error("io error: {0}")]
    Io(String),
}

impl PluginError {
    /// Stable label for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::LoaderAlreadyRegistered(_) => "LOADER_ALREADY_REGISTERED",
            Self::LoaderNotRegistered(_) => "LOADER_NOT_REGISTERED",
            Self::Dependency(_) => "DEPENDENCY",
            Self::MissingInfo(_) => "MISSING_INFO",
            Self::MissingId(_) => "MISSING_ID",
            Self::NotUnloadable(_) => "NOT_UNLOADABLE",
            Self::Vetoed(_) => "VETOED",
            Self::Query { .. } => "QUERY",
            Self::Load(_) => "LOAD",
            Self::Unload(_) => "UNLOAD",
            Self::Manifest { .. } => "MANIFEST",
            Self::Io(_) => "IO",
        }
    }
}

impl From<std::io::Error> for PluginError {
    fn from(err: std::io::Error) -> Self {
        PluginError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            PluginError::LoaderAlreadyRegistered("native".into()).to_string(),
            "loader native was already registered"
        );
        assert_eq!(
            PluginError::LoaderNotRegistered("lua".into()).to_string(),
            "loader lua is not registered"
        );
        assert_eq!(
            PluginError::NotUnloadable("core".into()).to_string(),
            "plugin core can not be unloaded"
        );
    }

    #[test]
    fn test_error_code() {
        assert_eq!(PluginError::Vetoed("no".into()).error_code(), "VETOED");
    }
}
