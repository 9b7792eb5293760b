//! Shared plugin handles.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::error::PluginError;
use crate::info::PluginInfo;

/// Lifecycle state of a plugin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PluginState {
    Unknown,
    Error,
    Queried,
    Requery,
    Loaded,
    LoadFailed,
    UnloadFailed,
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Error => "error",
            Self::Queried => "queried",
            Self::Requery => "requery",
            Self::Loaded => "loaded",
            Self::LoadFailed => "load-failed",
            Self::UnloadFailed => "unload-failed",
        };
        f.write_str(s)
    }
}

struct PluginInner {
    filename: PathBuf,
    info: Option<PluginInfo>,
    loader: String,
    state: RwLock<PluginState>,
    error: RwLock<Option<PluginError>>,
}

impl Drop for PluginInner {
    fn drop(&mut self) {
        trace!(filename = %self.filename.display(), "plugin released");
    }
}

/// Cheap-to-clone handle to a plugin.
///
/// Every clone refers to the same plugin; state and error changes made
/// through one handle are visible through all of them. The plugin is torn
/// down when the last handle is dropped.
#[derive(Clone)]
pub struct Plugin {
    inner: Arc<PluginInner>,
}

impl Plugin {
    /// Create a plugin queried from `filename` by the loader `loader`.
    pub fn new(filename: impl Into<PathBuf>, info: PluginInfo, loader: impl Into<String>) -> Self {
        Self::build(filename.into(), Some(info), loader.into())
    }

    /// Create a plugin whose loader could not produce metadata. Loading it
    /// always fails.
    pub fn without_info(filename: impl Into<PathBuf>, loader: impl Into<String>) -> Self {
        Self::build(filename.into(), None, loader.into())
    }

    fn build(filename: PathBuf, info: Option<PluginInfo>, loader: String) -> Self {
        Self {
            inner: Arc::new(PluginInner {
                filename,
                info,
                loader,
                state: RwLock::new(PluginState::Unknown),
                error: RwLock::new(None),
            }),
        }
    }

    pub fn filename(&self) -> &Path {
        &self.inner.filename
    }

    pub fn info(&self) -> Option<&PluginInfo> {
        self.inner.info.as_ref()
    }

    /// The plugin id, empty when there is no info.
    pub fn id(&self) -> &str {
        self.inner.info.as_ref().map_or("", |i| i.id.as_str())
    }

    /// Id of the loader that queried this plugin.
    pub fn loader_id(&self) -> &str {
        &self.inner.loader
    }

    pub fn state(&self) -> PluginState {
        *self.inner.state.read()
    }

    pub fn set_state(&self, state: PluginState) {
        let mut guard = self.inner.state.write();
        if *guard != state {
            trace!(id = %self.id(), from = %*guard, to = %state, "plugin state change");
            *guard = state;
        }
    }

    /// The last error recorded against this plugin.
    pub fn error(&self) -> Option<PluginError> {
        self.inner.error.read().clone()
    }

    pub fn set_error(&self, error: Option<PluginError>) {
        *self.inner.error.write() = error;
    }

    /// Whether both handles refer to the same plugin.
    pub fn ptr_eq(&self, other: &Plugin) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("id", &self.id())
            .field("filename", &self.inner.filename)
            .field("loader", &self.inner.loader)
            .field("state", &self.state())
            .finish()
    }
}
