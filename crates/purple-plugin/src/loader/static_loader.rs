use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use super::{Loader, PluginEntry};
use crate::error::PluginError;
use crate::info::PluginInfo;
use crate::plugin::{Plugin, PluginState};

/// Loader for plugins compiled into the application.
///
/// Plugins are registered from code and never come from a search path;
/// their filename is the pseudo path `static:<id>`.
pub struct StaticLoader {
    id: String,
    entries: RwLock<HashMap<PathBuf, (Plugin, Arc<dyn PluginEntry>)>>,
}

impl Default for StaticLoader {
    fn default() -> Self {
        Self::with_id("static")
    }
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Register a built-in plugin and return its handle in the `Queried`
    /// state. Hand the handle to [`crate::PluginManager::add_plugin`] to
    /// make it visible to lookups.
    pub fn register(&self, info: PluginInfo, entry: Arc<dyn PluginEntry>) -> Plugin {
        let filename = PathBuf::from(format!("static:{}", info.id));
        let plugin = Plugin::new(filename.clone(), info, self.id.clone());
        plugin.set_state(PluginState::Queried);
        self.entries.write().insert(filename, (plugin.clone(), entry));
        plugin
    }

    /// Every registered plugin.
    pub fn plugins(&self) -> Vec<Plugin> {
        self.entries.read().values().map(|(p, _)| p.clone()).collect()
    }

    fn entry(&self, plugin: &Plugin) -> Result<Arc<dyn PluginEntry>, PluginError> {
        self.entries
            .read()
            .get(plugin.filename())
            .map(|(_, e)| e.clone())
            .ok_or_else(|| PluginError::Load(format!("{} is not a static plugin", plugin.id())))
    }
}

impl Loader for StaticLoader {
    fn id(&self) -> &str {
        &self.id
    }

    fn supported_extensions(&self) -> Vec<String> {
        Vec::new()
    }

    fn query(&self, path: &Path) -> Result<Plugin, PluginError> {
        self.entries
            .read()
            .get(path)
            .map(|(p, _)| p.clone())
            .ok_or_else(|| PluginError::Query {
                path: path.display().to_string(),
                reason: "no static plugin registered".into(),
            })
    }

    fn load(&self, plugin: &Plugin) -> Result<(), PluginError> {
        self.entry(plugin)?.load(plugin)
    }

    fn unload(&self, plugin: &Plugin, shutdown: bool) -> Result<(), PluginError> {
        self.entry(plugin)?.unload(plugin, shutdown)
    }
}
