use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::{Loader, PluginEntry};
use crate::error::PluginError;
use crate::info::PluginInfo;
use crate::plugin::Plugin;

/// File extension of plugin manifests.
pub const MANIFEST_EXTENSION: &str = "plugin";

/// Loader for `*.plugin` TOML manifests.
///
/// A manifest carries a plugin's [`PluginInfo`]; the code behind it is an
/// in-process [`PluginEntry`] registered under the same id with
/// [`ManifestLoader::register_entry`]. Manifests without a registered entry
/// can be queried and listed but fail to load.
pub struct ManifestLoader {
    entries: RwLock<HashMap<String, Arc<dyn PluginEntry>>>,
}

impl Default for ManifestLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestLoader {
    pub const ID: &'static str = "manifest";

    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Bind `entry` to manifests declaring `id`. Replaces any previous
    /// binding.
    pub fn register_entry(&self, id: impl Into<String>, entry: Arc<dyn PluginEntry>) {
        self.entries.write().insert(id.into(), entry);
    }

    fn entry(&self, plugin: &Plugin) -> Result<Arc<dyn PluginEntry>, PluginError> {
        self.entries
            .read()
            .get(plugin.id())
            .cloned()
            .ok_or_else(|| PluginError::Load(format!("no entry point registered for {}", plugin.id())))
    }
}

impl Loader for ManifestLoader {
    fn id(&self) -> &str {
        Self::ID
    }

    fn supported_extensions(&self) -> Vec<String> {
        vec![MANIFEST_EXTENSION.to_owned()]
    }

    fn query(&self, path: &Path) -> Result<Plugin, PluginError> {
        let text = std::fs::read_to_string(path).map_err(|e| PluginError::Query {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let info: PluginInfo = toml::from_str(&text).map_err(|e| PluginError::Manifest {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), id = %info.id, "queried manifest");
        Ok(Plugin::new(path, info, Self::ID))
    }

    fn load(&self, plugin: &Plugin) -> Result<(), PluginError> {
        self.entry(plugin)?.load(plugin)
    }

    fn unload(&self, plugin: &Plugin, shutdown: bool) -> Result<(), PluginError> {
        self.entry(plugin)?.unload(plugin, shutdown)
    }
}
