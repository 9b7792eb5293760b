//! Loader trait and the state bookkeeping shared by every loader.
//!
//! Implementations only do the mechanical work; [`query_plugin`],
//! [`load_plugin`] and [`unload_plugin`] wrap them and keep plugin state and
//! errors consistent.

use std::path::Path;

use tracing::debug;

use crate::error::PluginError;
use crate::plugin::{Plugin, PluginState};

mod manifest;
mod static_loader;

pub use manifest::ManifestLoader;
pub use static_loader::StaticLoader;

/// Loads and unloads one category of plugin implementation.
pub trait Loader: Send + Sync {
    /// Unique loader id.
    fn id(&self) -> &str;

    /// File extensions (without the dot) this loader can query.
    fn supported_extensions(&self) -> Vec<String>;

    /// Produce a plugin for `path`.
    fn query(&self, path: &Path) -> Result<Plugin, PluginError>;

    fn load(&self, plugin: &Plugin) -> Result<(), PluginError>;

    /// `shutdown` is set when the process is exiting.
    fn unload(&self, plugin: &Plugin, shutdown: bool) -> Result<(), PluginError>;
}

/// In-process entry points of a plugin.
pub trait PluginEntry: Send + Sync {
    fn load(&self, plugin: &Plugin) -> Result<(), PluginError>;

    fn unload(&self, _plugin: &Plugin, _shutdown: bool) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Query `path` with `loader`; a successful query leaves the plugin
/// `Queried` with no error.
pub fn query_plugin(loader: &dyn Loader, path: &Path) -> Result<Plugin, PluginError> {
    let plugin = loader.query(path)?;
    plugin.set_error(None);
    plugin.set_state(PluginState::Queried);
    Ok(plugin)
}

/// Load `plugin` through `loader`.
///
/// Already loaded plugins are left alone. Success clears the plugin error
/// and marks it `Loaded`; failure records the error and marks it
/// `LoadFailed`.
pub fn load_plugin(loader: &dyn Loader, plugin: &Plugin) -> Result<(), PluginError> {
    if plugin.state() == PluginState::Loaded {
        return Ok(());
    }

    match loader.load(plugin) {
        Ok(()) => {
            plugin.set_error(None);
            plugin.set_state(PluginState::Loaded);
            debug!(id = %plugin.id(), loader = loader.id(), "plugin loaded");
            Ok(())
        }
        Err(err) => {
            plugin.set_error(Some(err.clone()));
            plugin.set_state(PluginState::LoadFailed);
            Err(err)
        }
    }
}

/// Unload `plugin` through `loader`.
///
/// Plugins that are not loaded are left alone. A plugin whose info marks
/// it as not unloadable can only be unloaded at shutdown. Success returns
/// the plugin to `Queried`; failure records the error and marks it
/// `UnloadFailed`.
pub fn unload_plugin(loader: &dyn Loader, plugin: &Plugin, shutdown: bool) -> Result<(), PluginError> {
    if plugin.state() != PluginState::Loaded {
        return Ok(());
    }

    let unloadable = plugin.info().map(|i| i.unloadable).unwrap_or(true);
    let result = if !unloadable && !shutdown {
        Err(PluginError::NotUnloadable(plugin.id().to_owned()))
    } else {
        loader.unload(plugin, shutdown)
    };

    match result {
        Ok(()) => {
            plugin.set_state(PluginState::Queried);
            debug!(id = %plugin.id(), loader = loader.id(), shutdown, "plugin unloaded");
            Ok(())
        }
        Err(err) => {
            plugin.set_error(Some(err.clone()));
            plugin.set_state(PluginState::UnloadFailed);
            Err(err)
        }
    }
}
