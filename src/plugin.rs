//! The IRC protocol as a plugin.
//!
//! The protocol is compiled in. It is exposed to the [`PluginManager`]
//! through a [`StaticLoader`], or through a `prpl-irc.plugin` manifest
//! bound with [`bind_manifest`]. Loading registers the protocol; sessions
//! can only be created while it is registered.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use purple_plugin::{
    ManifestLoader, Plugin, PluginEntry, PluginError, PluginInfo, PluginManager, StaticLoader,
};
use tracing::info;

pub const PLUGIN_ID: &str = "prpl-irc";

/// ABI version of purple 3.
pub const ABI_VERSION: u32 = 0x0300_0000;

/// Id of the loader [`register`] adds to the manager.
pub const LOADER_ID: &str = "purple-irc";

/// Metadata of the IRC protocol plugin.
pub fn plugin_info() -> PluginInfo {
    PluginInfo::builder(PLUGIN_ID)
        .name("IRC Protocol")
        .version(env!("CARGO_PKG_VERSION"))
        .category("Protocol")
        .summary("IRC Protocol Plugin")
        .description("The IRC Protocol Plugin that Sucks Less")
        .website("https://pidgin.im/")
        .abi_version(ABI_VERSION)
        .internal(true)
        .auto_load(true)
        .build()
}

/// Plugin entry point; tracks whether the protocol is registered.
#[derive(Debug, Default)]
pub struct IrcProtocol {
    registered: AtomicBool,
}

impl IrcProtocol {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }
}

impl PluginEntry for IrcProtocol {
    fn load(&self, plugin: &Plugin) -> Result<(), PluginError> {
        if self.registered.swap(true, Ordering::AcqRel) {
            return Err(PluginError::Load(format!(
                "protocol {} is already registered",
                plugin.id()
            )));
        }
        info!(id = %plugin.id(), "IRC protocol registered");
        Ok(())
    }

    fn unload(&self, plugin: &Plugin, shutdown: bool) -> Result<(), PluginError> {
        if !self.registered.swap(false, Ordering::AcqRel) {
            return Err(PluginError::Unload(format!(
                "protocol {} is not registered",
                plugin.id()
            )));
        }
        info!(id = %plugin.id(), shutdown, "IRC protocol unregistered");
        Ok(())
    }
}

/// Register the built-in loader and the IRC plugin with `manager`.
///
/// The plugin is left queried; load it with [`PluginManager::load_plugin`].
pub fn register(
    manager: &mut PluginManager,
    protocol: Arc<IrcProtocol>,
) -> Result<Plugin, PluginError> {
    let loader = Arc::new(StaticLoader::with_id(LOADER_ID));
    let plugin = loader.register(plugin_info(), protocol);
    manager.register_loader(loader)?;
    manager.add_plugin(PLUGIN_ID, plugin.clone());
    Ok(plugin)
}

/// Bind the protocol to manifests declaring `prpl-irc`.
pub fn bind_manifest(loader: &ManifestLoader, protocol: Arc<IrcProtocol>) {
    loader.register_entry(PLUGIN_ID, protocol);
}
