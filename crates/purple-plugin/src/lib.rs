//! # purple-plugin
//!
//! Plugin manager for purple.
//!
//! Plugins are described by [`PluginInfo`] and handled through cheap
//! [`Plugin`] handles. [`Loader`]s know how to query, load and unload one
//! kind of plugin; the [`PluginManager`] owns the loaders, the search paths
//! and every known plugin, resolves dependencies and drives loads and
//! unloads through its `loading`/`unloading` interceptor chains.
//!
//! ```
//! use std::sync::Arc;
//! use purple_plugin::{Plugin, PluginEntry, PluginError, PluginInfo, PluginManager, StaticLoader};
//!
//! struct Hello;
//!
//! impl PluginEntry for Hello {
//!     fn load(&self, _plugin: &Plugin) -> Result<(), PluginError> {
//!         Ok(())
//!     }
//! }
//!
//! let loader = Arc::new(StaticLoader::new());
//! let plugin = loader.register(PluginInfo::builder("hello").version("1.0").build(), Arc::new(Hello));
//!
//! let mut manager = PluginManager::new();
//! manager.register_loader(loader).unwrap();
//! manager.add_plugin("hello", plugin.clone());
//!
//! manager.load_plugin(&plugin).unwrap();
//! assert_eq!(plugin.state(), purple_plugin::PluginState::Loaded);
//! ```

#![deny(clippy::all)]

pub mod error;
pub mod info;
pub mod loader;
pub mod manager;
pub mod plugin;
pub mod signal;
pub mod source;
pub mod version;

pub use self::error::PluginError;
pub use self::info::{PluginInfo, PluginInfoBuilder};
pub use self::loader::{Loader, ManifestLoader, PluginEntry, StaticLoader};
pub use self::manager::PluginManager;
pub use self::plugin::{Plugin, PluginState};
pub use self::signal::{Flow, HookId, InterceptorChain, ManagerEvent};
pub use self::source::FileSource;
