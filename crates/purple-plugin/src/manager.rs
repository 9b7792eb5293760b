//! The plugin manager: search paths, loaders, plugin lookup, dependency
//! resolution and load/unload orchestration.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, MAIN_SEPARATOR};
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::PluginError;
use crate::loader::{self, Loader};
use crate::plugin::{Plugin, PluginState};
use crate::signal::{Flow, HookId, InterceptorChain, Listeners, ManagerEvent};
use crate::source::FileSource;
use crate::version::{self, VersionOp};

/// Install prefix used by [`PluginManager::add_default_paths`].
pub const PREFIX: &str = match option_env!("PURPLE_PREFIX") {
    Some(prefix) => prefix,
    None => "/usr/local",
};

#[cfg(windows)]
const SEARCH_PATH_SEPARATOR: char = ';';
#[cfg(not(windows))]
const SEARCH_PATH_SEPARATOR: char = ':';

fn dependency_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<id>.+?)((?P<op><=|<|==|=|>=|>)(?P<version>.+))?$")
            .expect("dependency pattern is valid")
    })
}

/// Normalize a search path so that it always ends with a separator.
fn normalize_path(path: &str) -> String {
    let mut normalized = path.to_owned();
    if !normalized.ends_with(MAIN_SEPARATOR) {
        normalized.push(MAIN_SEPARATOR);
    }
    normalized
}

fn join_dir(base: &Path, parts: &[&str]) -> String {
    let mut path = base.to_path_buf();
    for part in parts {
        path.push(part);
    }
    path.to_string_lossy().into_owned()
}

/// Owns every known plugin and loader.
///
/// The manager is an explicit value: construct it at startup, hand it to
/// whatever needs it, and call [`PluginManager::shutdown`] before dropping
/// it so loaded plugins get their shutdown unload.
pub struct PluginManager {
    paths: Vec<String>,
    plugins: HashMap<String, Vec<Plugin>>,
    loaders: HashMap<String, Arc<dyn Loader>>,
    refresh_needed: bool,
    loading: InterceptorChain<Plugin>,
    unloading: InterceptorChain<Plugin>,
    listeners: Listeners,
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            paths: Vec::new(),
            plugins: HashMap::new(),
            loaders: HashMap::new(),
            refresh_needed: false,
            loading: InterceptorChain::new(),
            unloading: InterceptorChain::new(),
            listeners: Listeners::default(),
        }
    }

    // --- search paths ---

    /// Add `path` to the end of the search paths unless already present.
    pub fn append_path(&mut self, path: &str) {
        let normalized = normalize_path(path);
        if !self.paths.contains(&normalized) {
            self.paths.push(normalized);
        }
    }

    /// Add `path` to the front of the search paths unless already present.
    pub fn prepend_path(&mut self, path: &str) {
        let normalized = normalize_path(path);
        if !self.paths.contains(&normalized) {
            self.paths.insert(0, normalized);
        }
    }

    pub fn remove_path(&mut self, path: &str) {
        let normalized = normalize_path(path);
        self.paths.retain(|p| *p != normalized);
    }

    pub fn remove_paths(&mut self) {
        self.paths.clear();
    }

    /// Prepend the system and per-user plugin directories.
    pub fn add_default_paths(&mut self) {
        self.prepend_path(&join_dir(Path::new(PREFIX), &["lib", "gplugin"]));
        if let Some(config) = dirs::config_dir() {
            self.prepend_path(&join_dir(&config, &["gplugin"]));
        }
    }

    /// Prepend the plugin directories of application `app` installed
    /// under `prefix`.
    pub fn add_app_paths(&mut self, prefix: &str, app: &str) {
        self.prepend_path(&join_dir(Path::new(prefix), &["lib", app]));
        if let Some(config) = dirs::config_dir() {
            self.prepend_path(&join_dir(&config, &[app, "plugins"]));
        }
    }

    /// Append every entry of the search-path list in environment variable
    /// `var`, in order.
    pub fn append_paths_from_environment(&mut self, var: &str) {
        for path in env_paths(var) {
            self.append_path(&path);
        }
    }

    /// Prepend every entry of the search-path list in environment variable
    /// `var`. The first entry ends up first.
    pub fn prepend_paths_from_environment(&mut self, var: &str) {
        for path in env_paths(var).into_iter().rev() {
            self.prepend_path(&path);
        }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    // --- loaders ---

    /// Register a loader. Fails without touching the manager if a loader
    /// with the same id is already registered.
    pub fn register_loader(&mut self, loader: Arc<dyn Loader>) -> Result<(), PluginError> {
        let id = loader.id().to_owned();
        if self.loaders.contains_key(&id) {
            return Err(PluginError::LoaderAlreadyRegistered(id));
        }

        self.loaders.insert(id.clone(), loader);
        self.refresh_needed = true;
        info!(loader = %id, "loader registered");
        self.listeners.emit(ManagerEvent::LoaderRegistered(id));
        Ok(())
    }

    /// Unregister a loader. Plugins it loaded stay loaded.
    pub fn unregister_loader(&mut self, id: &str) -> Result<(), PluginError> {
        if self.loaders.remove(id).is_none() {
            return Err(PluginError::LoaderNotRegistered(id.to_owned()));
        }

        info!(loader = %id, "loader unregistered");
        self.listeners
            .emit(ManagerEvent::LoaderUnregistered(id.to_owned()));
        Ok(())
    }

    pub fn loader(&self, id: &str) -> Option<Arc<dyn Loader>> {
        self.loaders.get(id).cloned()
    }

    pub fn loaders(&self) -> Vec<Arc<dyn Loader>> {
        self.loaders.values().cloned().collect()
    }

    // --- signals ---

    /// Connect an interceptor that runs before every plugin load. A veto
    /// fails the load.
    pub fn on_loading<F>(&mut self, hook: F) -> HookId
    where
        F: Fn(Plugin) -> Flow<Plugin> + Send + Sync + 'static,
    {
        self.loading.connect(hook)
    }

    /// Connect an interceptor that runs before every plugin unload.
    pub fn on_unloading<F>(&mut self, hook: F) -> HookId
    where
        F: Fn(Plugin) -> Flow<Plugin> + Send + Sync + 'static,
    {
        self.unloading.connect(hook)
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&ManagerEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener);
    }

    // --- plugin table ---

    /// Add `plugin` under `id` and under every id it provides.
    ///
    /// Within one id, plugins are kept by descending priority; a plugin goes
    /// in front of every entry with the same or a lower priority.
    pub fn add_plugin(&mut self, id: &str, plugin: Plugin) {
        let provided: Vec<String> = plugin
            .info()
            .map(|info| {
                info.provided_ids()
                    .filter(|p| *p != id)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        self.insert_plugin(id, plugin.clone());
        for pid in provided {
            self.insert_plugin(&pid, plugin.clone());
        }
    }

    fn insert_plugin(&mut self, id: &str, plugin: Plugin) {
        let priority = plugin_priority(&plugin);
        let list = self.plugins.entry(id.to_owned()).or_default();
        if list.iter().any(|p| p.ptr_eq(&plugin)) {
            return;
        }
        let pos = list
            .iter()
            .position(|p| plugin_priority(p) <= priority)
            .unwrap_or(list.len());
        list.insert(pos, plugin);
    }

    /// Whether a plugin was queried from `filename`.
    pub fn knows_filename(&self, filename: &Path) -> Option<Plugin> {
        self.plugins
            .values()
            .flatten()
            .find(|p| p.filename() == filename)
            .cloned()
    }

    /// Every plugin id, sorted.
    pub fn list_plugins(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.plugins.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Call `f` with every id and its plugins.
    pub fn foreach<F>(&self, mut f: F)
    where
        F: FnMut(&str, &[Plugin]),
    {
        for (id, plugins) in &self.plugins {
            f(id, plugins);
        }
    }

    pub fn find_plugins(&self, id: &str) -> Vec<Plugin> {
        self.plugins.get(id).cloned().unwrap_or_default()
    }

    /// Plugins for `id` whose version compares to `version` as `op` says.
    ///
    /// With neither an operator nor a version every plugin for `id` is
    /// returned. An unknown operator matches nothing.
    pub fn find_plugins_with_version(
        &self,
        id: &str,
        op: Option<&str>,
        version: Option<&str>,
    ) -> Vec<Plugin> {
        let plugins = self.find_plugins(id);
        let op = op.filter(|o| !o.is_empty());
        let version = version.filter(|v| !v.is_empty());

        if op.is_none() && version.is_none() {
            return plugins;
        }

        let Some(op) = op.and_then(|o| o.parse::<VersionOp>().ok()) else {
            warn!(op = ?op, "unknown version operator");
            return Vec::new();
        };

        plugins
            .into_iter()
            .filter(|p| {
                let found = p.info().and_then(|info| info.version_for(id));
                op.accepts(version::compare(found, version))
            })
            .collect()
    }

    pub fn find_plugins_with_state(&self, state: PluginState) -> Vec<Plugin> {
        let mut found = Vec::new();
        for plugin in self.plugins.values().flatten() {
            if plugin.state() == state && !found.iter().any(|p: &Plugin| p.ptr_eq(plugin)) {
                found.push(plugin.clone());
            }
        }
        found
    }

    /// The preferred plugin for `id`.
    pub fn find_plugin(&self, id: &str) -> Option<Plugin> {
        self.plugins.get(id).and_then(|l| l.first()).cloned()
    }

    /// The plugin for `id` with the highest version. Ties keep the one
    /// found first.
    pub fn find_plugin_with_newest_version(&self, id: &str) -> Option<Plugin> {
        let mut newest: Option<&Plugin> = None;
        for plugin in self.plugins.get(id)? {
            match newest {
                None => newest = Some(plugin),
                Some(current) => {
                    let a = plugin.info().and_then(|i| i.version_for(id));
                    let b = current.info().and_then(|i| i.version_for(id));
                    if version::compare(a, b) == Ordering::Greater {
                        newest = Some(plugin);
                    }
                }
            }
        }
        newest.cloned()
    }

    /// Resolve the dependencies of `plugin`.
    ///
    /// Each dependency line may list alternatives separated by `|`; each
    /// alternative is `id` or `id<op>version`. The first alternative with at
    /// least one matching plugin wins.
    pub fn get_plugin_dependencies(&self, plugin: &Plugin) -> Result<Vec<Plugin>, PluginError> {
        let Some(info) = plugin.info() else {
            return Ok(Vec::new());
        };

        let mut resolved = Vec::new();
        for dependency in &info.dependencies {
            let found = dependency.split('|').find_map(|alternative| {
                let caps = dependency_regex().captures(alternative)?;
                let id = caps.name("id")?.as_str();
                let op = caps.name("op").map(|m| m.as_str());
                let version = caps.name("version").map(|m| m.as_str());
                self.find_plugins_with_version(id, op, version)
                    .into_iter()
                    .next()
            });

            match found {
                Some(dep) => resolved.push(dep),
                None => {
                    return Err(PluginError::Dependency(format!(
                        "failed to find dependency {} for {}",
                        dependency,
                        plugin.id()
                    )));
                }
            }
        }

        Ok(resolved)
    }

    // --- load / unload ---

    /// Load `plugin` and, first, its dependencies.
    ///
    /// Loading an already loaded plugin succeeds without calling its
    /// loader. Dependencies loaded before a failure stay loaded. A
    /// dependency cycle fails with [`PluginError::Dependency`] and leaves
    /// the plugins on the cycle in their current state.
    pub fn load_plugin(&self, plugin: &Plugin) -> Result<(), PluginError> {
        self.load_plugin_inner(plugin, &mut Vec::new())
    }

    /// `loading` holds the plugins whose dependencies are being loaded.
    fn load_plugin_inner(
        &self,
        plugin: &Plugin,
        loading: &mut Vec<Plugin>,
    ) -> Result<(), PluginError> {
        if plugin.state() == PluginState::Loaded {
            return Ok(());
        }

        if loading.iter().any(|p| p.ptr_eq(plugin)) {
            let chain: Vec<&str> = loading.iter().map(Plugin::id).collect();
            return Err(PluginError::Dependency(format!(
                "dependency cycle: {} -> {}",
                chain.join(" -> "),
                plugin.id()
            )));
        }

        if plugin.info().is_none() {
            let err = PluginError::MissingInfo(plugin.filename().display().to_string());
            plugin.set_error(Some(err.clone()));
            plugin.set_state(PluginState::LoadFailed);
            return Err(err);
        }

        loading.push(plugin.clone());
        let dependencies = self.get_plugin_dependencies(plugin).and_then(|deps| {
            deps.iter()
                .try_for_each(|dependency| self.load_plugin_inner(dependency, loading))
        });
        loading.pop();
        dependencies?;

        if let Flow::Veto(reason) = self.loading.run(plugin.clone()) {
            debug!(id = %plugin.id(), %reason, "plugin load vetoed");
            let err = PluginError::Vetoed(reason);
            plugin.set_error(Some(err.clone()));
            plugin.set_state(PluginState::LoadFailed);
            return Err(err);
        }

        let loader = match self.loaders.get(plugin.loader_id()) {
            Some(loader) => loader.clone(),
            None => {
                let err = PluginError::LoaderNotRegistered(plugin.loader_id().to_owned());
                plugin.set_error(Some(err.clone()));
                plugin.set_state(PluginState::LoadFailed);
                return Err(err);
            }
        };

        match loader::load_plugin(loader.as_ref(), plugin) {
            Ok(()) => {
                self.listeners.emit(ManagerEvent::Loaded(plugin.clone()));
                Ok(())
            }
            Err(err) => {
                warn!(id = %plugin.id(), error = %err, code = err.error_code(), "plugin failed to load");
                self.listeners
                    .emit(ManagerEvent::LoadFailed(plugin.clone(), err.to_string()));
                Err(err)
            }
        }
    }

    /// Unload `plugin`. Its dependencies are left loaded.
    pub fn unload_plugin(&self, plugin: &Plugin) -> Result<(), PluginError> {
        self.unload_plugin_full(plugin, false)
    }

    fn unload_plugin_full(&self, plugin: &Plugin, shutdown: bool) -> Result<(), PluginError> {
        if plugin.state() != PluginState::Loaded {
            return Ok(());
        }

        if let Flow::Veto(reason) = self.unloading.run(plugin.clone()) {
            debug!(id = %plugin.id(), %reason, "plugin unload vetoed");
            let err = PluginError::Vetoed(reason);
            plugin.set_error(Some(err.clone()));
            plugin.set_state(PluginState::UnloadFailed);
            return Err(err);
        }

        let Some(loader) = self.loaders.get(plugin.loader_id()).cloned() else {
            let err = PluginError::LoaderNotRegistered(plugin.loader_id().to_owned());
            plugin.set_error(Some(err.clone()));
            plugin.set_state(PluginState::UnloadFailed);
            return Err(err);
        };

        match loader::unload_plugin(loader.as_ref(), plugin, shutdown) {
            Ok(()) => {
                self.listeners.emit(ManagerEvent::Unloaded(plugin.clone()));
                Ok(())
            }
            Err(err) => {
                warn!(id = %plugin.id(), error = %err, "plugin failed to unload");
                self.listeners
                    .emit(ManagerEvent::UnloadFailed(plugin.clone(), err.to_string()));
                Err(err)
            }
        }
    }

    // --- scanning ---

    /// Scan the search paths until no more rescans are requested.
    ///
    /// A scan asks for another pass when it queried a new plugin after an
    /// earlier file failed, since the new plugin may bring the loader the
    /// failed file needed. Plugins already queried are skipped, so the loop
    /// ends once a pass finds nothing new.
    pub fn refresh(&mut self) {
        self.refresh_needed = true;
        while self.refresh_needed {
            self.refresh_needed = false;
            let mut source = FileSource::new();
            if source.scan(self) {
                self.refresh_needed = true;
            }
            for message in source.errors() {
                warn!("{}", message);
            }
        }
    }

    /// Unload every loaded plugin with `shutdown` set. Failures are logged.
    pub fn shutdown(&mut self) {
        for plugin in self.find_plugins_with_state(PluginState::Loaded) {
            let Some(loader) = self.loaders.get(plugin.loader_id()).cloned() else {
                continue;
            };
            if let Err(err) = loader::unload_plugin(loader.as_ref(), &plugin, true) {
                warn!(id = %plugin.id(), error = %err, "failed to unload plugin at shutdown");
            }
        }
        self.plugins.clear();
        self.loaders.clear();
        self.paths.clear();
    }
}

fn plugin_priority(plugin: &Plugin) -> i32 {
    plugin.info().map_or(0, |i| i.priority)
}

fn env_paths(var: &str) -> Vec<String> {
    match std::env::var(var) {
        Ok(value) => value
            .split(SEARCH_PATH_SEPARATOR)
            .filter(|p| !p.is_empty())
            .map(str::to_owned)
            .collect(),
        Err(_) => Vec::new(),
    }
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("paths", &self.paths)
            .field("plugins", &self.plugins.len())
            .field("loaders", &self.loaders.keys().collect::<Vec<_>>())
            .field("refresh_needed", &self.refresh_needed)
            .finish()
    }
}
