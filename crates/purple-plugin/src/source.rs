//! Plugin discovery over the manager's search paths.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::loader::{self, Loader};
use crate::manager::PluginManager;
use crate::plugin::{Plugin, PluginState};

/// One pass over the search paths.
///
/// Files are matched to loaders by extension and queried. Files whose
/// plugin is already queried or loaded are skipped. Problems are collected
/// as messages rather than aborting the scan.
#[derive(Default)]
pub struct FileSource {
    errors: Vec<String>,
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages from the last scan, most recent first.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Scan every search path of `manager`, adding new plugins to it.
    ///
    /// Returns whether another pass is worthwhile: a new plugin was found
    /// after a query already failed in this pass.
    pub fn scan(&mut self, manager: &mut PluginManager) -> bool {
        self.errors.clear();

        let by_extension = loaders_by_extension(manager);
        let mut refresh = false;
        let mut errors = 0usize;

        for dir in manager.paths().to_vec() {
            for (filename, extension) in list_dir(Path::new(&dir)) {
                if let Some(known) = manager.knows_filename(&filename) {
                    if matches!(known.state(), PluginState::Queried | PluginState::Loaded) {
                        continue;
                    }
                }

                let Some(candidates) = by_extension.get(&extension) else {
                    continue;
                };

                let mut found: Option<(Plugin, Arc<dyn Loader>)> = None;
                for loader in candidates {
                    match loader::query_plugin(loader.as_ref(), &filename) {
                        Ok(plugin) => {
                            found = Some((plugin, loader.clone()));
                            break;
                        }
                        Err(err) => {
                            errors += 1;
                            self.errors.insert(
                                0,
                                format!(
                                    "failed to query '{}' with loader '{}': {}",
                                    filename.display(),
                                    loader.id(),
                                    err
                                ),
                            );
                        }
                    }
                }

                let Some((plugin, loader)) = found else {
                    continue;
                };

                let id = plugin.id().to_owned();
                if id.is_empty() {
                    self.errors.insert(
                        0,
                        format!("plugin {} has a NULL id", plugin.filename().display()),
                    );
                    continue;
                }

                let seen = manager
                    .find_plugins(&id)
                    .iter()
                    .any(|p| p.filename() == plugin.filename());
                if !seen {
                    debug!(id = %id, filename = %plugin.filename().display(), "found plugin");
                    manager.add_plugin(&id, plugin.clone());
                }

                let auto_load = plugin.info().is_some_and(|i| i.auto_load);
                if auto_load {
                    if let Err(err) = loader::load_plugin(loader.as_ref(), &plugin) {
                        self.errors.insert(
                            0,
                            format!("failed to load {} during query: {}", filename.display(), err),
                        );
                        errors += 1;
                    }
                } else if errors > 0 {
                    refresh = true;
                }
            }
        }

        refresh
    }
}

fn loaders_by_extension(manager: &PluginManager) -> HashMap<String, Vec<Arc<dyn Loader>>> {
    let mut map: HashMap<String, Vec<Arc<dyn Loader>>> = HashMap::new();
    for loader in manager.loaders() {
        for extension in loader.supported_extensions() {
            map.entry(extension).or_default().push(loader.clone());
        }
    }
    map
}

/// Regular files in `dir` with their extension, sorted by name. Missing
/// or unreadable directories yield nothing.
fn list_dir(dir: &Path) -> Vec<(PathBuf, String)> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            trace!(dir = %dir.display(), error = %err, "skipping search path");
            return Vec::new();
        }
    };

    let mut files: Vec<(PathBuf, String)> = entries
        .filter_map(Result::ok)
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|e| {
            let path = e.path();
            let extension = path.extension()?.to_str()?.to_owned();
            Some((path, extension))
        })
        .collect();
    files.sort();
    files
}
