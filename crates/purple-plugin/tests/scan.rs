//! Search-path scanning with manifest plugins on disk.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use purple_plugin::{
    FileSource, ManifestLoader, Plugin, PluginEntry, PluginError, PluginManager, PluginState,
};

#[derive(Default)]
struct Counter(AtomicUsize);

impl PluginEntry for Counter {
    fn load(&self, _plugin: &Plugin) -> Result<(), PluginError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn refresh_finds_manifests() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("irc.plugin"),
        "id = \"prpl-irc\"\nversion = \"3.0.0\"\nauto-load = true\n",
    )
    .unwrap();
    fs::write(dir.path().join("logger.plugin"), "id = \"logger\"\n").unwrap();
    fs::write(dir.path().join("notes.txt"), "not a plugin").unwrap();

    let loader = Arc::new(ManifestLoader::new());
    let irc = Arc::new(Counter::default());
    loader.register_entry("prpl-irc", irc.clone());

    let mut manager = PluginManager::new();
    manager.register_loader(loader).unwrap();
    manager.append_path(dir.path().to_str().unwrap());
    manager.refresh();

    assert_eq!(manager.list_plugins(), ["logger", "prpl-irc"]);
    let plugin = manager.find_plugin("prpl-irc").unwrap();
    assert_eq!(plugin.state(), PluginState::Loaded);
    assert_eq!(irc.0.load(Ordering::SeqCst), 1);
    assert_eq!(
        manager.find_plugin("logger").unwrap().state(),
        PluginState::Queried
    );

    // A second refresh skips files that are already known.
    manager.refresh();
    assert_eq!(manager.find_plugins("prpl-irc").len(), 1);
    assert_eq!(irc.0.load(Ordering::SeqCst), 1);
}

#[test]
fn scan_collects_errors() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a-broken.plugin"), "id = [").unwrap();
    fs::write(dir.path().join("b-anon.plugin"), "name = \"anonymous\"\n").unwrap();
    fs::write(dir.path().join("c-good.plugin"), "id = \"good\"\n").unwrap();

    let mut manager = PluginManager::new();
    manager
        .register_loader(Arc::new(ManifestLoader::new()))
        .unwrap();
    manager.append_path(dir.path().to_str().unwrap());

    let mut source = FileSource::new();
    // The broken manifest fails before `good` is found, so a rescan is asked for.
    assert!(source.scan(&mut manager));

    let errors = source.errors();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| e.starts_with("failed to query '")
        && e.contains("a-broken.plugin' with loader 'manifest'")));
    assert!(errors.iter().any(|e| e.ends_with("b-anon.plugin has a NULL id")));
    assert!(manager.find_plugin("good").is_some());

    // Nothing new the second time around.
    assert!(!source.scan(&mut manager));
}

#[test]
fn auto_load_without_entry_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("orphan.plugin"),
        "id = \"orphan\"\nauto-load = true\n",
    )
    .unwrap();

    let mut manager = PluginManager::new();
    manager
        .register_loader(Arc::new(ManifestLoader::new()))
        .unwrap();
    manager.append_path(dir.path().to_str().unwrap());

    let mut source = FileSource::new();
    assert!(!source.scan(&mut manager));
    assert!(source.errors()[0].starts_with("failed to load "));

    let plugin = manager.find_plugin("orphan").unwrap();
    assert_eq!(plugin.state(), PluginState::LoadFailed);
}

#[test]
fn missing_directories_are_ignored() {
    let mut manager = PluginManager::new();
    manager
        .register_loader(Arc::new(ManifestLoader::new()))
        .unwrap();
    manager.append_path("/nonexistent/purple/plugins");
    manager.refresh();
    assert!(manager.list_plugins().is_empty());
}
