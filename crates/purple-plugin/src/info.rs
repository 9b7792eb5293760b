//! Immutable plugin metadata.

use serde::Deserialize;

/// Metadata describing a plugin.
///
/// Built in code with [`PluginInfo::builder`] or read from a TOML manifest:
///
/// ```
/// use purple_plugin::PluginInfo;
///
/// let info: PluginInfo = toml::from_str(r#"
///     id = "purple/logger"
///     name = "Logger"
///     version = "1.2.0"
///     dependencies = ["core/prpl-irc|core/prpl-xmpp>=2.0"]
/// "#).unwrap();
///
/// assert_eq!(info.id, "purple/logger");
/// assert!(info.unloadable);
/// assert!(!info.auto_load);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PluginInfo {
    /// Unique plugin id. A plugin without one is rejected at query time.
    pub id: String,
    /// Other ids this plugin satisfies, optionally as `id=version`.
    pub provides: Vec<String>,
    /// Higher priorities are preferred when several plugins share an id.
    pub priority: i32,
    pub abi_version: u32,
    pub name: Option<String>,
    pub version: Option<String>,
    pub settings_schema: Option<String>,
    pub license_id: Option<String>,
    pub license_text: Option<String>,
    pub license_url: Option<String>,
    pub icon_name: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub authors: Vec<String>,
    pub website: Option<String>,
    /// Dependency lines: `id`, `id<op>version`, alternatives split by `|`.
    pub dependencies: Vec<String>,
    /// Hidden from user-facing plugin lists.
    pub internal: bool,
    /// Whether the plugin may be unloaded outside of shutdown.
    pub unloadable: bool,
    /// Load as soon as the plugin is queried.
    pub auto_load: bool,
}

impl Default for PluginInfo {
    fn default() -> Self {
        Self {
            id: String::new(),
            provides: Vec::new(),
            priority: 0,
            abi_version: 0,
            name: None,
            version: None,
            settings_schema: None,
            license_id: None,
            license_text: None,
            license_url: None,
            icon_name: None,
            summary: None,
            description: None,
            category: None,
            authors: Vec::new(),
            website: None,
            dependencies: Vec::new(),
            internal: false,
            unloadable: true,
            auto_load: false,
        }
    }
}

impl PluginInfo {
    /// Start building info for `id`.
    pub fn builder(id: impl Into<String>) -> PluginInfoBuilder {
        PluginInfoBuilder {
            info: PluginInfo {
                id: id.into(),
                ..Default::default()
            },
        }
    }

    /// Ids from `provides`, with any `=version` suffix removed.
    pub fn provided_ids(&self) -> impl Iterator<Item = &str> {
        self.provides
            .iter()
            .map(|p| p.split_once('=').map_or(p.as_str(), |(id, _)| id))
    }

    /// Version this plugin offers for `id`.
    ///
    /// For its own id that is `version`; for a provided id written as
    /// `id=version` it is the provided version, otherwise `version`.
    pub fn version_for(&self, id: &str) -> Option<&str> {
        if id != self.id {
            for p in &self.provides {
                if let Some((pid, ver)) = p.split_once('=') {
                    if pid == id {
                        return Some(ver);
                    }
                }
            }
        }
        self.version.as_deref()
    }
}

/// Builder for [`PluginInfo`].
#[derive(Clone, Debug)]
pub struct PluginInfoBuilder {
    info: PluginInfo,
}

macro_rules! opt_setter {
    ($($name:ident),* $(,)?) => {
        $(
            #[must_use]
            pub fn $name(mut self, value: impl Into<String>) -> Self {
                self.info.$name = Some(value.into());
                self
            }
        )*
    };
}

impl PluginInfoBuilder {
    opt_setter!(
        name,
        version,
        settings_schema,
        license_id,
        license_text,
        license_url,
        icon_name,
        summary,
        description,
        category,
        website,
    );

    #[must_use]
    pub fn provides<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.info.provides = ids.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.info.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.info.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.info.priority = priority;
        self
    }

    #[must_use]
    pub fn abi_version(mut self, abi_version: u32) -> Self {
        self.info.abi_version = abi_version;
        self
    }

    #[must_use]
    pub fn internal(mut self, internal: bool) -> Self {
        self.info.internal = internal;
        self
    }

    #[must_use]
    pub fn unloadable(mut self, unloadable: bool) -> Self {
        self.info.unloadable = unloadable;
        self
    }

    #[must_use]
    pub fn auto_load(mut self, auto_load: bool) -> Self {
        self.info.auto_load = auto_load;
        self
    }

    pub fn build(self) -> PluginInfo {
        self.info
    }
}
