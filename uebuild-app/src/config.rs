//! Layered settings
//!
//! Sources, lowest priority first: built-in defaults, the per-user
//! `settings.toml`, the project's `uebuild.toml`, `UEBUILD_*` environment
//! variables, and finally a file passed with `--config`.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};

use crate::directory::Directory;

pub const PROJECT_SETTINGS_FILE: &str = "uebuild.toml";
pub const ENV_PREFIX: &str = "UEBUILD";

/// Keys read as comma separated lists from the environment
const LIST_KEYS: &[&str] = &["engine_search_paths", "engine_catalogs"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Engine installation to use instead of the project's `EngineAssociation`
    pub engine_root: Option<PathBuf>,
    /// Directories scanned for engine `.Build.cs` files
    pub engine_search_paths: Vec<PathBuf>,
    /// Extra engine module catalogs (TOML)
    pub engine_catalogs: Vec<PathBuf>,
    pub builtin_engine_catalog: bool,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine_root: None,
            engine_search_paths: Vec::new(),
            engine_catalogs: Vec::new(),
            builtin_engine_catalog: true,
            log_level: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Load settings for the project rooted at `project_root`
    pub fn load(project_root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        SettingsLoader {
            user_file: Directory::settings_file(),
            project_root: project_root.to_path_buf(),
            explicit: explicit.map(Path::to_path_buf),
            environment: None,
        }
        .load()
    }

    /// Make relative paths relative to `root`
    pub fn resolve_paths(mut self, root: &Path) -> Self {
        let resolve = |path: PathBuf| {
            if path.is_relative() {
                root.join(path)
            } else {
                path
            }
        };

        self.engine_root = self.engine_root.map(resolve);
        self.engine_search_paths = self.engine_search_paths.into_iter().map(resolve).collect();
        self.engine_catalogs = self.engine_catalogs.into_iter().map(resolve).collect();
        self
    }
}

struct SettingsLoader {
    user_file: Option<PathBuf>,
    project_root: PathBuf,
    explicit: Option<PathBuf>,
    /// Replaces the process environment when set
    environment: Option<Map<String, String>>,
}

impl SettingsLoader {
    fn load(self) -> Result<Settings, ConfigError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("builtin_engine_catalog", defaults.builtin_engine_catalog)?
            .set_default("log_level", defaults.log_level)?;

        if let Some(user_file) = &self.user_file {
            tracing::trace!("User settings: {}", user_file.display());
            builder = builder.add_source(toml_file(user_file).required(false));
        }

        builder = builder.add_source(
            toml_file(&self.project_root.join(PROJECT_SETTINGS_FILE)).required(false),
        );

        let mut environment = Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .list_separator(",")
            .source(self.environment);
        for key in LIST_KEYS {
            environment = environment.with_list_parse_key(key);
        }
        builder = builder.add_source(environment);

        if let Some(explicit) = &self.explicit {
            builder = builder.add_source(toml_file(explicit).required(true));
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        Ok(settings.resolve_paths(&self.project_root))
    }
}

fn toml_file(path: &Path) -> File<config::FileSourceFile, FileFormat> {
    File::from(path).format(FileFormat::Toml)
}
