use std::path::PathBuf;

use directories::ProjectDirs;

pub const APPLICATION_NAME: &str = "uebuild";

pub struct Directory {}

impl Directory {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("dev", "uebuild", APPLICATION_NAME)
    }

    /// Per-user configuration directory; not created here since it is only read
    pub fn config_directory() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// `settings.toml` inside [`Directory::config_directory`]
    pub fn settings_file() -> Option<PathBuf> {
        Self::config_directory().map(|dir| dir.join("settings.toml"))
    }
}
