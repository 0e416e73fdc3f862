//! Engine discovery and engine module catalogs

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use uebuild_core::ModuleDescriptor;

use super::error::BuildError;
use super::types::EngineInstall;

/// Engine modules known without an engine checkout
const BUILTIN_CATALOG: &str = include_str!("../../resources/engine_modules.toml");

/// Engine catalog file structure
#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "module")]
    modules: Vec<ModuleDescriptor>,
}

/// Parse catalog TOML; `origin` only names the source in errors
pub fn parse_catalog(content: &str, origin: &str) -> Result<Vec<ModuleDescriptor>, BuildError> {
    let catalog: CatalogFile = toml::from_str(content).map_err(|source| BuildError::Catalog {
        origin: origin.to_string(),
        source,
    })?;
    Ok(catalog.modules)
}

pub fn builtin_catalog() -> Result<Vec<ModuleDescriptor>, BuildError> {
    parse_catalog(BUILTIN_CATALOG, "<builtin>")
}

pub fn read_catalog(path: &Path) -> Result<Vec<ModuleDescriptor>, BuildError> {
    let content = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
    parse_catalog(&content, &path.display().to_string())
}

/// Locate the engine for a project: an explicit root wins, otherwise the
/// conventional install location of the project's `EngineAssociation`.
pub fn locate_engine(
    configured_root: Option<&Path>,
    association: Option<&str>,
) -> Option<EngineInstall> {
    let root = match configured_root {
        Some(root) => Some(root.to_path_buf()),
        None => association.and_then(get_engine_path_for_association),
    }?;

    if !root.is_dir() {
        tracing::warn!("Engine root {} does not exist", root.display());
        return None;
    }

    let version = get_engine_version(&root);
    Some(EngineInstall { root, version })
}

/// Find engine installation path for a given EngineAssociation
fn get_engine_path_for_association(association: &str) -> Option<PathBuf> {
    let mut candidates = Vec::new();

    #[cfg(target_os = "windows")]
    {
        candidates.push(PathBuf::from(format!(
            "C:\\Program Files\\Epic Games\\UE_{}",
            association
        )));
    }

    #[cfg(target_os = "macos")]
    {
        candidates.push(PathBuf::from(format!(
            "/Users/Shared/Epic Games/UE_{}",
            association
        )));
        candidates.push(PathBuf::from(format!(
            "/Applications/Epic Games/UE_{}",
            association
        )));
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(home) = std::env::var("HOME") {
            candidates.push(PathBuf::from(format!("{}/UnrealEngine-{}", home, association)));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get engine version from Build.version file
pub fn get_engine_version(engine_path: &Path) -> Option<String> {
    let version_file = engine_path.join("Engine").join("Build").join("Build.version");
    let content = fs::read_to_string(&version_file).ok()?;
    let json = serde_json::from_str::<serde_json::Value>(&content).ok()?;

    let major = json.get("MajorVersion")?.as_u64()?;
    let minor = json.get("MinorVersion")?.as_u64()?;
    let patch = json.get("PatchVersion")?.as_u64()?;
    Some(format!("{}.{}.{}", major, minor, patch))
}

/// Directory holding the engine's own module rules
pub fn engine_source_dir(engine_path: &Path) -> PathBuf {
    engine_path.join("Engine").join("Source")
}
