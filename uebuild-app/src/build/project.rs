//! An Unreal project on disk with its module registry and targets

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Deserialize;
use uebuild_core::{AssembledTarget, ModuleOrigin, ModuleRegistry, ResolvedModule};

use super::engine::{builtin_catalog, engine_source_dir, locate_engine, read_catalog};
use super::error::BuildError;
use super::modules::find_modules;
use super::targets::find_build_targets;
use super::types::{DiscoveredTarget, EngineInstall, TargetCheck};
use crate::config::Settings;

/// The subset of `.uproject` read here
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProjectFile {
    #[serde(default)]
    engine_association: Option<String>,
}

#[derive(Debug)]
pub struct Project {
    pub root: PathBuf,
    pub name: String,
    pub uproject: Option<PathBuf>,
    pub engine_association: Option<String>,
    pub engine: Option<EngineInstall>,
    pub registry: ModuleRegistry,
    /// Editor targets first, then by name
    pub targets: IndexMap<String, DiscoveredTarget>,
}

/// Project root for a path naming either the root directory or its `.uproject`
pub fn project_root(path: &Path) -> PathBuf {
    let is_uproject = path.extension().is_some_and(|ext| ext == "uproject");
    match (is_uproject, path.parent()) {
        (true, Some(parent)) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        (true, _) => PathBuf::from("."),
        (false, _) => path.to_path_buf(),
    }
}

/// Find the .uproject file in a directory, first by name when there are several
pub fn find_uproject_file(path: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(path).ok()?;
    let mut found: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|entry| entry.is_file() && entry.extension().is_some_and(|ext| ext == "uproject"))
        .collect();
    found.sort();

    if found.len() > 1 {
        tracing::warn!(
            "Several .uproject files in {}, using {}",
            path.display(),
            found[0].display()
        );
    }
    found.into_iter().next()
}

fn read_project_file(path: &Path) -> Result<ProjectFile, BuildError> {
    let content = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
    serde_json::from_str(&content).map_err(|source| BuildError::ProjectFile {
        path: path.to_path_buf(),
        source,
    })
}

impl Project {
    /// Load the project at `path`, a project directory or its `.uproject` file
    pub fn load(path: &Path, settings: &Settings) -> Result<Self, BuildError> {
        let root = project_root(path);
        let source_dir = root.join("Source");
        if !source_dir.is_dir() {
            return Err(BuildError::MissingSource(root));
        }

        let uproject = if path.is_file() {
            Some(path.to_path_buf())
        } else {
            find_uproject_file(&root)
        };
        let project_file = match &uproject {
            Some(uproject) => read_project_file(uproject)?,
            None => ProjectFile::default(),
        };

        let name = uproject
            .as_deref()
            .and_then(Path::file_stem)
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| directory_name(&root));

        let engine = locate_engine(
            settings.engine_root.as_deref(),
            project_file.engine_association.as_deref(),
        );
        match &engine {
            Some(engine) => tracing::info!(
                "Using engine at {} ({})",
                engine.root.display(),
                engine.version.as_deref().unwrap_or("unknown version")
            ),
            None => tracing::info!("No engine installation found"),
        }

        let registry = build_registry(&source_dir, engine.as_ref(), settings)?;
        let targets = collect_targets(&source_dir)?;

        tracing::info!(
            "Loaded project {} with {} modules and {} targets",
            name,
            registry.len(),
            targets.len()
        );

        Ok(Self {
            root,
            name,
            uproject,
            engine_association: project_file.engine_association,
            engine,
            registry,
            targets,
        })
    }

    pub fn target(&self, name: &str) -> Option<&DiscoveredTarget> {
        self.targets.get(name)
    }

    pub fn resolve(&self, module: &str) -> Result<ResolvedModule, BuildError> {
        Ok(self.registry.resolve_module(module)?)
    }

    pub fn assemble(&self, target: &str) -> Result<AssembledTarget, BuildError> {
        let target = self
            .target(target)
            .ok_or_else(|| BuildError::UnknownTarget(target.to_string()))?;
        Ok(self.registry.assemble_target(&target.descriptor)?)
    }

    /// Assemble every target, collecting failures instead of stopping at the first
    pub fn check(&self) -> Vec<TargetCheck> {
        self.targets
            .values()
            .map(|target| match self.registry.assemble_target(&target.descriptor) {
                Ok(assembled) => TargetCheck {
                    target: target.name().to_string(),
                    module_count: assembled.len(),
                    error: None,
                },
                Err(e) => TargetCheck {
                    target: target.name().to_string(),
                    module_count: 0,
                    error: Some(e.to_string()),
                },
            })
            .collect()
    }
}

fn directory_name(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(root)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Catalogs first, then engine modules on disk, then the project's own modules
fn build_registry(
    source_dir: &Path,
    engine: Option<&EngineInstall>,
    settings: &Settings,
) -> Result<ModuleRegistry, BuildError> {
    let mut registry = ModuleRegistry::new();

    if settings.builtin_engine_catalog {
        for descriptor in builtin_catalog()? {
            registry.register(descriptor, ModuleOrigin::Catalog, None)?;
        }
    }
    for catalog in &settings.engine_catalogs {
        for descriptor in read_catalog(catalog)? {
            registry.register(descriptor, ModuleOrigin::Catalog, Some(catalog))?;
        }
    }

    let mut search_paths = settings.engine_search_paths.clone();
    if let Some(engine) = engine {
        search_paths.push(engine_source_dir(&engine.root));
    }
    for search_path in &search_paths {
        if !search_path.is_dir() {
            tracing::warn!("Engine search path {} does not exist", search_path.display());
            continue;
        }
        for module in find_modules(search_path)? {
            registry.register(module.descriptor, ModuleOrigin::Engine, Some(&module.path))?;
        }
    }

    for module in find_modules(source_dir)? {
        registry.register(module.descriptor, ModuleOrigin::Project, Some(&module.path))?;
    }

    Ok(registry)
}

fn collect_targets(source_dir: &Path) -> Result<IndexMap<String, DiscoveredTarget>, BuildError> {
    let mut targets = IndexMap::new();

    for target in find_build_targets(source_dir)? {
        match targets.entry(target.name().to_string()) {
            Entry::Occupied(existing) => {
                let existing: &DiscoveredTarget = existing.get();
                return Err(BuildError::DuplicateTarget {
                    name: target.name().to_string(),
                    first: existing.path.clone(),
                    second: target.path,
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(target);
            }
        }
    }

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOMEWORK_BUILD_CS: &str = r#"
public class Homework : ModuleRules
{
	public Homework(ReadOnlyTargetRules Target) : base(Target)
	{
		PCHUsage = PCHUsageMode.UseExplicitOrSharedPCHs;
		PublicDependencyModuleNames.AddRange(new string[] { "Core", "CoreUObject", "Engine", "InputCore", "HeadMountedDisplay", "PhysicsCore", "UMG", "NavigationSystem" });
	}
}
"#;

    const HOMEWORK_EDITOR_TARGET_CS: &str = r#"
public class HomeworkEditorTarget : TargetRules
{
	public HomeworkEditorTarget(TargetInfo Target) : base(Target)
	{
		Type = TargetType.Editor;
		DefaultBuildSettings = BuildSettingsVersion.V2;
		ExtraModuleNames.Add("Homework");
	}
}
"#;

    const HOMEWORK_TARGET_CS: &str = r#"
public class HomeworkTarget : TargetRules
{
	public HomeworkTarget(TargetInfo Target) : base(Target)
	{
		Type = TargetType.Game;
		DefaultBuildSettings = BuildSettingsVersion.V2;
		ExtraModuleNames.AddRange(new string[] { "Homework" });
	}
}
"#;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn homework_project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(
            &root.join("Homework.uproject"),
            r#"{ "FileVersion": 3, "EngineAssociation": "4.27", "Category": "" }"#,
        );
        write(&root.join("Source/Homework/Homework.Build.cs"), HOMEWORK_BUILD_CS);
        write(&root.join("Source/Homework.Target.cs"), HOMEWORK_TARGET_CS);
        write(&root.join("Source/HomeworkEditor.Target.cs"), HOMEWORK_EDITOR_TARGET_CS);
        dir
    }

    #[test]
    fn test_project_root() {
        assert_eq!(
            project_root(Path::new("/work/Homework/Homework.uproject")),
            PathBuf::from("/work/Homework")
        );
        assert_eq!(project_root(Path::new("Homework.uproject")), PathBuf::from("."));
        assert_eq!(project_root(Path::new("/work/Homework")), PathBuf::from("/work/Homework"));
    }

    #[test]
    fn test_load_homework() {
        let dir = homework_project();
        let project = Project::load(dir.path(), &Settings::default()).unwrap();

        assert_eq!(project.name, "Homework");
        assert_eq!(project.engine_association.as_deref(), Some("4.27"));
        let targets: Vec<_> = project.targets.keys().map(String::as_str).collect();
        assert_eq!(targets, vec!["HomeworkEditor", "Homework"]);
        assert_eq!(
            project.registry.get("Homework").map(|module| module.origin),
            Some(ModuleOrigin::Project)
        );
    }

    #[test]
    fn test_load_from_uproject_path() {
        let dir = homework_project();
        let project =
            Project::load(&dir.path().join("Homework.uproject"), &Settings::default()).unwrap();
        assert_eq!(project.root, dir.path());
        assert_eq!(project.uproject, Some(dir.path().join("Homework.uproject")));
    }

    #[test]
    fn test_assemble_homework_editor() {
        let dir = homework_project();
        let project = Project::load(dir.path(), &Settings::default()).unwrap();

        let assembled = project.assemble("HomeworkEditor").unwrap();
        assert_eq!(assembled.len(), 9);
        assert_eq!(assembled.position("Homework"), Some(8));
        for dependency in &project.resolve("Homework").unwrap().dependencies {
            assert!(assembled.contains(dependency));
        }
    }

    #[test]
    fn test_unknown_target() {
        let dir = homework_project();
        let project = Project::load(dir.path(), &Settings::default()).unwrap();
        let err = project.assemble("HomeworkServer").unwrap_err();
        assert_eq!(err.to_string(), "unknown target 'HomeworkServer'");
    }

    #[test]
    fn test_without_catalog_engine_modules_are_unknown() {
        let dir = homework_project();
        let settings = Settings {
            builtin_engine_catalog: false,
            ..Settings::default()
        };
        let project = Project::load(dir.path(), &settings).unwrap();

        let err = project.assemble("HomeworkEditor").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown module 'Core' (referenced by 'Homework')"
        );

        let checks = project.check();
        assert_eq!(checks.len(), 2);
        assert!(checks.iter().all(|check| !check.is_ok()));
    }

    #[test]
    fn test_engine_search_path_replaces_catalog() {
        let dir = homework_project();
        let engine = dir.path().join("EngineSource");
        write(
            &engine.join("Runtime/UMG/UMG.Build.cs"),
            r#"PublicDependencyModuleNames.AddRange(new string[] { "Core", "Slate" });"#,
        );

        let settings = Settings {
            engine_search_paths: vec![engine.clone()],
            ..Settings::default()
        };
        let project = Project::load(dir.path(), &settings).unwrap();

        let umg = project.registry.get("UMG").unwrap();
        assert_eq!(umg.origin, ModuleOrigin::Engine);
        assert_eq!(umg.path, Some(engine.join("Runtime/UMG/UMG.Build.cs")));

        let assembled = project.assemble("HomeworkEditor").unwrap();
        assert!(assembled.contains("Slate"));
        assert!(assembled.contains("ApplicationCore"));
        assert!(assembled.position("Slate") < assembled.position("UMG"));
    }

    #[test]
    fn test_project_module_shadowing_engine_is_rejected() {
        let dir = homework_project();
        write(
            &dir.path().join("Source/Core/Core.Build.cs"),
            "public class Core : ModuleRules {}",
        );

        let err = Project::load(dir.path(), &Settings::default()).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Resolve(uebuild_core::ResolveError::DuplicateModule { ref name, .. })
                if name == "Core"
        ));
    }

    #[test]
    fn test_duplicate_target() {
        let dir = homework_project();
        write(
            &dir.path().join("Source/Other/Homework.Target.cs"),
            HOMEWORK_TARGET_CS,
        );

        let err = Project::load(dir.path(), &Settings::default()).unwrap_err();
        assert!(matches!(err, BuildError::DuplicateTarget { ref name, .. } if name == "Homework"));
    }

    #[test]
    fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = Project::load(dir.path(), &Settings::default()).unwrap_err();
        assert!(matches!(err, BuildError::MissingSource(_)));
    }

    #[test]
    fn test_project_without_uproject() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Sandbox");
        write(
            &root.join("Source/Sandbox/Sandbox.Build.cs"),
            r#"PublicDependencyModuleNames.Add("Core");"#,
        );

        let project = Project::load(&root, &Settings::default()).unwrap();
        assert_eq!(project.name, "Sandbox");
        assert!(project.uproject.is_none());
        assert!(project.engine_association.is_none());
        assert!(project.targets.is_empty());
    }
}
