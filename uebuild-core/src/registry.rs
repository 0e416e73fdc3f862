//! Name-keyed registry of module descriptors

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use strum_macros::{AsRefStr, Display};

use crate::descriptor::{ModuleDescriptor, PchUsage};
use crate::error::ResolveError;

/// Where a registered module came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
pub enum ModuleOrigin {
    /// Rules file inside the project's source tree
    Project,
    /// Rules file found on an engine search path
    Engine,
    /// Entry of an engine module catalog, replaced by any on-disk engine module
    Catalog,
}

#[derive(Debug, Clone)]
pub struct RegisteredModule {
    pub descriptor: ModuleDescriptor,
    pub origin: ModuleOrigin,
    /// Rules file the descriptor was read from, if any
    pub path: Option<PathBuf>,
}

impl RegisteredModule {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn location(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => format!("{} module", self.origin.as_ref().to_lowercase()),
        }
    }
}

/// Result of resolving a single module name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedModule {
    pub name: String,
    pub pch_usage: PchUsage,
    /// Public then private dependencies, first occurrence kept
    pub dependencies: Vec<String>,
    /// Dependencies that may depend back on this module
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub circular_dependencies: Vec<String>,
    pub origin: ModuleOrigin,
}

impl ResolvedModule {
    /// Dependencies that must be compiled before this module
    pub fn ordered_dependencies(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .map(String::as_str)
            .filter(|dependency| !self.circular_dependencies.iter().any(|c| c == dependency))
    }
}

/// All module descriptors visible to one build, in registration order
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: IndexMap<String, RegisteredModule>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module descriptor.
    ///
    /// Catalog entries give way to on-disk engine modules of the same name,
    /// and a later catalog entry replaces an earlier one. Every other
    /// collision, project modules included, is a
    /// [`ResolveError::DuplicateModule`].
    pub fn register(
        &mut self,
        descriptor: ModuleDescriptor,
        origin: ModuleOrigin,
        path: Option<&Path>,
    ) -> Result<(), ResolveError> {
        let entry = RegisteredModule {
            descriptor,
            origin,
            path: path.map(Path::to_path_buf),
        };

        let Some(existing) = self.modules.get(entry.name()) else {
            tracing::trace!("Registered {} module {}", origin, entry.name());
            self.modules.insert(entry.name().to_string(), entry);
            return Ok(());
        };

        match (existing.origin, origin) {
            (ModuleOrigin::Engine, ModuleOrigin::Catalog) => {
                tracing::debug!(
                    "Ignoring catalog entry for {}, already provided by {}",
                    entry.name(),
                    existing.location()
                );
                Ok(())
            }
            (ModuleOrigin::Catalog, ModuleOrigin::Catalog | ModuleOrigin::Engine) => {
                tracing::debug!("{} replaces catalog entry for {}", entry.location(), entry.name());
                // Keeps the original slot so listing order stays stable.
                if let Some(slot) = self.modules.get_mut(entry.name()) {
                    *slot = entry;
                }
                Ok(())
            }
            _ => Err(ResolveError::DuplicateModule {
                name: entry.name().to_string(),
                first: existing.location(),
                second: entry.location(),
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredModule> {
        self.modules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn modules(&self) -> impl Iterator<Item = &RegisteredModule> {
        self.modules.values()
    }

    pub fn modules_from(&self, origin: ModuleOrigin) -> impl Iterator<Item = &RegisteredModule> {
        self.modules().filter(move |module| module.origin == origin)
    }

    /// Look up `name` and return its PCH policy and de-duplicated dependencies
    pub fn resolve_module(&self, name: &str) -> Result<ResolvedModule, ResolveError> {
        let module = self.get(name).ok_or_else(|| ResolveError::unknown(name))?;

        Ok(ResolvedModule {
            name: module.descriptor.name.clone(),
            pch_usage: module.descriptor.pch_usage,
            dependencies: module
                .descriptor
                .all_dependencies()
                .unique()
                .map(str::to_string)
                .collect(),
            circular_dependencies: module
                .descriptor
                .circular_dependencies
                .iter()
                .unique()
                .cloned()
                .collect(),
            origin: module.origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn homework() -> ModuleDescriptor {
        ModuleDescriptor::new("Homework")
            .with_pch_usage(PchUsage::UseExplicitOrSharedPchs)
            .with_public_dependencies(["Core", "CoreUObject", "Engine", "Core"])
    }

    #[test]
    fn test_resolve_module() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(homework(), ModuleOrigin::Project, None)
            .unwrap();

        let resolved = registry.resolve_module("Homework").unwrap();
        assert_eq!(resolved.pch_usage, PchUsage::UseExplicitOrSharedPchs);
        assert_eq!(resolved.dependencies, vec!["Core", "CoreUObject", "Engine"]);
        assert_eq!(resolved.origin, ModuleOrigin::Project);
    }

    #[test]
    fn test_circular_dependencies_are_not_ordered() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(
                ModuleDescriptor::new("Engine")
                    .with_public_dependencies(["Core"])
                    .with_private_dependencies(["UMG"])
                    .with_circular_dependencies(["UMG", "UMG"]),
                ModuleOrigin::Engine,
                None,
            )
            .unwrap();

        let resolved = registry.resolve_module("Engine").unwrap();
        assert_eq!(resolved.dependencies, vec!["Core", "UMG"]);
        assert_eq!(resolved.circular_dependencies, vec!["UMG"]);
        let ordered: Vec<_> = resolved.ordered_dependencies().collect();
        assert_eq!(ordered, vec!["Core"]);
    }

    #[test]
    fn test_resolve_is_repeatable() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(homework(), ModuleOrigin::Project, None)
            .unwrap();

        assert_eq!(
            registry.resolve_module("Homework").unwrap(),
            registry.resolve_module("Homework").unwrap()
        );
    }

    #[test]
    fn test_unknown_module() {
        let registry = ModuleRegistry::new();
        let err = registry.resolve_module("Missing").unwrap_err();
        assert_eq!(err, ResolveError::unknown("Missing"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(homework(), ModuleOrigin::Project, None)
            .unwrap();
        assert!(registry.resolve_module("homework").unwrap_err().is_unknown_module());
    }

    #[test]
    fn test_duplicate_project_module() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(
                homework(),
                ModuleOrigin::Project,
                Some(Path::new("Source/Homework/Homework.Build.cs")),
            )
            .unwrap();

        let err = registry
            .register(
                homework(),
                ModuleOrigin::Project,
                Some(Path::new("Source/Other/Homework.Build.cs")),
            )
            .unwrap_err();

        match err {
            ResolveError::DuplicateModule { name, first, second } => {
                assert_eq!(name, "Homework");
                assert!(first.contains("Source/Homework"));
                assert!(second.contains("Source/Other"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_project_module_clashes_with_engine_module() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(ModuleDescriptor::new("Core"), ModuleOrigin::Engine, None)
            .unwrap();
        assert!(matches!(
            registry.register(ModuleDescriptor::new("Core"), ModuleOrigin::Project, None),
            Err(ResolveError::DuplicateModule { .. })
        ));
    }

    #[test]
    fn test_engine_module_replaces_catalog_entry() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(ModuleDescriptor::new("Core"), ModuleOrigin::Catalog, None)
            .unwrap();
        registry
            .register(ModuleDescriptor::new("Engine"), ModuleOrigin::Catalog, None)
            .unwrap();
        registry
            .register(
                ModuleDescriptor::new("Core").with_pch_usage(PchUsage::NoPchs),
                ModuleOrigin::Engine,
                Some(Path::new("Engine/Source/Runtime/Core/Core.Build.cs")),
            )
            .unwrap();

        let core = registry.get("Core").unwrap();
        assert_eq!(core.origin, ModuleOrigin::Engine);
        assert_eq!(core.descriptor.pch_usage, PchUsage::NoPchs);

        let names: Vec<_> = registry.modules().map(RegisteredModule::name).collect();
        assert_eq!(names, vec!["Core", "Engine"]);
    }

    #[test]
    fn test_catalog_entry_does_not_replace_engine_module() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(
                ModuleDescriptor::new("Core").with_pch_usage(PchUsage::NoPchs),
                ModuleOrigin::Engine,
                None,
            )
            .unwrap();
        registry
            .register(ModuleDescriptor::new("Core"), ModuleOrigin::Catalog, None)
            .unwrap();

        assert_eq!(registry.get("Core").unwrap().origin, ModuleOrigin::Engine);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_project_module_clashes_with_catalog_entry() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(ModuleDescriptor::new("UMG"), ModuleOrigin::Catalog, None)
            .unwrap();
        let err = registry
            .register(ModuleDescriptor::new("UMG"), ModuleOrigin::Project, None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "module 'UMG' is declared more than once (catalog module and project module)"
        );
    }

    #[test]
    fn test_later_catalog_overrides_earlier() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(ModuleDescriptor::new("UMG"), ModuleOrigin::Catalog, None)
            .unwrap();
        registry
            .register(
                ModuleDescriptor::new("UMG").with_public_dependencies(["Core"]),
                ModuleOrigin::Catalog,
                None,
            )
            .unwrap();

        assert_eq!(
            registry.resolve_module("UMG").unwrap().dependencies,
            vec!["Core"]
        );
    }
}
