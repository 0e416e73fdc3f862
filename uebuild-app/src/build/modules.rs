//! Module discovery via `.Build.cs` files

use std::path::Path;

use uebuild_core::{ModuleDescriptor, PchUsage};

use super::error::BuildError;
use super::rules::{
    descriptor_name,
    find_rules_files,
    list_additions,
    parse_enum_field,
    read_rules,
    strip_comments,
    warn_on_class_mismatch,
};
use super::types::{DiscoveredModule, RulesKind};

/// Parse the `ModuleRules` class of module `name`
pub fn parse_module_rules(name: &str, content: &str) -> Result<ModuleDescriptor, BuildError> {
    let content = strip_comments(content);
    warn_on_class_mismatch(name, &content, RulesKind::Module);

    let pch_usage: PchUsage = parse_enum_field(&content, name, "PCHUsage", "PCHUsageMode")?;

    Ok(ModuleDescriptor::new(name)
        .with_pch_usage(pch_usage)
        .with_public_dependencies(list_additions(&content, "PublicDependencyModuleNames"))
        .with_private_dependencies(list_additions(&content, "PrivateDependencyModuleNames"))
        .with_circular_dependencies(list_additions(
            &content,
            "CircularlyReferencedDependentModules",
        )))
}

/// Read a single `<Name>.Build.cs` file
pub fn read_module_rules(path: &Path) -> Result<DiscoveredModule, BuildError> {
    let name = descriptor_name(path, RulesKind::Module)
        .ok_or_else(|| BuildError::NotRulesFile(path.to_path_buf()))?;
    let content = read_rules(path)?;

    Ok(DiscoveredModule {
        descriptor: parse_module_rules(&name, &content)?,
        path: path.to_path_buf(),
    })
}

/// Find and parse every `.Build.cs` below `dir`, sorted by path
pub fn find_modules(dir: &Path) -> Result<Vec<DiscoveredModule>, BuildError> {
    let modules = find_rules_files(dir, RulesKind::Module)
        .iter()
        .map(|path| read_module_rules(path))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!("Found {} modules under {}", modules.len(), dir.display());
    Ok(modules)
}
