//! Build target discovery via `.Target.cs` files

use std::cmp::Ordering;
use std::path::Path;

use uebuild_core::{BuildSettingsVersion, TargetDescriptor, TargetType};

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
use super::types::{DiscoveredTarget, RulesKind};

/// Parse the `TargetRules` class of target `name`
pub fn parse_target_rules(name: &str, content: &str) -> Result<TargetDescriptor, BuildError> {
    let content = strip_comments(content);
    warn_on_class_mismatch(name, &content, RulesKind::Target);

    // Look for: Type = TargetType.Editor; and DefaultBuildSettings = BuildSettingsVersion.V2;
    let target_type: TargetType = parse_enum_field(&content, name, "Type", "TargetType")?;
    let build_settings_version: BuildSettingsVersion = parse_enum_field(
        &content,
        name,
        "DefaultBuildSettings",
        "BuildSettingsVersion",
    )?;

    Ok(TargetDescriptor::new(name, target_type)
        .with_build_settings_version(build_settings_version)
        .with_extra_modules(list_additions(&content, "ExtraModuleNames")))
}

/// Read a single `<Name>.Target.cs` file
pub fn read_target_rules(path: &Path) -> Result<DiscoveredTarget, BuildError> {
    let name = descriptor_name(path, RulesKind::Target)
        .ok_or_else(|| BuildError::NotRulesFile(path.to_path_buf()))?;
    let content = read_rules(path)?;

    Ok(DiscoveredTarget {
        descriptor: parse_target_rules(&name, &content)?,
        path: path.to_path_buf(),
    })
}

/// Find build targets by parsing .Target.cs files below `source_dir`
///
/// Editor targets come first, then alphabetically.
pub fn find_build_targets(source_dir: &Path) -> Result<Vec<DiscoveredTarget>, BuildError> {
    let mut targets = find_rules_files(source_dir, RulesKind::Target)
        .iter()
        .map(|path| read_target_rules(path))
        .collect::<Result<Vec<_>, _>>()?;

    sort_targets(&mut targets);
    Ok(targets)
}

fn sort_targets(targets: &mut [DiscoveredTarget]) {
    targets.sort_by(|a, b| {
        let a_is_editor = a.descriptor.target_type == TargetType::Editor;
        let b_is_editor = b.descriptor.target_type == TargetType::Editor;
        match (a_is_editor, b_is_editor) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => a.name().cmp(b.name()),
        }
    });
}
