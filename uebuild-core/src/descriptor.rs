//! Module and target descriptor types

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Precompiled header policy of a module (`PCHUsageMode`)
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
pub enum PchUsage {
    #[default]
    Default,
    #[strum(serialize = "NoPCHs")]
    #[serde(rename = "NoPCHs")]
    NoPchs,
    #[strum(serialize = "NoSharedPCHs")]
    #[serde(rename = "NoSharedPCHs")]
    NoSharedPchs,
    #[strum(serialize = "UseSharedPCHs")]
    #[serde(rename = "UseSharedPCHs")]
    UseSharedPchs,
    #[strum(serialize = "UseExplicitOrSharedPCHs")]
    #[serde(rename = "UseExplicitOrSharedPCHs")]
    UseExplicitOrSharedPchs,
}

/// Kind of binary a target produces (`TargetType`)
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
pub enum TargetType {
    #[default]
    Game,
    Editor,
    Client,
    Server,
    Program,
}

/// Build settings schema version pinned by a target (`BuildSettingsVersion`)
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
pub enum BuildSettingsVersion {
    #[default]
    V1,
    V2,
    V3,
    V4,
    V5,
    Latest,
}

/// A module rules definition, keyed by `name`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub name: String,
    #[serde(default)]
    pub pch_usage: PchUsage,
    #[serde(default)]
    pub public_dependencies: Vec<String>,
    #[serde(default)]
    pub private_dependencies: Vec<String>,
    /// Dependencies allowed to depend back on this module
    /// (`CircularlyReferencedDependentModules`)
    #[serde(default)]
    pub circular_dependencies: Vec<String>,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_pch_usage(mut self, pch_usage: PchUsage) -> Self {
        self.pch_usage = pch_usage;
        self
    }

    pub fn with_public_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_dependencies
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_private_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.private_dependencies
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_circular_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.circular_dependencies
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn is_circular_dependency(&self, name: &str) -> bool {
        self.circular_dependencies.iter().any(|circular| circular == name)
    }

    /// Public then private dependencies, in declaration order
    pub fn all_dependencies(&self) -> impl Iterator<Item = &str> {
        self.public_dependencies
            .iter()
            .chain(self.private_dependencies.iter())
            .map(String::as_str)
    }
}

/// A target rules definition
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TargetDescriptor {
    pub name: String,
    #[serde(default)]
    pub target_type: TargetType,
    #[serde(default)]
    pub build_settings_version: BuildSettingsVersion,
    #[serde(default)]
    pub extra_modules: Vec<String>,
}

impl TargetDescriptor {
    pub fn new(name: impl Into<String>, target_type: TargetType) -> Self {
        Self {
            name: name.into(),
            target_type,
            ..Default::default()
        }
    }

    pub fn with_build_settings_version(mut self, version: BuildSettingsVersion) -> Self {
        self.build_settings_version = version;
        self
    }

    pub fn with_extra_modules<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_modules.extend(names.into_iter().map(Into::into));
        self
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_pch_usage_tokens() {
        assert_eq!(
            PchUsage::from_str("UseExplicitOrSharedPCHs").unwrap(),
            PchUsage::UseExplicitOrSharedPchs
        );
        assert_eq!(PchUsage::from_str("NoPCHs").unwrap(), PchUsage::NoPchs);
        assert_eq!(PchUsage::UseSharedPchs.to_string(), "UseSharedPCHs");
        assert!(PchUsage::from_str("UseSomePCHs").is_err());
    }

    #[test]
    fn test_every_token_parses_back() {
        for usage in PchUsage::iter() {
            assert_eq!(PchUsage::from_str(usage.as_ref()).unwrap(), usage);
        }
        for target_type in TargetType::iter() {
            assert_eq!(TargetType::from_str(target_type.as_ref()).unwrap(), target_type);
        }
        for version in BuildSettingsVersion::iter() {
            assert_eq!(
                BuildSettingsVersion::from_str(version.as_ref()).unwrap(),
                version
            );
        }
    }

    #[test]
    fn test_all_dependencies_order() {
        let module = ModuleDescriptor::new("Homework")
            .with_public_dependencies(["Core", "Engine"])
            .with_private_dependencies(["Slate"]);
        let deps: Vec<_> = module.all_dependencies().collect();
        assert_eq!(deps, vec!["Core", "Engine", "Slate"]);
    }

    #[test]
    fn test_circular_dependencies() {
        let engine = ModuleDescriptor::new("Engine")
            .with_public_dependencies(["Core"])
            .with_private_dependencies(["UMG"])
            .with_circular_dependencies(["UMG"]);
        assert!(engine.is_circular_dependency("UMG"));
        assert!(!engine.is_circular_dependency("Core"));
        assert!(!engine.is_circular_dependency("umg"));
    }
}
