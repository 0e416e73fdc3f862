//! Build system types

use std::path::PathBuf;

use serde::Serialize;
use uebuild_core::{ModuleDescriptor, TargetDescriptor};

/// Which kind of rules file a path holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulesKind {
    /// `<Name>.Build.cs`, a `ModuleRules` subclass
    Module,
    /// `<Name>.Target.cs`, a `TargetRules` subclass
    Target,
}

impl RulesKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            RulesKind::Module => ".Build.cs",
            RulesKind::Target => ".Target.cs",
        }
    }

    pub fn base_class(&self) -> &'static str {
        match self {
            RulesKind::Module => "ModuleRules",
            RulesKind::Target => "TargetRules",
        }
    }

    /// Class name the orchestrator expects for a descriptor called `name`
    pub fn expected_class_name(&self, name: &str) -> String {
        match self {
            RulesKind::Module => name.to_string(),
            RulesKind::Target => format!("{name}Target"),
        }
    }
}

/// Module rules read from disk
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredModule {
    pub descriptor: ModuleDescriptor,
    pub path: PathBuf,
}

/// Target rules read from disk
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredTarget {
    pub descriptor: TargetDescriptor,
    pub path: PathBuf,
}

impl DiscoveredTarget {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// An engine installation located for the project
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineInstall {
    /// Full path to engine root directory
    pub root: PathBuf,
    /// Engine version (e.g., "5.4.0"), when Build.version is readable
    pub version: Option<String>,
}

/// Outcome of assembling one target during `check`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetCheck {
    pub target: String,
    pub module_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TargetCheck {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
