//! Unreal build rules of a project
//!
//! Reads the declarative build inputs of an Unreal Engine project:
//! - Module rules (`<Name>.Build.cs`) and target rules (`<Name>.Target.cs`)
//! - Engine discovery and engine module catalogs
//! - Project loading into a module registry with its targets

mod engine;
mod error;
mod modules;
mod project;
mod rules;
mod targets;
mod types;

pub use engine::{
    builtin_catalog,
    engine_source_dir,
    get_engine_version,
    locate_engine,
    parse_catalog,
    read_catalog,
};

pub use error::BuildError;

pub use modules::{find_modules, parse_module_rules, read_module_rules};

pub use project::{Project, find_uproject_file, project_root};

pub use targets::{find_build_targets, parse_target_rules, read_target_rules};

pub use types::{
    DiscoveredModule,
    DiscoveredTarget,
    EngineInstall,
    RulesKind,
    TargetCheck,
};
