//! Module and target descriptors for Unreal Engine projects, the registry they
//! are looked up in, and assembly of a target's module closure.
//!
//! - [`descriptor`]: `ModuleRules` / `TargetRules` data and their enums
//! - [`registry`]: string-keyed module registry and single-module resolution
//! - [`assemble`]: dependency-ordered closure of a target

pub mod assemble;
pub mod descriptor;
pub mod error;
pub mod registry;

pub use assemble::{AssembledTarget, assemble_target};
pub use descriptor::{
    BuildSettingsVersion,
    ModuleDescriptor,
    PchUsage,
    TargetDescriptor,
    TargetType,
};
pub use error::ResolveError;
pub use registry::{ModuleOrigin, ModuleRegistry, RegisteredModule, ResolvedModule};
