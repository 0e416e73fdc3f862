//! Target assembly: the ordered transitive closure of a target's modules

use std::collections::VecDeque;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::descriptor::{BuildSettingsVersion, TargetDescriptor, TargetType};
use crate::error::ResolveError;
use crate::registry::{ModuleRegistry, ResolvedModule};

/// Modules to compile for one target, dependencies before dependents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledTarget {
    pub name: String,
    pub target_type: TargetType,
    pub build_settings_version: BuildSettingsVersion,
    pub modules: Vec<ResolvedModule>,
}

impl AssembledTarget {
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|module| module.name.as_str())
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.modules.iter().position(|module| module.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleRegistry {
    /// Resolve every module reachable from `target.extra_modules`.
    ///
    /// Modules are visited depth-first in declaration order and emitted in
    /// post-order, so the result is a topological order that is identical for
    /// identical inputs. A dependency the dependent lists as circular is part of
    /// the closure but is not ordered before it, and never counts as a cycle.
    pub fn assemble_target(
        &self,
        target: &TargetDescriptor,
    ) -> Result<AssembledTarget, ResolveError> {
        let mut assembler = Assembler::new(self);

        for name in &target.extra_modules {
            assembler.visit(name, &target.name)?;
            assembler.visit_deferred()?;
        }

        let modules: Vec<_> = assembler.done.into_values().collect();
        tracing::debug!(
            "Assembled target {} ({}) with {} modules",
            target.name,
            target.target_type,
            modules.len()
        );

        Ok(AssembledTarget {
            name: target.name.clone(),
            target_type: target.target_type,
            build_settings_version: target.build_settings_version,
            modules,
        })
    }
}

/// Free-function form of [`ModuleRegistry::assemble_target`]
pub fn assemble_target(
    registry: &ModuleRegistry,
    target: &TargetDescriptor,
) -> Result<AssembledTarget, ResolveError> {
    registry.assemble_target(target)
}

struct Assembler<'a> {
    registry: &'a ModuleRegistry,
    /// Modules on the current resolution path, outermost first
    visiting: IndexSet<String>,
    done: IndexMap<String, ResolvedModule>,
    /// Circular edges as (dependency, dependent), visited once the path unwinds
    deferred: VecDeque<(String, String)>,
}

impl<'a> Assembler<'a> {
    fn new(registry: &'a ModuleRegistry) -> Self {
        Self {
            registry,
            visiting: IndexSet::new(),
            done: IndexMap::new(),
            deferred: VecDeque::new(),
        }
    }

    fn visit(&mut self, name: &str, referenced_by: &str) -> Result<(), ResolveError> {
        if self.done.contains_key(name) {
            return Ok(());
        }

        if let Some(start) = self.visiting.get_index_of(name) {
            let mut cycle: Vec<String> = self.visiting.iter().skip(start).cloned().collect();
            cycle.push(name.to_string());
            return Err(ResolveError::CyclicDependency { cycle });
        }

        let resolved = self
            .registry
            .resolve_module(name)
            .map_err(|err| match err {
                ResolveError::UnknownModule { name, .. } => ResolveError::UnknownModule {
                    name,
                    referenced_by: Some(referenced_by.to_string()),
                },
                other => other,
            })?;

        self.visiting.insert(name.to_string());
        for dependency in &resolved.dependencies {
            if resolved.circular_dependencies.contains(dependency) {
                self.deferred.push_back((dependency.clone(), name.to_string()));
                continue;
            }
            self.visit(dependency, name)?;
        }
        self.visiting.pop();

        tracing::trace!("Resolved {} ({} dependencies)", name, resolved.dependencies.len());
        self.done.insert(name.to_string(), resolved);
        Ok(())
    }

    fn visit_deferred(&mut self) -> Result<(), ResolveError> {
        while let Some((dependency, dependent)) = self.deferred.pop_front() {
            tracing::trace!("Visiting circular dependency {} of {}", dependency, dependent);
            self.visit(&dependency, &dependent)?;
        }
        Ok(())
    }
}
