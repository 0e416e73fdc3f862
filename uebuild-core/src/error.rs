use thiserror::Error;

/// Fatal resolution failures. Any of these aborts the current invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("{}", unknown_module_message(.name, .referenced_by.as_deref()))]
    UnknownModule {
        name: String,
        /// Module or target whose declaration named `name`
        referenced_by: Option<String>,
    },

    #[error("cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency {
        /// Path from the first revisited module back to itself
        cycle: Vec<String>,
    },

    #[error("module '{name}' is declared more than once ({first} and {second})")]
    DuplicateModule {
        name: String,
        first: String,
        second: String,
    },
}

fn unknown_module_message(name: &str, referenced_by: Option<&str>) -> String {
    match referenced_by {
        Some(parent) => format!("unknown module '{name}' (referenced by '{parent}')"),
        None => format!("unknown module '{name}'"),
    }
}

impl ResolveError {
    pub fn unknown(name: impl Into<String>) -> Self {
        ResolveError::UnknownModule {
            name: name.into(),
            referenced_by: None,
        }
    }

    pub fn is_unknown_module(&self) -> bool {
        matches!(self, ResolveError::UnknownModule { .. })
    }

    pub fn is_cyclic_dependency(&self) -> bool {
        matches!(self, ResolveError::CyclicDependency { .. })
    }
}
