//! Errors raised while reading rules files and assembling a project

use std::path::PathBuf;

use thiserror::Error;
use uebuild_core::ResolveError;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a rules file", .0.display())]
    NotRulesFile(PathBuf),

    #[error("{descriptor}: unknown {field} token '{token}'")]
    UnknownToken {
        descriptor: String,
        field: &'static str,
        token: String,
    },

    #[error("invalid engine catalog {origin}: {source}")]
    Catalog {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid project file {}: {source}", .path.display())]
    ProjectFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no Source directory in {}", .0.display())]
    MissingSource(PathBuf),

    #[error("target '{name}' is declared more than once ({} and {})", .first.display(), .second.display())]
    DuplicateTarget {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("unknown target '{0}'")]
    UnknownTarget(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}
