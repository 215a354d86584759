//! Error types shared across the crate.
//!
//! Library code returns these typed errors; the binary wraps them in
//! `anyhow` with additional context.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Failure to read a project's `tsconfig.json` or enumerate its sources
#[derive(Debug, Error)]
pub enum ProjectConfigError {
    #[error("no tsconfig.json found at {0}")]
    Missing(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid project configuration in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid glob pattern {pattern:?}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Errors raised while building the element index
#[derive(Debug, Error)]
pub enum IndexError {
    /// A root's project configuration could not be loaded
    #[error("failed to load project {root}")]
    ProjectLoad {
        root: PathBuf,
        #[source]
        source: ProjectConfigError,
    },
    /// Every configured root failed, nothing could be indexed
    #[error("no project could be indexed")]
    NoProjects,
    /// The source parser could not process a file
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Errors talking to the AI ranking collaborator
#[derive(Debug, Error)]
pub enum RerankError {
    #[error("request to ranking service failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("ranking service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode ranking response: {0}")]
    Decode(String),
    #[error("ranking service returned no choices")]
    EmptyResponse,
    #[error("environment variable {0} is not set")]
    MissingApiKey(String),
    /// One request's failure, handed to every caller that waited on it
    #[error(transparent)]
    Shared(Arc<RerankError>),
}

impl RerankError {
    /// The underlying failure, looking through [`RerankError::Shared`]
    pub fn root_cause(&self) -> &RerankError {
        match self {
            RerankError::Shared(inner) => inner.root_cause(),
            other => other,
        }
    }
}
