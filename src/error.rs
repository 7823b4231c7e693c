//! Relation error types.

use thiserror::Error;

/// Errors raised while wiring relations from declarative input.
///
/// Authoring data is assumed well-formed, so these surface at construction
/// time and nothing is wired when one is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelationError {
    #[error("unknown side pair: {token}")]
    UnknownSidePair { token: String },

    #[error("node {owner} has no relation target named {target:?}")]
    UnresolvedTarget { owner: usize, target: String },

    #[error("malformed relation entry: {line}")]
    MalformedEntry { line: String },
}

pub type Result<T> = std::result::Result<T, RelationError>;
