use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("invalid element regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("node sequence set must contain at least one non-empty sequence")]
    EmptySequenceSet,
}

pub type NodeResult<T> = Result<T, NodeError>;
