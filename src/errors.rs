use crate::matcher::MatchError;
use crate::node::NodeError;
use crate::pattern::PatternError;
use thiserror::Error;

/// Any error the crate reports.
#[derive(Debug, Error)]
pub enum SeqexError {
    #[error(transparent)]
    Node(#[from] NodeError),
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error(transparent)]
    Match(#[from] MatchError),
}

pub type SeqexResult<T> = Result<T, SeqexError>;
