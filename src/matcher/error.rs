use thiserror::Error;

use crate::types::GroupId;

use super::options::MatcherOptionsError;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("region [{start}, {end}) is outside the element range [0, {len}]")]
    InvalidRegion { start: usize, end: usize, len: usize },
    #[error("index {index} is outside the range [{start}, {end}]")]
    IndexOutOfBounds {
        index: usize,
        start: usize,
        end: usize,
    },
    #[error("group {group} does not exist; the pattern has {group_count} groups")]
    GroupOutOfRange { group: GroupId, group_count: usize },
    #[error("no group is bound to variable '{name}'")]
    UnknownGroupName { name: String },
    #[error("no match available: {operation} requires a successful find or matches")]
    NoMatch { operation: &'static str },
    #[error("node match results were not recorded; enable match_with_result before searching")]
    ResultsNotRecorded,
    #[error(transparent)]
    Options(#[from] MatcherOptionsError),
}

pub type MatcherResult<T> = Result<T, MatchError>;
