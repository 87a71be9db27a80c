use thiserror::Error;

use crate::types::GroupId;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("repeat bounds are inconsistent: min {min} exceeds max {max}")]
    InvalidRepeatBounds { min: usize, max: usize },
    #[error("backreference to group {group} is invalid (pattern has groups 1..{total_groups})")]
    InvalidBackReference {
        group: GroupId,
        total_groups: usize,
    },
    #[error("{kind} expression needs at least one alternative")]
    EmptyAlternation { kind: &'static str },
}

pub type PatternResult<T> = Result<T, PatternError>;
