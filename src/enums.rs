use serde::{Deserialize, Serialize};

/// How successive calls to `find` walk the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FindType {
    /// Resume after the end of the previous match; matches never overlap.
    #[default]
    FindNonOverlapping,
    /// Surface every accepted interpretation at a start position before
    /// moving on to the next start position.
    FindAll,
}
