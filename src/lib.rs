//! Regular expressions over sequences of arbitrary typed elements.
//!
//! Build a [`PatternExpr`] out of node patterns, compile it into a
//! [`SequencePattern`], then search element slices with a
//! [`SequenceMatcher`].

pub mod enums;
pub mod errors;
pub mod matcher;
pub mod node;
pub mod pattern;
pub mod types;

pub use enums::FindType;
pub use errors::{SeqexError, SeqexResult};
pub use matcher::{
    BasicSequenceMatchResult, MatchError, MatchReplacement, MatchedGroup, MatcherOptions,
    SequenceMatchResult, SequenceMatcher,
};
pub use node::{MultiNodePattern, NodePattern};
pub use pattern::{PatternExpr, SequencePattern};
