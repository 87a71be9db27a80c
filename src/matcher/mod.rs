mod branch;
mod error;
mod frontier;
mod options;
mod replace;
mod result;
mod sequence_matcher;
mod transition;

pub use error::{MatchError, MatcherResult};
pub use options::{DEFAULT_BRANCH_LIMIT, MatcherOptions, MatcherOptionsBuilder, MatcherOptionsError};
pub use replace::MatchReplacement;
pub use result::{BasicSequenceMatchResult, MatchedGroup, SequenceMatchResult};
pub use sequence_matcher::{FindIter, SequenceMatcher};
