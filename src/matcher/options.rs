use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enums::FindType;

pub const DEFAULT_BRANCH_LIMIT: usize = 2;

/// Search options of a [`SequenceMatcher`](super::SequenceMatcher).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherOptions {
    pub find_type: FindType,
    /// Live branches allowed per step before the frontier is split and the
    /// overflow deferred to backtracking.
    pub branch_limit: usize,
    /// Record sub-results reported by node patterns.
    pub match_with_result: bool,
    /// Report zero-length matches from `find`.
    pub include_empty_matches: bool,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            find_type: FindType::default(),
            branch_limit: DEFAULT_BRANCH_LIMIT,
            match_with_result: false,
            include_empty_matches: false,
        }
    }
}

impl MatcherOptions {
    pub fn builder() -> MatcherOptionsBuilder {
        MatcherOptionsBuilder::default()
    }

    pub fn validate(&self) -> Result<(), MatcherOptionsError> {
        if self.branch_limit == 0 {
            return Err(MatcherOptionsError::BranchLimitInvalid { provided: 0 });
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MatcherOptionsBuilder {
    options: MatcherOptions,
}

impl MatcherOptionsBuilder {
    pub fn find_type(mut self, value: FindType) -> Self {
        self.options.find_type = value;
        self
    }

    pub fn branch_limit(mut self, value: usize) -> Self {
        self.options.branch_limit = value;
        self
    }

    pub fn match_with_result(mut self, value: bool) -> Self {
        self.options.match_with_result = value;
        self
    }

    pub fn include_empty_matches(mut self, value: bool) -> Self {
        self.options.include_empty_matches = value;
        self
    }

    pub fn build(self) -> Result<MatcherOptions, MatcherOptionsError> {
        self.options.validate()?;
        Ok(self.options)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatcherOptionsError {
    #[error("branch_limit must be at least 1 (got {provided})")]
    BranchLimitInvalid { provided: usize },
}
